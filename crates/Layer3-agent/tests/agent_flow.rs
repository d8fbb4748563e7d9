//! End-to-end agent flow tests with a scripted model service

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use moon_agent::{
    Agent, AgentSpec, AgentType, ConversationLoop, TaskManager, TaskManagerConfig, TaskState,
};
use moon_foundation::{Tool, ToolCall, ToolContext, ToolResult, ToolSchema};
use moon_provider::{
    ChatRequest, ChatResponse, FinishReason, ModelService, ProviderError, TokenUsage,
};
use moon_tool::ToolRegistry;

// ============================================================================
// Test doubles
// ============================================================================

/// Model service that replays a fixed script of responses
struct ScriptedService {
    responses: Mutex<VecDeque<ChatResponse>>,
    /// Message count of each request, in call order
    request_sizes: Mutex<Vec<usize>>,
}

impl ScriptedService {
    fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            request_sizes: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.request_sizes.lock().unwrap().len()
    }

    fn request_sizes(&self) -> Vec<usize> {
        self.request_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelService for ScriptedService {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.request_sizes.lock().unwrap().push(request.messages.len());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::ServerError("script exhausted".to_string()))
    }
}

/// Model service that answers after a fixed delay
struct SlowService {
    delay: Duration,
}

#[async_trait]
impl ModelService for SlowService {
    fn model(&self) -> &str {
        "slow-model"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(text_response("done"))
    }
}

/// Tool that records the order it was invoked in
struct RecorderTool {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Tool for RecorderTool {
    fn name(&self) -> &str {
        "record"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("record", "Record a tag").with_string_param("tag", "Tag to record", true)
    }

    async fn execute(
        &self,
        args: Value,
        _ctx: &ToolContext,
    ) -> moon_foundation::Result<ToolResult> {
        let tag = args["tag"].as_str().unwrap_or("?").to_string();
        self.log.lock().unwrap().push(tag.clone());
        Ok(ToolResult::ok(json!({"recorded": tag})))
    }
}

fn text_response(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_string(),
        tool_calls: vec![],
        usage: TokenUsage::default(),
        finish_reason: FinishReason::Stop,
        model: "scripted-model".to_string(),
    }
}

fn tool_response(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        tool_calls: calls,
        usage: TokenUsage::default(),
        finish_reason: FinishReason::ToolUse,
        model: "scripted-model".to_string(),
    }
}

// ============================================================================
// Conversation loop
// ============================================================================

#[tokio::test]
async fn direct_response_terminates_first_round() {
    let service = ScriptedService::new(vec![text_response("the answer is 4")]);
    let registry = Arc::new(ToolRegistry::new());

    let outcome = ConversationLoop::new(
        service.clone(),
        registry,
        ToolContext::default(),
        0.6,
    )
    .run("You are helpful.", "what is 2 + 2?")
    .await
    .unwrap();

    assert_eq!(outcome.final_text, "the answer is 4");
    assert_eq!(outcome.rounds_used, 0);
    assert_eq!(outcome.tool_call_count(), 0);
    assert!(!outcome.budget_exhausted);
    assert_eq!(outcome.execution_kind(), "direct_response");
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn tool_calls_run_in_order_and_grow_the_transcript() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(RecorderTool { log: log.clone() }))
        .unwrap();

    let service = ScriptedService::new(vec![
        tool_response(vec![
            ToolCall::new("call_a", "record", json!({"tag": "first"})),
            ToolCall::new("call_b", "record", json!({"tag": "second"})),
        ]),
        text_response("both recorded"),
    ]);

    let outcome = ConversationLoop::new(
        service.clone(),
        Arc::new(registry),
        ToolContext::default(),
        0.6,
    )
    .run("system", "record two tags")
    .await
    .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(outcome.final_text, "both recorded");
    assert_eq!(outcome.rounds_used, 1);
    assert_eq!(outcome.tool_call_count(), 2);
    assert_eq!(outcome.execution_kind(), "multi_turn");
    assert!(outcome.tool_results.iter().all(|r| r.success));

    // Round 1: system + user. Round 2 adds one assistant message and one
    // tool message per call.
    assert_eq!(service.request_sizes(), vec![2, 6]);
}

#[tokio::test]
async fn round_budget_exhaustion_is_a_soft_stop() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(RecorderTool { log: log.clone() }))
        .unwrap();

    let service = ScriptedService::new(vec![
        tool_response(vec![ToolCall::new("c1", "record", json!({"tag": "r1"}))]),
        tool_response(vec![ToolCall::new("c2", "record", json!({"tag": "r2"}))]),
    ]);

    let outcome = ConversationLoop::new(
        service.clone(),
        Arc::new(registry),
        ToolContext::default(),
        0.6,
    )
    .with_max_rounds(2)
    .run("system", "keep going")
    .await
    .unwrap();

    assert!(outcome.budget_exhausted);
    assert_eq!(outcome.final_text, "Maximum iterations reached");
    assert_eq!(outcome.rounds_used, 2);
    assert_eq!(outcome.tool_call_count(), 2);
    assert_eq!(outcome.execution_kind(), "multi_turn_max_iter");
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn provider_failure_aborts_the_run() {
    // Empty script: the first completion fails
    let service = ScriptedService::new(vec![]);
    let registry = Arc::new(ToolRegistry::new());

    let err = ConversationLoop::new(service, registry, ToolContext::default(), 0.6)
        .run("system", "hello")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("script exhausted"));
}

// ============================================================================
// Agents
// ============================================================================

#[tokio::test]
async fn plan_agent_makes_exactly_one_completion() {
    let service = ScriptedService::new(vec![text_response("1. Read\n2. Write\n3. Review")]);

    let agent = Agent::new(
        AgentType::Plan,
        AgentSpec::new("plan a refactor"),
        service.clone(),
        Arc::new(ToolRegistry::with_builtins()),
        ToolContext::default(),
    );

    let result = agent.execute("plan the refactor of parser.rs").await;

    assert!(result.success);
    assert_eq!(service.calls(), 1);
    // Tools are never offered to the plan agent
    assert_eq!(service.request_sizes(), vec![2]);

    let data = result.data.unwrap();
    assert_eq!(data["agent_type"], "plan-agent");
    assert!(data["plan"].as_str().unwrap().contains("1. Read"));

    let meta = result.metadata.unwrap();
    assert_eq!(meta["agent"], json!("PlanAgent"));
    assert_eq!(meta["output_type"], json!("plan"));
}

#[tokio::test]
async fn agent_reports_provider_failure_as_failed_result() {
    let service = ScriptedService::new(vec![]);

    let agent = Agent::new(
        AgentType::GeneralPurpose,
        AgentSpec::new("doomed task"),
        service,
        Arc::new(ToolRegistry::new()),
        ToolContext::default(),
    );

    let result = agent.execute("do something").await;

    assert!(!result.success);
    assert!(result
        .error
        .unwrap()
        .contains("GeneralPurposeAgent execution failed"));
}

#[tokio::test]
async fn explore_agent_carries_exploration_metadata() {
    let service = ScriptedService::new(vec![text_response("the codebase has three layers")]);

    let agent = Agent::new(
        AgentType::Explore,
        AgentSpec::new("explore the repo"),
        service,
        Arc::new(ToolRegistry::with_builtins()),
        ToolContext::default(),
    );

    let result = agent.execute("describe the architecture").await;

    assert!(result.success);
    let meta = result.metadata.unwrap();
    assert_eq!(meta["agent"], json!("ExploreAgent"));
    assert_eq!(meta["exploration_type"], json!("codebase_analysis"));
    assert_eq!(meta["execution_type"], json!("direct_response"));
}

// ============================================================================
// Task manager
// ============================================================================

fn slow_manager(delay: Duration) -> TaskManager {
    TaskManager::new(
        Arc::new(SlowService { delay }),
        Arc::new(ToolRegistry::new()),
        ToolContext::default(),
        TaskManagerConfig::default(),
    )
}

#[tokio::test]
async fn tasks_run_concurrently_not_serially() {
    let manager = slow_manager(Duration::from_millis(150));

    for i in 0..3 {
        manager
            .create("plan-agent", format!("task {i}"), "plan")
            .await
            .unwrap();
    }

    let start = Instant::now();
    let snapshots = manager.wait_all(None).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(snapshots.len(), 3);
    assert!(snapshots.iter().all(|s| s.state == TaskState::Completed));
    // Three 150ms tasks on a wide pool finish together, not one by one
    assert!(elapsed < Duration::from_millis(400), "took {elapsed:?}");
}

#[tokio::test]
async fn wait_all_shares_one_deadline() {
    let manager = slow_manager(Duration::from_millis(300));

    for i in 0..3 {
        manager
            .create("plan-agent", format!("task {i}"), "plan")
            .await
            .unwrap();
    }

    let start = Instant::now();
    let snapshots = manager
        .wait_all(Some(Duration::from_millis(50)))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    // One 50ms budget for everything, not 50ms per task
    assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");
    assert!(snapshots.iter().all(|s| !s.state.is_terminal()));

    // Nothing was cancelled
    let snapshots = manager.wait_all(None).await.unwrap();
    assert!(snapshots.iter().all(|s| s.state == TaskState::Completed));
}

#[tokio::test]
async fn shell_task_end_to_end() {
    let service = ScriptedService::new(vec![
        tool_response(vec![ToolCall::new(
            "call_1",
            "run_shell_command",
            json!({"command": "echo hi", "description": "print hi"}),
        )]),
        text_response("The command printed hi"),
    ]);

    let manager = TaskManager::new(
        service,
        Arc::new(ToolRegistry::with_builtins()),
        ToolContext::default(),
        TaskManagerConfig::default(),
    );

    let id = manager
        .create("general-purpose", "run a command", "run echo hi")
        .await
        .unwrap();

    let snapshot = manager.wait(id, None).await.unwrap();
    assert_eq!(snapshot.state, TaskState::Completed);

    let result = snapshot.result.unwrap();
    assert!(result.success);

    let data = result.data.unwrap();
    let llm_result = &data["llm_result"];
    assert_eq!(llm_result["llm_response"], "The command printed hi");
    assert_eq!(llm_result["iterations"], 1);

    let stdout = llm_result["tool_results"][0]["data"]["stdout"]
        .as_str()
        .unwrap();
    assert!(stdout.contains("hi"));

    let meta = result.metadata.unwrap();
    assert_eq!(meta["execution_type"], json!("multi_turn"));
    assert_eq!(meta["total_tool_calls"], json!(1));
}
