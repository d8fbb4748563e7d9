//! Interactive REPL
//!
//! Reads natural-language instructions from stdin and drives the
//! tool-calling conversation loop. A few special verbs (help, history,
//! clear, tasks, exit) are handled locally without calling the model.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use moon_agent::{ConversationLoop, LoopOutcome, TaskManager};
use moon_foundation::{ToolContext, ToolResult};
use moon_provider::ModelService;
use moon_tool::ToolRegistry;

/// Temperature for the assistant conversation
const REPL_TEMPERATURE: f32 = 0.3;

/// Most recent inputs kept for the history verb
const HISTORY_LIMIT: usize = 50;

/// Interactive session state
pub struct Repl {
    service: Arc<dyn ModelService>,
    registry: Arc<ToolRegistry>,
    manager: Arc<TaskManager>,
    ctx: ToolContext,
    history: Vec<String>,
}

impl Repl {
    pub fn new(
        service: Arc<dyn ModelService>,
        registry: Arc<ToolRegistry>,
        manager: Arc<TaskManager>,
        ctx: ToolContext,
    ) -> Self {
        Self {
            service,
            registry,
            manager,
            ctx,
            history: Vec::new(),
        }
    }

    /// Main interactive loop
    pub async fn run(&mut self) -> anyhow::Result<()> {
        print_banner();

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            print!("\n> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            self.remember(input);

            match input.to_lowercase().as_str() {
                "exit" | "quit" | "q" => {
                    println!("\nGoodbye!");
                    break;
                }
                "help" => {
                    print_help();
                    continue;
                }
                "clear" => {
                    // ANSI clear screen + cursor home
                    print!("\x1b[2J\x1b[H");
                    print_banner();
                    continue;
                }
                "history" => {
                    self.show_history();
                    continue;
                }
                "tasks" => {
                    self.show_tasks().await;
                    continue;
                }
                _ => {}
            }

            // Shell escape: run the command directly, no model round-trip
            if let Some(command) = input.strip_prefix('!') {
                self.run_shell(command.trim()).await;
                continue;
            }

            self.run_once(input).await;
        }

        Ok(())
    }

    /// Process one instruction and print the result
    pub async fn run_once(&self, input: &str) {
        println!("\nWorking on it...");

        let conversation = ConversationLoop::new(
            Arc::clone(&self.service),
            Arc::clone(&self.registry),
            self.ctx.clone(),
            REPL_TEMPERATURE,
        );

        let system_prompt = self.system_prompt();

        match conversation.run(&system_prompt, input).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => eprintln!("\nRequest failed: {}", e),
        }
    }

    /// Execute a shell command through the registry, bypassing the model
    async fn run_shell(&self, command: &str) {
        if command.is_empty() {
            println!("\nUsage: !<command>");
            return;
        }

        let args = serde_json::json!({
            "command": command,
            "description": format!("Execute: {}", command),
        });
        let result = self
            .registry
            .dispatch(moon_tool::ShellTool::NAME, args, &self.ctx)
            .await;
        print_tool_result(1, &result);
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an assistant for the command line. You can call tools to \
             carry out the user's instructions.\n\n\
             Available tools:\n\
             1. run_shell_command - execute shell commands (create directories, \
             list files, run programs)\n\
             2. file_tool - file operations (action: read, write, search, list)\n\
             3. search_tool - search for a regex pattern across files\n\
             4. task - launch a background agent for complex work \
             (subagent_type: general-purpose, plan-agent, explore-agent)\n\n\
             Guidelines:\n\
             - Pick the right tool for the request\n\
             - If several steps are needed, run them in order\n\
             - For complex multi-step work, delegate to the task tool\n\n\
             Current working directory: {}",
            self.ctx.working_dir.display()
        )
    }

    fn remember(&mut self, input: &str) {
        self.history.push(input.to_string());
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        debug!(entries = self.history.len(), "history updated");
    }

    fn show_history(&self) {
        if self.history.is_empty() {
            println!("\nNo history yet.");
            return;
        }

        println!("\n{}", "=".repeat(70));
        println!(" History");
        println!("{}", "=".repeat(70));
        for (i, entry) in self.history.iter().enumerate() {
            println!("{:3}. {}", i + 1, entry);
        }
        println!("{}", "=".repeat(70));
    }

    async fn show_tasks(&self) {
        let snapshots = self.manager.all().await;
        if snapshots.is_empty() {
            println!("\nNo background tasks.");
            return;
        }

        println!("\n{:<10} {:<16} {:<10} DESCRIPTION", "ID", "AGENT", "STATE");
        println!("{}", "-".repeat(70));
        for snapshot in snapshots {
            println!(
                "{:<10} {:<16} {:<10} {}",
                snapshot.id.short(),
                snapshot.agent_type.as_str(),
                snapshot.state.as_str(),
                snapshot.description
            );
        }
    }
}

fn print_banner() {
    println!("\n{}", "=".repeat(70));
    println!(" MoonAgent - agent assistant for the terminal");
    println!("{}", "=".repeat(70));
    println!("\nType an instruction in plain language; tools are called for you.");
    println!("Tools: shell | file | search | task");
    println!("Type 'help' for examples, 'exit' to quit.");
    println!("{}", "=".repeat(70));
}

fn print_help() {
    println!("\n{}", "=".repeat(70));
    println!(" Help");
    println!("{}", "=".repeat(70));
    println!(
        "
Examples:

1. File operations:
   > create a file named test.py containing print('hello')
   > read the first 10 lines of README.md
   > list the files in the current directory

2. Shell commands:
   > make a directory called my_project
   > show the current path

3. Code search:
   > find every file that mentions TODO
   > search for the pattern 'fn main' in Rust files

4. Background agents:
   > use plan-agent to design a user authentication system
   > use explore-agent to analyze this codebase

Special verbs:
   !<cmd>  - run a shell command directly
   help    - show this help
   clear   - clear the screen
   history - show recent inputs
   tasks   - show background tasks
   exit    - quit"
    );
    println!("{}", "=".repeat(70));
}

fn print_outcome(outcome: &LoopOutcome) {
    if outcome.tool_call_count() > 0 {
        println!("\nRan {} tool call(s)", outcome.tool_call_count());
        for (i, result) in outcome.tool_results.iter().enumerate() {
            print_tool_result(i + 1, result);
        }
    }

    if !outcome.final_text.is_empty() {
        println!("\n{}", outcome.final_text);
    }
}

fn print_tool_result(index: usize, result: &ToolResult) {
    if result.success {
        println!("\n[tool {}] ok", index);
        if let Some(data) = &result.data {
            if let Some(stdout) = data.get("stdout").and_then(|v| v.as_str()) {
                if !stdout.is_empty() && stdout != "(empty)" {
                    println!("{}", truncate(stdout, 300));
                }
            } else if let Some(message) = data.get("message").and_then(|v| v.as_str()) {
                println!("{}", message);
            }
        }
    } else {
        println!("\n[tool {}] failed", index);
        if let Some(error) = &result.error {
            println!("{}", error);
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
