//! MoonAgent CLI - Main entry point

mod repl;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moon_agent::{TaskManager, TaskManagerConfig, TaskTool};
use moon_foundation::{Settings, SettingsOverrides, ToolContext};
use moon_provider::MoonshotProvider;
use moon_tool::ToolRegistry;

/// MoonAgent - agent assistant for the terminal
#[derive(Parser, Debug)]
#[command(name = "moonagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in non-interactive mode with a single prompt
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// API key (overrides MOONSHOT_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL for the API endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Working directory for tool execution
    #[arg(long)]
    dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = Settings::load(SettingsOverrides {
        api_key: args.api_key,
        base_url: args.base_url,
        model: args.model,
    })?;

    let service = Arc::new(
        MoonshotProvider::new(settings.api_key.clone(), settings.model.clone())
            .map_err(|e| anyhow::anyhow!("failed to create provider: {e}"))?
            .with_base_url(settings.base_url.clone()),
    );

    let ctx = match args.dir {
        Some(dir) => ToolContext::new(dir),
        None => ToolContext::default(),
    };

    // Assemble the tool set: builtins plus the task tool, which shares
    // one task manager for the whole process.
    let mut registry = ToolRegistry::with_builtins();
    let manager = Arc::new(TaskManager::new(
        service.clone(),
        Arc::new(ToolRegistry::with_builtins()),
        ctx.clone(),
        TaskManagerConfig::default(),
    ));
    registry.register(Arc::new(TaskTool::new(Arc::clone(&manager))))?;
    let registry = Arc::new(registry);

    let mut repl = repl::Repl::new(service, registry, Arc::clone(&manager), ctx);

    // Run based on mode
    if let Some(prompt) = args.prompt {
        repl.run_once(&prompt).await;
    } else {
        repl.run().await?;
    }

    // Let in-flight background tasks finish before exiting
    manager.shutdown().await;

    Ok(())
}
