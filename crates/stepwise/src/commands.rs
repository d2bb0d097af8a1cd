//! Stepwise command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use stepwise_agent::{tools, Agent, ConsoleSink, Toolbox};
use stepwise_config::{self as config, Config};
use stepwise_memory::KeywordStore;
use stepwise_provider::OpenAiProvider;

/// Initialize config file and workspace
pub async fn init_command() -> Result<()> {
    let config = config::init().await.context("failed to initialize config")?;

    println!("Config: {}", config::config_path().display());
    println!("Work dir: {}", config.work_dir().display());
    if !config.has_api_key() {
        println!();
        println!("No API key set. Add one under \"provider\".\"api_key\" in the config file.");
    }
    Ok(())
}

/// Show configuration status
pub async fn status_command() -> Result<()> {
    let config = Config::load().await?;

    println!("Stepwise status");
    println!("  Config file: {}", config::config_path().display());
    println!(
        "  API key: {}",
        if config.has_api_key() { "[set]" } else { "[not set]" }
    );
    println!("  Model: {}", config.provider.model);
    println!("  Prompts dir: {}", config.prompts_dir().display());
    println!("  Work dir: {}", config.work_dir().display());
    println!("  Max thought steps: {}", config.agent.max_thought_steps);
    println!(
        "  Long-term memory: {}",
        if config.agent.long_term_memory {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}

/// Run a single task, or an interactive task prompt when none is given
pub async fn run_command(task: Option<String>, verbose: bool) -> Result<()> {
    let config = Config::load().await?;
    let agent = build_agent(&config).await?;

    match task {
        Some(task) => {
            let reply = agent.run(&task, verbose).await?;
            println!("{}", reply);
        }
        None => {
            println!("Enter a task, or 'quit' to leave.");
            loop {
                print!("task> ");
                std::io::stdout().flush().ok();

                let mut line = String::new();
                if std::io::stdin().read_line(&mut line)? == 0 {
                    break;
                }
                let task = line.trim();
                if task.is_empty() {
                    continue;
                }
                if task.eq_ignore_ascii_case("quit") || task.eq_ignore_ascii_case("exit") {
                    break;
                }

                match agent.run(task, verbose).await {
                    Ok(reply) => println!("\n{}\n", reply),
                    Err(e) => eprintln!("\nrun failed: {}\n", e),
                }
            }
        }
    }
    Ok(())
}

async fn build_agent(config: &Config) -> Result<Agent> {
    if !config.has_api_key() {
        anyhow::bail!(
            "no API key configured; run 'stepwise init' and set provider.api_key in {}",
            config::config_path().display()
        );
    }

    let provider = OpenAiProvider::new(
        config.provider.api_key.clone(),
        config.provider.api_base.clone(),
        config.provider.model.clone(),
    )
    .with_temperature(config.provider.temperature)
    .with_max_tokens(config.provider.max_tokens);

    let work_dir = config.work_dir();
    config::paths::ensure_dir(&work_dir).await?;

    let mut toolbox = Toolbox::new();
    toolbox.register(tools::ListDirTool::new(work_dir.clone()));
    toolbox.register(tools::ReadFileTool::new(work_dir.clone()));
    toolbox.register(tools::FinishTool);

    let mut agent = Agent::new(Arc::new(provider), config.prompts_dir(), toolbox)
        .with_work_dir(&work_dir)
        .with_max_thought_steps(config.agent.max_thought_steps)
        .with_memory_token_budget(config.agent.memory_token_budget)
        .with_sink(Arc::new(ConsoleSink));

    if let Some(timeout) = config.step_timeout() {
        agent = agent.with_step_timeout(timeout);
    }

    if config.agent.long_term_memory {
        let store = KeywordStore::open(config::memory_path()).await?;
        info!("long-term memory at {}", config::memory_path().display());
        agent = agent.with_long_term_memory(Arc::new(store));
    }

    Ok(agent)
}
