//! `wayfarer chat`: interactive or single-message chat mode.

use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use wayfarer_agent::{SessionManager, TURN_FAILED_APOLOGY};
use wayfarer_config::AppConfig;
use wayfarer_core::event::TurnEvent;
use wayfarer_core::message::UserId;
use wayfarer_memory::{InMemoryHistory, InMemoryStore, SeedData};
use wayfarer_providers::OpenAiCompatProvider;
use wayfarer_tools::StaticSearchBackend;

pub async fn run(
    config_path: &Path,
    user: &str,
    message: Option<String>,
    show_events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early and give a clear error
    let Some(api_key) = config.model.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    export WAYFARER_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file under [model] api_key.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let provider = Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.model.api_base.clone(),
        api_key,
    ));
    let history = Arc::new(InMemoryHistory::new(config.agent.max_history_messages));
    let memory = Arc::new(InMemoryStore::new());

    // Apply seed memories before the first turn
    let seed = SeedData::load(&config.paths.seed_file)?;
    let seeded = seed.seed_all(memory.as_ref()).await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "Applied seed memories");
    }

    let manager = SessionManager::new(
        config.clone(),
        provider,
        history,
        memory,
        Arc::new(StaticSearchBackend),
    );
    let session = manager.open(&UserId::new(user))?;

    // Stream tool activity to stderr while the agent works
    if show_events {
        if let Some(mut events) = session.take_events() {
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    match event.event {
                        TurnEvent::ToolCallStarted { name, .. } => {
                            eprintln!("  [tool] {name} started");
                        }
                        TurnEvent::ToolCallFinished { name, output, .. } => {
                            eprintln!("  [tool] {name} finished: {output}");
                        }
                        TurnEvent::ToolCallFailed { name, error, .. } => {
                            eprintln!("  [tool] {name} failed: {error}");
                        }
                        _ => {}
                    }
                }
            });
        }
    }

    if let Some(msg) = message {
        // Single message mode. The loop already logged any underlying cause;
        // the user only sees the apology.
        eprint!("  Thinking...");
        let result = session.send(&msg).await;
        eprint!("\r              \r");
        manager.flush_memory_updates().await;
        return match result {
            Ok(response) => {
                println!("{response}");
                Ok(())
            }
            Err(_) => Err(TURN_FAILED_APOLOGY.into()),
        };
    }

    // Interactive mode
    println!();
    println!("  Wayfarer, your travel concierge ({})", config.model.name);
    println!("  Chatting as '{user}'. Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt()?;
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match session.send(line).await {
            Ok(response) => {
                println!();
                for out in response.lines() {
                    println!("  Wayfarer > {out}");
                }
                println!();
            }
            Err(_) => {
                // Cause is in the logs; keep the chat surface generic.
                println!();
                println!("  Wayfarer > {TURN_FAILED_APOLOGY}");
                println!();
            }
        }
        prompt()?;
    }

    manager.flush_memory_updates().await;
    println!();
    println!("  Safe travels!");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()
}
