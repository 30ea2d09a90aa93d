//! Consultant CLI
//!
//! Answers questions as an expert persona over an OpenAI-compatible chat API,
//! rotating credentials per action and backing off through rate limits

use anyhow::{Context, Result};
use clap::Parser;
use consultant::cli::{Args, AskArgs, Commands};
use consultant::config::{AppConfig, Settings};
use consultant::models::ModelName;
use consultant::providers::OpenAIProvider;
use consultant::services::{ConsultOptions, ConsultRequest, Consultant, ResilientClient};
use consultant::storage::{load_references, ChatHistory, PersonaStore, UsageLog};
use consultant::utils::logging::init_logging;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Environment settings first, they carry the logging configuration
    let mut settings = Settings::new().context("Failed to load environment settings")?;
    if let Some(level) = args.log_level() {
        settings.logging.level = level.to_string();
    }
    init_logging(&settings.logging)?;

    let mut app_config = match &args.config {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_default(),
    }
    .context("Failed to load configuration")?;
    settings.apply_to(&mut app_config);
    app_config.validate().context("Invalid configuration")?;

    info!("📁 Configuration loaded, data directory {:?}", app_config.storage.data_dir);

    match args.command {
        Commands::Ask(ask) => run_ask(&app_config, ask).await,
        Commands::Agents => {
            let personas = PersonaStore::new(app_config.storage.personas_path()).list()?;
            if personas.is_empty() {
                println!("No stored personas");
            }
            for persona in personas {
                println!("{}\n  {}", persona.title, persona.description);
            }
            Ok(())
        }
        Commands::History { clear } => {
            let history = ChatHistory::new(app_config.storage.history_path());
            if clear {
                history.clear()?;
                println!("Chat history cleared");
                return Ok(());
            }
            for entry in history.load()? {
                println!("User: {} {}\nExpert: {}\n", entry.user_input, entry.user_prompt, entry.expert_response);
            }
            Ok(())
        }
        Commands::Usage { reset } => {
            let usage = UsageLog::new(app_config.storage.usage_path());
            if reset {
                usage.reset()?;
                println!("Usage log reset");
                return Ok(());
            }
            for summary in usage.summary()? {
                println!(
                    "{:<9} calls={:<4} tokens={:<8} mean_tokens={:<8.1} time={:.2}s mean_time={:.2}s",
                    summary.action,
                    summary.calls,
                    summary.total_tokens,
                    summary.mean_tokens,
                    summary.total_time,
                    summary.mean_time
                );
            }
            Ok(())
        }
        Commands::Models => {
            let catalog = app_config.catalog();
            for name in catalog.model_names() {
                println!("{:<24} {}", name, catalog.max_tokens(name));
            }
            Ok(())
        }
    }
}

async fn run_ask(app_config: &AppConfig, ask: AskArgs) -> Result<()> {
    let provider = OpenAIProvider::from_settings(&app_config.provider)?;
    let client = ResilientClient::from_config(Arc::new(provider), app_config);
    let history = ChatHistory::new(app_config.storage.history_path());
    let interaction_number = u32::try_from(history.load()?.len()).unwrap_or(u32::MAX).saturating_add(1);

    let consultant = Consultant::new(
        client,
        PersonaStore::new(app_config.storage.personas_path()),
        history,
        app_config.catalog(),
    );

    let references = match &ask.references {
        Some(path) => load_references(path).with_context(|| format!("Failed to read references from {:?}", path))?,
        None => Vec::new(),
    };

    let request = ConsultRequest {
        user_input: ask.input,
        user_prompt: ask.prompt,
        model: ask.model.map(ModelName::from).unwrap_or_else(|| app_config.default_model()),
        temperature: ask.temperature,
        persona: ask.agent,
        references,
        interaction_number,
    };
    let options = ConsultOptions {
        refine: ask.refine,
        evaluate: ask.evaluate,
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight request");
            on_signal.cancel();
        }
    });

    let consultation = consultant.consult(&request, options, &cancel).await.map_err(|e| {
        error!(error_type = e.error_type(), "Consultation failed: {}", e);
        e
    })?;

    println!("## {}\n", consultation.answer.persona.title);
    if consultation.answer.response.is_empty() {
        println!("(the service is temporarily unavailable, no answer was produced)");
    } else {
        println!("{}", consultation.answer.response);
    }
    if let Some(refined) = consultation.refined {
        println!("\n## Refined\n\n{}", refined);
    }
    if let Some(evaluation) = consultation.evaluation {
        println!("\n## Evaluation\n\n{}", evaluation);
    }

    Ok(())
}
