// SymSafe CLI Entry Point
// Interactive symptom triage session over stdin/stdout

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use uuid::Uuid;

use symsafe_core::actors::llm::LlmActorHandle;
use symsafe_core::config::TriageConfig;
use symsafe_core::fs_manager::PortablePathManager;
use symsafe_core::learning::{LearningEntry, LearningLog};
use symsafe_core::recorder::{InteractionSink, MarkdownRecorder};
use symsafe_core::triage::{
    InteractionRecord, KnowledgeBase, PipelineOptions, TriagePipeline, TurnOutcome, Urgency,
};

const DEFAULT_LOG_FILTER: &str = "symsafe=info,symsafe_core=info";

/// SymSafe - virtual symptom triage assistant
#[derive(Parser)]
#[command(name = "symsafe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Knowledge base JSON file
    #[arg(long, value_name = "FILE")]
    kb: Option<PathBuf>,

    /// Minimum similarity for a fuzzy match (0.0 - 1.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// Directory for interaction and learning logs
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Ask for a correction after each turn and add developer notes to reviews
    #[arg(long)]
    learn: bool,

    /// Ask the generator to review every response
    #[arg(long)]
    review: bool,

    /// Generation timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Diagnostic log format (written to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create log filter")?;

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
        }
        LogFormat::Json => {
            let formatting_layer = BunyanFormattingLayer::new("symsafe".into(), std::io::stderr);
            Registry::default()
                .with(filter)
                .with(JsonStorageLayer)
                .with(formatting_layer)
                .try_init()
                .context("Failed to install log subscriber")?;
        }
    }

    Ok(())
}

/// Environment overlaid with command-line flags.
fn build_config(cli: &Cli) -> Result<TriageConfig> {
    let paths = PortablePathManager::discover();
    info!("Installation root: {:?}", paths.root_dir());
    let mut config = TriageConfig::from_env(&paths)?;

    if let Some(kb) = &cli.kb {
        config.knowledge_base_path = kb.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.match_threshold = threshold;
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = log_dir.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.generation_timeout_secs = secs;
    }
    config.learning_mode |= cli.learn;
    config.review_enabled |= cli.review;

    config.check()?;
    Ok(config)
}

fn render_banner(learning_mode: bool) {
    if learning_mode {
        println!(
            "\n╔═════════════════════════════════════════════════╗\n\
             ║  SymSafe – Virtual Triage AI   🧠 LEARNING MODE ║\n\
             ╚═════════════════════════════════════════════════╝\n"
        );
    } else {
        println!(
            "\n╔════════════════════════════════════╗\n\
             ║     SymSafe – Virtual Triage AI    ║\n\
             ╚════════════════════════════════════╝\n"
        );
    }
    println!("💬 Type symptoms or questions | Type 'exit' to quit");
    if learning_mode {
        println!("📘 LEARNING MODE ENABLED – you will be asked for corrections\n");
    }
}

fn urgency_badge(urgency: &Urgency) -> String {
    match urgency {
        u if u.is_high() => format!("🔴 {}", u),
        Urgency::Unknown => format!("⚪ {}", urgency),
        other => format!("🟢 {}", other),
    }
}

fn print_outcome(outcome: &TurnOutcome) {
    let assessment = &outcome.assessment;
    if !assessment.red_flags.is_empty() {
        println!(
            "\n⚠️  Red flag: {}. If this is an emergency, call your local emergency number now.",
            assessment.red_flags.join(", ")
        );
    }

    println!(
        "\n🤖 AI Assistant [{}]:\n{}\n",
        urgency_badge(outcome.urgency()),
        outcome.response.display_text()
    );

    if let Some(checklist) = &outcome.evaluation {
        println!("🧪 Checklist ({}/5):\n{}\n", checklist.passed_count(), checklist.to_markdown());
    }
    if let Some(review) = &outcome.review {
        println!("🧠 Evaluation:\n{}\n", review);
    }
}

fn prompt(label: &str) {
    print!("{}", label);
    // Prompt display is best effort
    let _ = std::io::stdout().flush();
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    tokio::select! {
        line = lines.next_line() => Ok(line.context("Failed to read from stdin")?),
        _ = tokio::signal::ctrl_c() => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    let config = build_config(&cli)?;
    let session_id = Uuid::new_v4();
    info!("Starting SymSafe session {}", session_id);

    let (knowledge_base, load_error) = KnowledgeBase::load_or_empty(&config.knowledge_base_path);
    if let Some(e) = load_error {
        println!("⚠️  Knowledge base unavailable ({}). Every symptom will use the AI fallback.", e);
    }

    if config.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set, fallback generation will likely fail");
    }

    let llm = Arc::new(LlmActorHandle::new(config.llm.clone()));
    let options = PipelineOptions::from_config(&config, config.load_system_prompt());
    let pipeline = TriagePipeline::new(Arc::new(knowledge_base), llm, options);

    let mut recorder = match MarkdownRecorder::create(&config.log_dir, Local::now()) {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            error!("Interaction log disabled: {}", e);
            None
        }
    };
    let learning_log = if config.learning_mode {
        match LearningLog::open(&config.log_dir) {
            Ok(log) => Some(log),
            Err(e) => {
                error!("Learning log disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    render_banner(config.learning_mode);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt("👤 You: ");
        let Some(line) = read_line(&mut lines).await? else {
            println!();
            break;
        };
        let user_input = line.trim();
        if user_input.is_empty() {
            continue;
        }
        if matches!(user_input.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let assessment = pipeline.assess(user_input);
        let cancel = CancellationToken::new();
        let turn = pipeline.respond(&assessment, &cancel);
        tokio::pin!(turn);

        let result = tokio::select! {
            result = &mut turn => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("Turn interrupted");
                cancel.cancel();
                turn.await
            }
        };

        let record = match result {
            Ok(outcome) => {
                print_outcome(&outcome);
                InteractionRecord::from_outcome(session_id, &outcome)
            }
            Err(e) => {
                error!("Turn failed: {}", e);
                println!(
                    "\n🤖 AI Assistant [{}]:\nSorry, I could not produce a response ({}). \
                     If your symptoms are severe, contact a healthcare provider or emergency services.\n",
                    urgency_badge(&assessment.urgency),
                    e
                );
                InteractionRecord::failed(session_id, &assessment, &e)
            }
        };

        if let Some(recorder) = recorder.as_mut() {
            if let Err(e) = recorder.record(&record) {
                error!("Failed to record turn: {}", e);
            }
        }

        if let Some(log) = &learning_log {
            prompt("📝 Correction (enter to skip): ");
            let Some(correction) = read_line(&mut lines).await? else {
                println!();
                break;
            };
            if !correction.trim().is_empty() {
                if let Err(e) = log.append(&LearningEntry::new(session_id, user_input, &correction)) {
                    error!("Failed to save correction: {}", e);
                }
            }
        }
    }

    if let Some(recorder) = &recorder {
        info!("Session saved to {:?} ({} turns)", recorder.path(), recorder.turns_recorded());
    }
    println!("👋 Session ended.");
    Ok(())
}
