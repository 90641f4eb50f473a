use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sevasahayak::api::{serve, AppState};
use sevasahayak::engine::AgentRegistry;
use sevasahayak::factory::{AgentFactory, FactoryConfig};
use sevasahayak::providers::{
    cosine_similarity, EmbeddingProvider, MockEmbeddingProvider, MockTextGenerator, OllamaProvider,
    TextGenerator,
};
use sevasahayak::storage::InMemoryStore;
use sevasahayak::types::{AgentRequest, AlertFilter, Priority};
use sevasahayak::Config;

#[derive(Parser)]
#[command(name = "sevasahayak")]
#[command(about = "Multi-agent orchestration for elderly care", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Config file (.toml, .yaml or .yml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Use local mock models instead of Ollama")]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, help = "Port to listen on (defaults to api_port)")]
        port: Option<u16>,
    },
    /// Boot every agent and replay a scripted day of requests
    Demo,
    /// Send one request through the orchestrator
    Process {
        #[arg(help = "Request type, e.g. health_data")]
        request_type: String,
        #[arg(long, default_value = "{}", help = "JSON payload")]
        data: String,
        #[arg(long, help = "critical, high, medium or low")]
        priority: Option<String>,
    },
    /// Cosine similarity of two texts under the embedding model
    Similarity { first: String, second: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => run_server(&config, cli.offline, port).await?,
        Commands::Demo => run_demo(&config, cli.offline).await?,
        Commands::Process {
            request_type,
            data,
            priority,
        } => run_process(&config, cli.offline, request_type, &data, priority.as_deref()).await?,
        Commands::Similarity { first, second } => {
            run_similarity(&config, cli.offline, first, second).await?
        }
    }

    Ok(())
}

async fn boot(config: &Config, offline: bool) -> Result<AgentRegistry> {
    let generator: Arc<dyn TextGenerator> = if offline {
        Arc::new(MockTextGenerator::new())
    } else {
        Arc::new(OllamaProvider::new(Some(config.ollama_url.clone())))
    };

    let store = InMemoryStore::new();
    let registry = AgentFactory::new(store.factory(), FactoryConfig::from(config))
        .with_generator(generator)
        .build_registry(&config.agents)?;

    let report = registry.initialize_all().await;
    for failure in &report.failed {
        log::warn!("{}", failure);
    }
    Ok(registry)
}

async fn run_server(config: &Config, offline: bool, port: Option<u16>) -> Result<()> {
    let registry = Arc::new(boot(config, offline).await?);
    let port = port.unwrap_or(config.api_port);

    let result = serve(AppState::new(registry.clone()), port).await;
    registry.shutdown_all().await;
    result
}

async fn run_process(
    config: &Config,
    offline: bool,
    request_type: String,
    data: &str,
    priority: Option<&str>,
) -> Result<()> {
    let data: Value = serde_json::from_str(data).context("--data must be valid JSON")?;
    let mut request = AgentRequest::new(request_type, data);
    if let Some(priority) = priority {
        request = request.with_priority(
            Priority::from_str(priority).ok_or_else(|| anyhow!("Unknown priority: {}", priority))?,
        );
    }

    let registry = boot(config, offline).await?;
    let response = registry
        .process_with_timeout(request, Duration::from_secs(30))
        .await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    registry.shutdown_all().await;
    Ok(())
}

async fn run_similarity(config: &Config, offline: bool, first: String, second: String) -> Result<()> {
    let embedder: Box<dyn EmbeddingProvider> = if offline {
        Box::new(MockEmbeddingProvider::default())
    } else {
        Box::new(OllamaProvider::new(Some(config.ollama_url.clone())))
    };

    let vectors = embedder
        .embed_batch(&config.embedding_model, &[first, second])
        .await?;
    let [a, b] = vectors.as_slice() else {
        return Err(anyhow!("Expected two embeddings, got {}", vectors.len()));
    };
    println!("{:.4}", cosine_similarity(a, b)?);
    Ok(())
}

async fn run_demo(config: &Config, offline: bool) -> Result<()> {
    let registry = boot(config, offline).await?;

    let script = [
        ("health-monitoring", "health_reading", json!({ "heartRate": 72, "temperature": 36.8 })),
        (
            "health-monitoring",
            "health_reading",
            json!({ "heartRate": 118, "bloodPressure": { "systolic": 152, "diastolic": 95 } }),
        ),
        (
            "safety-activity",
            "activity_sample",
            json!({ "acceleration": { "x": 0.4, "y": 1.1, "z": -18.2 }, "location": "bathroom" }),
        ),
        (
            "reminder-schedule",
            "schedule_medication",
            json!({ "medicationName": "Metformin", "time": "08:00", "dosage": "500mg" }),
        ),
        (
            "caregiver-coordination",
            "send_message",
            json!({
                "sender": "Dr. Sharma",
                "content": "Blood test results are in. Please schedule a follow-up visit this week.",
                "important": true
            }),
        ),
        (
            "social-engagement",
            "schedule_activity",
            json!({ "name": "Evening walk with neighbours", "time": "18:00" }),
        ),
    ];

    for (agent_id, request_type, data) in script {
        let response = registry
            .dispatch_to(agent_id, AgentRequest::new(request_type, data))
            .await?;
        println!(
            "{} {} -> {}",
            agent_id,
            request_type,
            if response.success { "ok" } else { "failed" }
        );
    }

    registry
        .process(AgentRequest::new(
            "agent_status_update",
            json!({
                "agentId": "safety-activity",
                "agentName": "Safety & Activity Agent",
                "status": "error",
                "errorMessage": "motion sensor offline"
            }),
        ))
        .await?;

    if let Some(orchestrator) = registry.orchestrator() {
        println!("\nAlerts (newest first):");
        for alert in orchestrator.alerts(&AlertFilter::default()).await {
            println!(
                "  [{}] {} ({})",
                alert.alert_type.as_str(),
                alert.message,
                alert.source
            );
        }
    }

    registry.shutdown_all().await;
    Ok(())
}
