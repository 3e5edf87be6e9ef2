use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use intel_core::{ArticleStore, Error, InferenceBackend, Result, Settings};
use intel_inference::{OllamaClient, UnifiedAnalyzer};
use intel_scrapers::{available_sources, PipelineManager, ScrapeConfig};
use intel_storage::MemoryStore;
#[cfg(feature = "sqlite")]
use intel_storage::SqliteStore;
use intel_web::{create_app, AppState};

#[derive(Parser)]
#[command(author, version, about = "Competitive-intelligence news pipeline", long_about = None)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "memory")]
    storage: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one scrape-and-analyze pipeline run
    Run {
        /// Registered source to ingest
        #[arg(long, default_value = "nvidia")]
        source: String,
    },
    /// Run the pipeline in the background and serve the query API
    Serve {
        #[arg(long, default_value = "nvidia")]
        source: String,

        /// Skip the startup pipeline run and only serve stored data
        #[arg(long)]
        no_pipeline: bool,
    },
    /// List registered sources
    Sources,
}

fn init_tracing(level: &str) {
    let level = level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[allow(unused_variables)]
async fn create_store(kind: &str, settings: &Settings) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(
            SqliteStore::connect(&settings.database_path).await?,
        )),
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(Error::Config(
            "sqlite support is not compiled in".to_string(),
        )),
        other => Err(Error::Config(format!("unknown storage backend: {}", other))),
    }
}

fn create_llm(settings: &Settings) -> Result<Arc<OllamaClient>> {
    Ok(Arc::new(OllamaClient::new(
        &settings.llm_url,
        &settings.llm_model,
        settings.analyzer_timeout_secs,
        settings.llm_max_retries,
    )?))
}

fn create_manager(
    store: Arc<dyn ArticleStore>,
    llm: Arc<dyn InferenceBackend>,
    settings: &Settings,
) -> PipelineManager {
    let analyzer = Arc::new(UnifiedAnalyzer::new(llm, settings.max_content_chars));
    PipelineManager::new(store, analyzer, ScrapeConfig::from_settings(settings))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    init_tracing(&settings.log_level);

    match cli.command {
        Commands::Run { source } => {
            let store = create_store(&cli.storage, &settings).await?;
            let llm = create_llm(&settings)?;
            if !llm.health_check().await {
                warn!(
                    url = %settings.llm_url,
                    "inference service is not responding, analysis will likely fail"
                );
            }
            let manager = create_manager(store, llm, &settings);
            let report = manager.run(&source).await?;
            println!(
                "extracted {} / stored {} / analyzed {} / failed {}",
                report.extracted, report.stored, report.analyzed, report.failed
            );
        }
        Commands::Serve {
            source,
            no_pipeline,
        } => {
            let store = create_store(&cli.storage, &settings).await?;
            let llm = create_llm(&settings)?;
            let llm_backend: Arc<dyn InferenceBackend> = llm.clone();

            if !no_pipeline {
                let manager = create_manager(store.clone(), llm_backend.clone(), &settings);
                // The startup pipeline runs in the background; a failed run is
                // logged and the API keeps serving previously stored data.
                tokio::spawn(async move {
                    match manager.run(&source).await {
                        Ok(report) => info!(
                            extracted = report.extracted,
                            stored = report.stored,
                            analyzed = report.analyzed,
                            failed = report.failed,
                            "startup pipeline finished"
                        ),
                        Err(e) => error!("startup pipeline failed: {}", e),
                    }
                });
            }

            let app = create_app(AppState {
                store,
                llm: llm_backend,
            });
            let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
            info!(addr = %settings.bind_addr, "🌐 serving query API");
            axum::serve(listener, app).await?;
        }
        Commands::Sources => {
            println!("Registered sources:");
            for source in available_sources() {
                println!("  - {}", source);
            }
        }
    }

    Ok(())
}
