use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pmf_core::store::AppState;
use pmf_researcher::api::{self, ApiContext};
use pmf_researcher::config::{self, Config};
use pmf_researcher::llm::{CompletionBackend, FallbackResolver, OpenAiBackend, YutoriBackend};
use pmf_researcher::orchestrator::Orchestrator;
use pmf_researcher::research::ResearchClient;
use pmf_researcher::speech::SpeechClient;

#[derive(Parser)]
#[command(name = "pmfr")]
#[command(about = "Backend for product-market fit interviews")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the PMF researcher server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "pmf_researcher=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let port = match cli.command {
        Some(Commands::Serve { port }) => port,
        None => 8000,
    };

    serve(Config::from_env(), port).await
}

async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let http = config::http_client();

    let primary: Arc<dyn CompletionBackend> = Arc::new(YutoriBackend::new(
        http.clone(),
        config.yutori_base_url.clone(),
        config.yutori_api_key.clone(),
    ));
    let secondary: Arc<dyn CompletionBackend> = Arc::new(OpenAiBackend::new(
        http.clone(),
        config.openai_api_key.clone(),
    ));
    let resolver = FallbackResolver::new(primary, Some(secondary));

    let orchestrator = Arc::new(Orchestrator::new(Arc::new(AppState::new()), resolver));
    let speech = SpeechClient::new(
        config::transcription_client(),
        config.openai_api_key.clone(),
        config.deepgram_api_key.clone(),
    );
    let research = ResearchClient::new(http, config.yutori_base_url, config.yutori_api_key);

    let app = api::create_router(ApiContext {
        orchestrator,
        speech,
        research,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("PMF researcher server listening on http://0.0.0.0:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
