use std::sync::Arc;

use citibike_analyst::agent::Agent;
use citibike_analyst::channels::{ChannelManager, CliChannel, WebChannel};
use citibike_analyst::config::Settings;
use citibike_analyst::llm::{create_provider, LlmBackend, LlmConfig};
use citibike_analyst::tools::{RunSqlQueryTool, ToolRegistry};
use citibike_analyst::warehouse::BigQueryWarehouse;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export OPENAI_API_KEY=sk-...");
            eprintln!("  export GOOGLE_APPLICATION_CREDENTIALS=ruta/al/service-account.json");
            std::process::exit(1);
        }
    };

    eprintln!("🚴 CitiBike Analyst v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", settings.model);
    eprintln!("   Chat WS: ws://0.0.0.0:{}/ws/chat", settings.http_port);
    eprintln!(
        "   Chat API: http://0.0.0.0:{port}/api/ask, http://0.0.0.0:{port}/api/history",
        port = settings.http_port
    );
    eprintln!("   Type a question and press Enter. Ctrl+D to exit.\n");

    // Connect the warehouse first so credential problems stop startup
    let warehouse = Arc::new(
        BigQueryWarehouse::connect(&settings.credentials_path)?
            .with_max_rows(settings.agent.max_rows),
    );

    let llm = create_provider(&LlmConfig {
        backend: LlmBackend::OpenAi,
        api_key: settings.openai_api_key.clone(),
        model: settings.model.clone(),
        base_url: settings.openai_base_url.clone(),
    })?;

    let tools = Arc::new(ToolRegistry::new());
    tools
        .register(Arc::new(RunSqlQueryTool::new(warehouse)))
        .await;

    // Web channel needs to exist before the router build
    let web_channel = WebChannel::new();
    let app = web_channel.router();
    let http_port = settings.http_port;
    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", http_port))
            .await
            .expect("Failed to bind chat server port");
        tracing::info!(port = http_port, "Web chat server started");
        axum::serve(listener, app).await.ok();
    });

    let mut channels = ChannelManager::new();
    channels.add(Box::new(CliChannel::new()));
    channels.add(Box::new(web_channel));
    eprintln!("   Channels: {}\n", channels.names().join(", "));

    let agent = Agent::new(settings.agent.clone(), llm, tools, channels);
    agent.run().await?;

    Ok(())
}
