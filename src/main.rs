use taskhive::{config, run};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "cannot start without a valid config");
            std::process::exit(2);
        }
    };

    match run(config).await {
        Ok(summary) => {
            tracing::info!("Task completion summary: {summary}");
        }
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            std::process::exit(1);
        }
    }
}
