//! famhub - HTTP server entry point.

use famhub::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "famhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: db={}, tz_offset={}min, coach={}",
        config.db_path.display(),
        config.tz_offset_minutes,
        if config.xai_api_key.is_some() {
            "enabled"
        } else {
            "fallback only"
        }
    );

    api::serve(config).await
}
