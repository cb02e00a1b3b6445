use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uwcourses::api::router;
use uwcourses::catalog::UwCatalogClient;
use uwcourses::config::AppConfig;
use uwcourses::db::open_term_store;
use uwcourses::services::{CatalogCache, CourseQueries};
use uwcourses::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "uwcourses=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let store = open_term_store(&config.db_dir, config.term).await?;
    let catalog = Arc::new(UwCatalogClient::new(config.catalog())?);
    let cache = CatalogCache::new(store, catalog, config.cache_ttl, config.fetch_timeout);
    let state = AppState::new(CourseQueries::new(cache));

    let app = router(state);

    info!("serving term {} on http://{}", config.term, config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
