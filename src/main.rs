use anyhow::Context;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tapkeeper::ranking::{RankPropagator, RedisRankingStore, SqliteRankingStore};
use tapkeeper::{
    api, config::Config, db::init_db, EconomyService, KeyedTokenIssuer, LeaderboardEngine,
    RankingStore, Repository, RuleConfig,
};

async fn build_app(config: &Config) -> anyhow::Result<axum::Router> {
    let rules = match &config.rules_path {
        Some(path) => RuleConfig::from_path(Path::new(path))?,
        None => RuleConfig::embedded()?,
    };
    tracing::info!(
        version = rules.version,
        levels = rules.level_count(),
        "Rules loaded"
    );
    let rules = Arc::new(rules);

    let pool = init_db(&config.database_path)
        .await
        .context("failed to initialize database")?;

    let ranking: Arc<dyn RankingStore> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Ranking index: redis");
            Arc::new(RedisRankingStore::new(url, "tapkeeper:rank:")?)
        }
        None => {
            tracing::info!("Ranking index: sqlite");
            Arc::new(SqliteRankingStore::new(pool.clone()))
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let tokens = Arc::new(KeyedTokenIssuer::new(
        config.token_secret.as_bytes(),
        config.token_issuer.clone(),
    ));
    let economy = Arc::new(EconomyService::new(
        repo.clone(),
        RankPropagator::new(ranking.clone(), config.rank_propagation),
        rules.clone(),
        tokens,
        chrono::Duration::seconds(config.token_ttl_secs),
    ));
    let leaderboard = Arc::new(LeaderboardEngine::new(repo, ranking, rules));

    Ok(api::create_router(api::AppState::new(
        economy,
        leaderboard,
        config.admin_token.clone(),
    )))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let app = match build_app(&config).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Startup failed: {:#}", e);
            std::process::exit(1);
        }
    };

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
