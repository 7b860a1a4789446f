use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use colloquy::application::services::{
    ConversationListCache, ConversationService, RelayConfig, RelayService,
};
use colloquy::infrastructure::auth::JwtIdentityVerifier;
use colloquy::infrastructure::llm::create_completion_client;
use colloquy::infrastructure::observability::{TracingConfig, init_tracing};
use colloquy::infrastructure::persistence::{PgConversationRepository, create_pool};
use colloquy::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment)?;

    init_tracing(
        TracingConfig {
            environment: environment.to_string(),
            json_format: settings.logging.enable_json,
        },
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    sqlx::migrate!().run(&pool).await?;

    let repository = Arc::new(PgConversationRepository::new(pool));
    let list_cache = ConversationListCache::new(Duration::from_secs(
        settings.cache.conversation_list_ttl_seconds,
    ));
    let conversation_service = Arc::new(ConversationService::new(repository, list_cache));

    let completion_client =
        create_completion_client(&settings.llm).map_err(anyhow::Error::msg)?;
    let relay_service = Arc::new(RelayService::new(
        completion_client,
        RelayConfig {
            system_prompt: settings.llm.system_prompt.clone(),
            connect_attempts: settings.llm.connect_attempts,
            retry_delay: Duration::from_millis(settings.llm.retry_delay_ms),
        },
    ));

    let identity_verifier = Arc::new(JwtIdentityVerifier::new(&settings.auth.jwt_secret));

    let state = AppState {
        relay_service,
        conversation_service,
        identity_verifier,
        sse_keep_alive: Duration::from_secs(settings.llm.sse_keep_alive_seconds),
    };

    let router = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
