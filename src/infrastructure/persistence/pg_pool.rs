use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, instrument, warn};

use crate::application::ports::RepositoryError;

const MAX_ATTEMPTS: u32 = 6;

/// Connects with bounded exponential backoff so the service survives a
/// database that comes up a few seconds after it does.
#[instrument(skip(url))]
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let mut delay = Duration::from_millis(250);

    for attempt in 1..=MAX_ATTEMPTS {
        let options = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5));

        match options.connect(url).await {
            Ok(pool) => {
                info!(attempt, "PostgreSQL connection pool established");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    error = %e,
                    delay_ms = delay.as_millis(),
                    "PostgreSQL not reachable, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(4));
            }
            Err(e) => return Err(RepositoryError::ConnectionFailed(e.to_string())),
        }
    }

    unreachable!("loop returns on the final attempt")
}
