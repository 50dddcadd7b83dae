//! Command-line driver: submit a generation batch for a title and poll
//! it to completion, printing each status change.
//!
//! Configuration via environment (dotenv supported):
//!
//! | Env Var         | Required | Default                 |
//! |-----------------|----------|-------------------------|
//! | `ATELIER_URL`   | no       | `http://localhost:3000` |
//! | `ATELIER_TOKEN` | **yes**  | --                      |
//! | `TITLE_ID`      | **yes**  | --                      |
//! | `QUANTITY`      | no       | `5`                     |

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use atelier_client::{ApiClient, PollState, StatusSink, TitlePoller};
use atelier_core::types::DbId;
use atelier_db::models::generation::PaintingView;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sink that logs each change as it lands.
struct LogSink;

impl StatusSink for LogSink {
    fn apply(&self, changed: Vec<PaintingView>, _references: &BTreeMap<DbId, String>) {
        for painting in changed {
            match painting.status.as_str() {
                "failed" => tracing::warn!(
                    painting_id = painting.id,
                    error = %painting.error_message,
                    "Painting failed",
                ),
                status => tracing::info!(
                    painting_id = painting.id,
                    status,
                    summary = %painting.summary,
                    "Painting updated",
                ),
            }
        }
    }

    fn settled(&self) {
        tracing::info!("All paintings are terminal");
    }

    fn auth_failed(&self) {
        tracing::error!("Authentication rejected; check ATELIER_TOKEN");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        std::env::var("ATELIER_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let token = std::env::var("ATELIER_TOKEN")
        .map_err(|_| anyhow::anyhow!("ATELIER_TOKEN must be set"))?;
    let title_id: DbId = std::env::var("TITLE_ID")
        .map_err(|_| anyhow::anyhow!("TITLE_ID must be set"))?
        .parse()?;
    let quantity: u32 = std::env::var("QUANTITY")
        .unwrap_or_else(|_| "5".into())
        .parse()?;

    let client = Arc::new(ApiClient::new(base_url, token));

    tracing::info!(title_id, quantity, "Submitting generation request");
    let submission = client.generate(title_id, quantity).await?;
    tracing::info!(message = %submission.message, "Submitted");

    let poller = TitlePoller::new(Arc::clone(&client), title_id);
    poller.submitted(&submission, Arc::new(LogSink));

    // Watch the state machine rather than the sink so Ctrl-C still exits
    // promptly via the runtime.
    while poller.state() != PollState::Settled {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    Ok(())
}
