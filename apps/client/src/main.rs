use lumen_client::{
    format_bitrate, orientation, Config, JobQueue, JobQueueProvider, RefreshUserDirectory,
    UserDirectoryQuery,
};
use lumen_jellyfin_client::JellyfinClient;
use tokio::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumen_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        server = %config.jellyfin().url,
        environment = %config.environment(),
        "Starting Lumen client"
    );

    let client = JellyfinClient::new(config.jellyfin())?;
    let users = UserDirectoryQuery::new(config.query_stale_time());
    let queue = JobQueue::new(config.job_queue.clone());
    let provider = JobQueueProvider::mount(&queue);

    let session = client.is_authenticated().then_some(&client);
    match users.fetch_users(session).await {
        Ok(accounts) => {
            for account in &accounts {
                tracing::info!(
                    user_id = %account.id,
                    name = %account.name,
                    administrator = account.is_administrator(),
                    "User"
                );
            }
            tracing::info!(user_count = accounts.len(), "User directory loaded");
        }
        Err(e) => e.log(),
    }

    tracing::info!(
        orientation = %orientation::global().get(),
        max_streaming_bitrate = %format_bitrate(config.max_streaming_bitrate.map(|b| b as f64)),
        "Client ready, press Ctrl-C to exit"
    );

    // Reload the directory in the background each time it goes stale
    let refresh_every = config.refresh_interval();
    let mut refresh = tokio::time::interval_at(Instant::now() + refresh_every, refresh_every);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            _ = refresh.tick(), if client.is_authenticated() => {
                queue.enqueue(RefreshUserDirectory::new(users.clone(), client.clone()))?;
            }
        }
    }

    tracing::info!(stats = ?queue.stats(), "Shutting down");
    provider.unmount().await;

    Ok(())
}
