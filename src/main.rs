use food_journal::{AppState, Config, FileStore, JournalController, clock::SystemClock, router};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let addr = config.listen_addr()?;

    let store = FileStore::new(&config.data_dir);
    let journal = tokio::task::spawn_blocking(move || JournalController::open(store, SystemClock)).await?;
    info!(
        data_dir = %config.data_dir.display(),
        days = journal.history().len(),
        "journal loaded"
    );

    let state = AppState::new(journal);
    tokio::spawn(watch_rollover(state.clone(), config.rollover_check));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// Detection only: the selected date is never changed from here.
async fn watch_rollover(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    let mut reported = false;
    loop {
        ticker.tick().await;
        let journal = state.journal.lock().await;
        let rolled = journal.date_rolled_over();
        if rolled && !reported {
            info!(
                selected = %journal.selected_date(),
                today = %journal.today_key(),
                "calendar date moved past the selected date"
            );
        }
        reported = rolled;
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
