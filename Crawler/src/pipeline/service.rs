// src/pipeline/service.rs

//! Long-running service: scheduled checks plus the bot command listener.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Config, Credentials};
use crate::pipeline::{Scheduler, Watcher};
use crate::services::{BotListener, CourseCrawler, TelegramClient, bot_commands};
use crate::storage::LocalStorage;

/// Wire the production collaborators into a [`Watcher`].
pub fn build_watcher(
    config: &Config,
    credentials: &Credentials,
    storage_dir: &Path,
    telegram: Arc<TelegramClient>,
) -> Result<Watcher> {
    let crawler = CourseCrawler::new(config.source.clone())?;
    let storage = LocalStorage::new(config.snapshot_path(storage_dir));

    Ok(Watcher::new(
        config,
        credentials,
        Arc::new(crawler),
        Arc::new(storage),
        telegram,
    ))
}

/// Run scheduled checks and answer bot commands until `shutdown` resolves.
pub async fn run_service<F>(
    config: &Config,
    credentials: &Credentials,
    storage_dir: &Path,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let telegram = Arc::new(TelegramClient::new(&config.telegram, credentials)?);
    let watcher = Arc::new(build_watcher(
        config,
        credentials,
        storage_dir,
        telegram.clone(),
    )?);

    if let Err(e) = telegram.set_my_commands(&bot_commands()).await {
        log::warn!("Could not register bot commands: {e}");
    }
    let username = match telegram.get_me().await {
        Ok(me) => me.username,
        Err(e) => {
            log::warn!("Could not fetch bot identity: {e}");
            None
        }
    };
    log::info!(
        "Bot {} ready, announcing to chat {}",
        username.as_deref().map_or("(unknown)".to_string(), |u| format!("@{u}")),
        credentials.chat_id
    );

    let scheduler = Scheduler::from_config(&config.schedule);
    let mut listener = BotListener::new(
        telegram,
        watcher.clone(),
        config.messages.clone(),
        &config.telegram,
        Duration::from_secs(config.schedule.retry_secs),
    )
    .with_username(username);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::join!(
        scheduler.run(&watcher, stopped(stop_rx.clone())),
        listener.run(stopped(stop_rx)),
        async move {
            shutdown.await;
            log::info!("Shutdown requested");
            let _ = stop_tx.send(true);
        },
    );
    Ok(())
}

/// Resolves once the stop flag is raised or the sender is gone.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
