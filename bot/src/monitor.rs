use async_trait::async_trait;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::task::JoinHandle;

use crate::checker::{StatusChecker, StatusSource};
use crate::storage::Storage;

/// Pause between full scans, measured from the end of one scan to the start
/// of the next. Checks inside a scan run one at a time, so a long watchlist
/// stretches the wall-clock cycle beyond this.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(20 * 60);

/// What a transport-level `Error` sample does to transition detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Skip the sample: it is never recorded, never becomes a baseline and
    /// never raises an alert. A network blip looks like a skipped check.
    #[default]
    Ignore,
    /// Errors count as observed statuses and can raise alerts like any other
    /// change, including the later recovery back to a real status.
    TreatAsChange,
}

/// Delivery side of an alert. Implemented by the Telegram bot; tests swap in
/// a recorder.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn alert(&self, chat_id: i64, text: String);
}

#[async_trait]
impl AlertSink for Bot {
    async fn alert(&self, chat_id: i64, text: String) {
        // a failed send must not kill the scan; the transition stays recorded
        if let Err(e) = self.send_message(ChatId(chat_id), text).await {
            log::warn!("could not deliver alert to chat {chat_id}: {e}");
        }
    }
}

pub fn spawn(bot: Bot, storage: Storage, checker: StatusChecker, policy: ErrorPolicy) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::info!(
            "account monitor running every {} minutes",
            CHECK_INTERVAL.as_secs() / 60
        );
        loop {
            scan_once(&storage, &checker, &bot, policy).await;
            tokio::time::sleep(CHECK_INTERVAL).await;
        }
    })
}

/// One full pass over every chat's watchlist. The first observation of an
/// account is recorded silently as its baseline; afterwards each change of
/// classification raises exactly one alert to the owning chat.
pub async fn scan_once<S, A>(storage: &Storage, source: &S, alerts: &A, policy: ErrorPolicy)
where
    S: StatusSource,
    A: AlertSink,
{
    let snapshot = storage.snapshot().await;
    for (chat_id, usernames) in snapshot.0 {
        for username in usernames {
            let current = source.check(&username).await;

            if policy == ErrorPolicy::Ignore && current.is_error() {
                log::debug!("check for {username} failed, keeping last status: {current}");
                continue;
            }

            match storage.last_status(chat_id, &username) {
                None => storage.record_status(chat_id, &username, current),
                Some(previous) if previous != current => {
                    log::info!("{username} in chat {chat_id}: {previous} → {current}");
                    storage.record_status(chat_id, &username, current.clone());
                    alerts
                        .alert(chat_id, format!("⚠ ALERT: {username} changed status → {current}"))
                        .await;
                }
                Some(_) => {}
            }
        }
    }
}
