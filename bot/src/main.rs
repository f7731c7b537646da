use futures_util::future::BoxFuture;
use std::sync::Arc;
use teloxide::error_handlers::ErrorHandler;
use teloxide::{dispatching::UpdateFilterExt, prelude::*};

mod checker;
mod commands;
mod models;
mod monitor;
mod storage;

use checker::StatusChecker;
use commands::WatchCommand;
use monitor::ErrorPolicy;
use storage::Storage;

const WATCHLIST_FILE: &str = "watchlist.json";

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    log::info!("🚀 Account watchdog bot starting...");

    let bot = Bot::from_env();
    let storage = Storage::load(WATCHLIST_FILE)
        .await
        .expect("failed to read watchlist file");
    let checker = StatusChecker::new();

    // Background scanner; alerts go straight to the chats that track the
    // account. Runs until the process exits.
    monitor::spawn(
        bot.clone(),
        storage.clone(),
        checker.clone(),
        ErrorPolicy::default(),
    );

    let handler = Update::filter_message()
        .filter_command::<WatchCommand>()
        .endpoint(move |bot: Bot, msg: Message, cmd: WatchCommand| {
            let storage = storage.clone();
            let checker = checker.clone();
            async move {
                match commands::handle_command(bot, storage, checker, msg, cmd).await {
                    Ok(()) => Ok::<(), teloxide::RequestError>(()),
                    Err(e) => {
                        log::warn!("command failed: {e}");
                        Ok(())
                    }
                }
            }
        });

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .error_handler(Arc::new(DispatchErrorHandler))
        .build()
        .dispatch()
        .await;
}

// Dispatcher-level failures (polling hiccups and the like) are only worth a
// debug line; the loop recovers on its own.
struct DispatchErrorHandler;

impl<E> ErrorHandler<E> for DispatchErrorHandler
where
    E: std::fmt::Debug + Send + 'static,
{
    fn handle_error(self: Arc<Self>, error: E) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            log::debug!("dispatcher error: {:?}", error);
        })
    }
}
