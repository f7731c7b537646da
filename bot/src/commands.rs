use teloxide::{prelude::*, utils::command::BotCommands};
use thiserror::Error;

use crate::checker::{StatusChecker, StatusSource};
use crate::storage::{Storage, StorageError};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum WatchCommand {
    #[command(description = "add an account to this chat's watchlist.")]
    Add(String),
    #[command(description = "remove an account from this chat's watchlist.")]
    Remove(String),
    #[command(description = "show this chat's watchlist.")]
    List,
    #[command(description = "check an account's status right now.")]
    Check(String),
    #[command(description = "show this help text.")]
    Help,
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub async fn handle_command(
    bot: Bot,
    storage: Storage,
    checker: StatusChecker,
    msg: Message,
    cmd: WatchCommand,
) -> Result<(), BotError> {
    let chat_id = msg.chat.id;

    match cmd {
        WatchCommand::Add(args) => match first_arg(&args) {
            None => {
                bot.send_message(chat_id, "Usage: /add username").await?;
            }
            Some(username) => {
                if storage.add(chat_id.0, &username).await? {
                    bot.send_message(chat_id, format!("✅ Added {username} to your watchlist."))
                        .await?;
                } else {
                    bot.send_message(chat_id, format!("{username} is already in your watchlist."))
                        .await?;
                }
            }
        },
        WatchCommand::Remove(args) => match first_arg(&args) {
            None => {
                bot.send_message(chat_id, "Usage: /remove username").await?;
            }
            Some(username) => {
                if storage.remove(chat_id.0, &username).await? {
                    bot.send_message(chat_id, format!("❌ Removed {username} from your watchlist."))
                        .await?;
                } else {
                    bot.send_message(chat_id, format!("{username} not found in your watchlist."))
                        .await?;
                }
            }
        },
        WatchCommand::List => {
            let names = storage.names(chat_id.0).await;
            let text = if names.is_empty() {
                "📭 Your watchlist is empty.".to_string()
            } else {
                format!("📌 Your watchlist:\n{}", names.join("\n"))
            };
            bot.send_message(chat_id, text).await?;
        }
        WatchCommand::Check(args) => match first_arg(&args) {
            None => {
                bot.send_message(chat_id, "Usage: /check username").await?;
            }
            Some(username) => {
                // informational only: no watchlist or cache change, so this
                // never shifts the monitor's baseline
                let status = checker.check(&username).await;
                bot.send_message(chat_id, format!("🔎 {username} → {status}"))
                    .await?;
            }
        },
        WatchCommand::Help => {
            bot.send_message(chat_id, WatchCommand::descriptions().to_string())
                .await?;
        }
    }

    Ok(())
}

// Commands take one username; everything after the first token is ignored.
// Lowercased here so replies show the same form the store keeps.
fn first_arg(raw: &str) -> Option<String> {
    raw.split_whitespace().next().map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_arg_takes_the_first_token_lowercased() {
        assert_eq!(first_arg("Alice"), Some("alice".to_string()));
        assert_eq!(first_arg("  Alice  extra junk "), Some("alice".to_string()));
    }

    #[test]
    fn first_arg_rejects_blank_input() {
        assert_eq!(first_arg(""), None);
        assert_eq!(first_arg("   "), None);
    }
}
