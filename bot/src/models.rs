use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-chat watchlists, keyed by Telegram chat id. This is also the persisted
/// document: serde renders it as `{ "<chat id>": ["username", ...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlists(pub BTreeMap<i64, Vec<String>>);

impl Watchlists {
    /// Appends a username to the chat's list. Returns false if it was already
    /// tracked (the list is left untouched). Usernames are lowercased here so
    /// every entry in the map is normalized.
    pub fn add(&mut self, chat_id: i64, username: &str) -> bool {
        let username = username.to_lowercase();
        let list = self.0.entry(chat_id).or_default();
        if list.contains(&username) {
            return false;
        }
        list.push(username);
        true
    }

    /// Removes a username from the chat's list. Returns false if the chat or
    /// the username was unknown.
    pub fn remove(&mut self, chat_id: i64, username: &str) -> bool {
        let username = username.to_lowercase();
        match self.0.get_mut(&chat_id) {
            Some(list) => match list.iter().position(|u| *u == username) {
                Some(pos) => {
                    list.remove(pos);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Tracked usernames for a chat, in insertion order.
    pub fn names(&self, chat_id: i64) -> Vec<String> {
        self.0.get(&chat_id).cloned().unwrap_or_default()
    }
}

/// Outcome of one profile check. `Error` is a transport failure (timeout,
/// DNS, reset), not a real classification; the monitor decides how much to
/// trust it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    NotFound,
    Suspended,
    Error(String),
}

impl AccountStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, AccountStatus::Error(_))
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => f.write_str("ACTIVE"),
            AccountStatus::NotFound => f.write_str("BANNED / NOT FOUND"),
            AccountStatus::Suspended => f.write_str("BANNED / SUSPENDED"),
            AccountStatus::Error(detail) => write!(f, "ERROR: {detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_normalizes_and_deduplicates() {
        let mut lists = Watchlists::default();
        assert!(lists.add(123, "Alice"));
        assert!(!lists.add(123, "ALICE"));
        assert_eq!(lists.names(123), vec!["alice".to_string()]);
    }

    #[test]
    fn names_keep_insertion_order() {
        let mut lists = Watchlists::default();
        lists.add(1, "carol");
        lists.add(1, "alice");
        lists.add(1, "bob");
        assert_eq!(lists.names(1), vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn remove_unknown_is_a_noop() {
        let mut lists = Watchlists::default();
        lists.add(1, "alice");
        assert!(!lists.remove(1, "bob"));
        assert!(!lists.remove(2, "alice"));
        assert_eq!(lists.names(1), vec!["alice"]);
    }

    #[test]
    fn remove_matches_case_insensitively() {
        let mut lists = Watchlists::default();
        lists.add(1, "alice");
        assert!(lists.remove(1, "Alice"));
        assert!(lists.names(1).is_empty());
    }

    #[test]
    fn status_renders_the_report_strings() {
        assert_eq!(AccountStatus::Active.to_string(), "ACTIVE");
        assert_eq!(AccountStatus::NotFound.to_string(), "BANNED / NOT FOUND");
        assert_eq!(AccountStatus::Suspended.to_string(), "BANNED / SUSPENDED");
        assert_eq!(
            AccountStatus::Error("timed out".into()).to_string(),
            "ERROR: timed out"
        );
    }

    #[test]
    fn watchlists_serialize_with_string_chat_keys() {
        let mut lists = Watchlists::default();
        lists.add(123, "alice");
        let json = serde_json::to_string(&lists).unwrap();
        assert_eq!(json, r#"{"123":["alice"]}"#);
        let back: Watchlists = serde_json::from_str(&json).unwrap();
        assert_eq!(back.names(123), vec!["alice"]);
    }
}
