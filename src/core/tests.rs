use std::path::PathBuf;

use chrono::Utc;

use super::config::AppConfig;
use super::message::{ChatMessage, HistoryEntry, Sender};

#[test]
fn sender_wire_names() {
    assert_eq!(Sender::User.as_str(), "user");
    assert_eq!(Sender::Assistant.as_str(), "assistant");
    assert_eq!(Sender::parse("user"), Some(Sender::User));
    assert_eq!(Sender::parse("assistant"), Some(Sender::Assistant));
    assert_eq!(Sender::parse("dk_chat"), None);
    assert_eq!(Sender::parse("USER"), None);
}

#[test]
fn sender_serde_round_trip() {
    let json = serde_json::to_string(&Sender::Assistant).unwrap();
    assert_eq!(json, "\"assistant\"");
    let back: Sender = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Sender::Assistant);
}

#[test]
fn history_entry_from_message() {
    let msg = ChatMessage {
        id: 7,
        session_id: 1,
        sender: Sender::Assistant,
        text: "olá!".into(),
        timestamp: Utc::now(),
    };
    let entry = HistoryEntry::from(&msg);
    assert_eq!(entry.sender, Sender::Assistant);
    assert_eq!(entry.text, "olá!");
}

#[test]
fn database_path_prefers_override() {
    let config = AppConfig {
        data_dir: PathBuf::from("/tmp/data"),
        db_path: Some(PathBuf::from("/tmp/custom.db")),
        ..Default::default()
    };
    assert_eq!(config.database_path(), PathBuf::from("/tmp/custom.db"));

    let config = AppConfig {
        data_dir: PathBuf::from("/tmp/data"),
        db_path: None,
        ..Default::default()
    };
    assert_eq!(config.database_path(), PathBuf::from("/tmp/data/history.db"));
}

#[test]
fn config_rejects_zero_timeout() {
    let config = AppConfig {
        search_timeout_secs: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());
    assert!(AppConfig::default().validate().is_ok());
}
