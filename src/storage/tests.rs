use crate::core::config::AppConfig;
use crate::core::error::StorageError;
use crate::core::message::Sender;
use crate::storage::Database;

async fn test_db() -> (Database, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: tmp.path().to_path_buf(),
        ..Default::default()
    };
    let db = Database::open(&config).await.unwrap();
    db.run_migrations().await.unwrap();
    (db, tmp)
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (db, _tmp) = test_db().await;
    db.run_migrations().await.unwrap();
}

#[tokio::test]
async fn create_session_assigns_increasing_ids() {
    let (db, _tmp) = test_db().await;

    let a = db.sessions().create().await.unwrap();
    let b = db.sessions().create().await.unwrap();
    assert!(b.id > a.id);
}

#[tokio::test]
async fn last_session_on_empty_store_is_none() {
    let (db, _tmp) = test_db().await;
    assert!(db.sessions().get_last().await.unwrap().is_none());
}

#[tokio::test]
async fn last_session_is_most_recently_started() {
    let (db, _tmp) = test_db().await;

    db.sessions().create().await.unwrap();
    let newer = db.sessions().create().await.unwrap();

    let last = db.sessions().get_last().await.unwrap().unwrap();
    assert_eq!(last.id, newer.id);
}

#[tokio::test]
async fn messages_round_trip_in_order() {
    let (db, _tmp) = test_db().await;
    let session = db.sessions().create().await.unwrap();

    db.messages()
        .save(session.id, Sender::User, "Qual a cotação do dólar hoje?")
        .await
        .unwrap();
    db.messages()
        .save(session.id, Sender::Assistant, "R$5,20")
        .await
        .unwrap();
    db.messages()
        .save(session.id, Sender::User, "obrigado!")
        .await
        .unwrap();

    let messages = db.messages().list(session.id).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].text, "Qual a cotação do dólar hoje?");
    assert_eq!(messages[1].sender, Sender::Assistant);
    assert_eq!(messages[1].text, "R$5,20");
    assert_eq!(messages[2].text, "obrigado!");
    assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(messages.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn save_against_missing_session_fails_and_inserts_nothing() {
    let (db, _tmp) = test_db().await;

    let err = db
        .messages()
        .save(999, Sender::User, "órfã")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::SessionMissing(999)));

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn clear_leaves_session_and_other_sessions_alone() {
    let (db, _tmp) = test_db().await;
    let a = db.sessions().create().await.unwrap();
    let b = db.sessions().create().await.unwrap();

    db.messages().save(a.id, Sender::User, "a1").await.unwrap();
    db.messages().save(a.id, Sender::Assistant, "a2").await.unwrap();
    db.messages().save(b.id, Sender::User, "b1").await.unwrap();

    db.messages().clear(a.id).await.unwrap();

    assert!(db.messages().list(a.id).await.unwrap().is_empty());
    assert_eq!(db.messages().list(b.id).await.unwrap().len(), 1);
    // The cleared session row survives.
    assert_eq!(db.sessions().get(a.id).await.unwrap().id, a.id);
}

#[tokio::test]
async fn delete_session_cascades_to_messages() {
    let (db, _tmp) = test_db().await;
    let session = db.sessions().create().await.unwrap();
    db.messages()
        .save(session.id, Sender::User, "para apagar")
        .await
        .unwrap();

    db.sessions().delete(session.id).await.unwrap();

    assert!(db.messages().list(session.id).await.unwrap().is_empty());
    let err = db.sessions().get(session.id).await.unwrap_err();
    assert!(matches!(err, StorageError::SessionMissing(_)));
}

#[tokio::test]
async fn get_messages_for_unknown_session_is_empty() {
    let (db, _tmp) = test_db().await;
    assert!(db.messages().list(42).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_sessions_newest_first() {
    let (db, _tmp) = test_db().await;
    let a = db.sessions().create().await.unwrap();
    let b = db.sessions().create().await.unwrap();

    let all = db.sessions().list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, b.id);
    assert_eq!(all[1].id, a.id);
}
