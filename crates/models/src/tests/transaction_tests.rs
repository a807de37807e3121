use crate::db::connect_in_memory;
use crate::{shop, user};
use anyhow::Result;
use sea_orm::{EntityTrait, TransactionTrait};

/// Test basic transaction commit
#[tokio::test]
async fn test_transaction_commit() -> Result<()> {
    let db = connect_in_memory().await?;
    user::create(&db, "alice", "hash", 1).await?;

    let txn = db.begin().await?;
    let created = shop::create(&txn, "alice", "Committed").await?;
    txn.commit().await?;

    let found = shop::Entity::find_by_id(created.id).one(&db).await?;
    assert_eq!(found.map(|s| s.name), Some("Committed".to_string()));
    Ok(())
}

/// Test transaction rollback
#[tokio::test]
async fn test_transaction_rollback() -> Result<()> {
    let db = connect_in_memory().await?;
    user::create(&db, "alice", "hash", 1).await?;

    let txn = db.begin().await?;
    let created = shop::create(&txn, "alice", "Rolled Back").await?;
    txn.rollback().await?;

    assert!(shop::Entity::find_by_id(created.id).one(&db).await?.is_none());
    Ok(())
}
