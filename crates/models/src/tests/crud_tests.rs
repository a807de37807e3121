use crate::db::connect_in_memory;
use crate::{shop, shop_date, user};
use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

/// Test user create and lookup
#[tokio::test]
async fn test_user_crud() -> Result<()> {
    let db = connect_in_memory().await?;

    let created = user::create(&db, "  Alice ", "hash", 1_700_000_000).await?;
    assert_eq!(created.username, "alice");
    assert_eq!(created.created_at, 1_700_000_000);

    // lookups normalize the same way inserts do
    let found = user::find(&db, "ALICE").await?;
    assert_eq!(found.map(|u| u.username), Some("alice".to_string()));

    assert!(user::find(&db, "bob").await?.is_none());
    Ok(())
}

/// Duplicate usernames violate the primary key
#[tokio::test]
async fn test_user_duplicate_rejected() -> Result<()> {
    let db = connect_in_memory().await?;
    user::create(&db, "alice", "hash", 1).await?;
    let dup = user::create(&db, "Alice", "other", 2).await;
    assert!(matches!(dup, Err(crate::errors::ModelError::Db(_))));
    Ok(())
}

/// Invalid usernames never reach the database
#[tokio::test]
async fn test_user_validation() -> Result<()> {
    let db = connect_in_memory().await?;
    let res = user::create(&db, "ab", "hash", 1).await;
    assert!(matches!(res, Err(crate::errors::ModelError::Validation(_))));
    Ok(())
}

/// Test shop create, read and delete
#[tokio::test]
async fn test_shop_crud() -> Result<()> {
    let db = connect_in_memory().await?;
    user::create(&db, "alice", "hash", 1).await?;

    let a = shop::create(&db, "alice", "Boba House").await?;
    let b = shop::create(&db, "alice", "Tea Lab").await?;
    assert_eq!(a.total, 0);
    assert_ne!(a.id, b.id);

    let owned = shop::Entity::find()
        .filter(shop::Column::Username.eq("alice"))
        .all(&db)
        .await?;
    assert_eq!(owned.len(), 2);

    shop::Entity::delete_by_id(a.id).exec(&db).await?;
    assert!(shop::Entity::find_by_id(a.id).one(&db).await?.is_none());
    assert!(shop::Entity::find_by_id(b.id).one(&db).await?.is_some());
    Ok(())
}

/// Day buckets are keyed by (shop_id, date_key)
#[tokio::test]
async fn test_shop_date_composite_key() -> Result<()> {
    let db = connect_in_memory().await?;
    user::create(&db, "alice", "hash", 1).await?;
    let s = shop::create(&db, "alice", "Boba House").await?;

    shop_date::ActiveModel { shop_id: Set(s.id), date_key: Set(86_400), count: Set(2) }
        .insert(&db)
        .await?;
    shop_date::ActiveModel { shop_id: Set(s.id), date_key: Set(172_800), count: Set(1) }
        .insert(&db)
        .await?;

    let found = shop_date::Entity::find_by_id((s.id, 86_400)).one(&db).await?;
    assert_eq!(found.map(|d| d.count), Some(2));

    let dup = shop_date::ActiveModel { shop_id: Set(s.id), date_key: Set(86_400), count: Set(1) }
        .insert(&db)
        .await;
    assert!(dup.is_err());
    Ok(())
}
