use async_trait::async_trait;
use models::{DayKey, ShopId};

use super::domain::{ShopRecord, UndoOutcome, UserRecord};
use crate::errors::ServiceError;

/// Persistence for the ledger. Every mutation is one atomic unit of work and
/// is scoped to `(shop_id, username)`.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn insert_shop(&self, username: &str, name: &str) -> Result<ShopRecord, ServiceError>;

    /// `total += 1` and today's bucket `+= 1`, together or not at all.
    /// `false` when the shop is absent or owned by someone else.
    async fn increment(&self, username: &str, shop_id: ShopId, day: DayKey) -> Result<bool, ServiceError>;

    /// `total -= 1` and today's bucket `-= 1` (deleted at zero), guarded so
    /// neither can go negative.
    async fn undo(&self, username: &str, shop_id: ShopId, day: DayKey) -> Result<UndoOutcome, ServiceError>;

    async fn delete_shop(&self, username: &str, shop_id: ShopId) -> Result<bool, ServiceError>;

    async fn is_owner(&self, username: &str, shop_id: ShopId) -> Result<bool, ServiceError>;

    async fn load_shop(&self, shop_id: ShopId) -> Result<Option<ShopRecord>, ServiceError>;

    async fn load_user(&self, username: &str) -> Result<Option<UserRecord>, ServiceError>;
}
