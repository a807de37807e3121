use std::sync::Arc;

use common::clock::Clock;
use futures::future::join_all;
use models::{shop, user, DayKey, ShopId};
use tracing::{info, instrument};

use super::domain::{PublicUser, ShopRecord, ShopView, UndoOutcome};
use super::repository::LedgerRepository;
use crate::avatar::AvatarResolver;
use crate::errors::ServiceError;

/// Shop lifecycle and count mutation.
///
/// Holds no locks of its own: every mutation is a single atomic unit in the
/// repository and each returns a freshly materialized view. Usernames are
/// normalized on entry, the same way they are stored.
pub struct LedgerService<R: LedgerRepository> {
    repo: Arc<R>,
    avatars: Arc<AvatarResolver>,
    clock: Arc<dyn Clock>,
}

impl<R: LedgerRepository> LedgerService<R> {
    pub fn new(repo: Arc<R>, avatars: Arc<AvatarResolver>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, avatars, clock }
    }

    /// Bucket that mutations made right now land in.
    pub fn today(&self) -> DayKey {
        DayKey::from_datetime(self.clock.now())
    }

    #[instrument(skip(self))]
    pub async fn add_shop(&self, username: &str, name: &str) -> Result<ShopView, ServiceError> {
        let username = user::normalize_username(username);
        let name = shop::validate_name(name)?;
        let record = self.repo.insert_shop(&username, &name).await?;
        info!(shop_id = record.id, %username, "shop_created");
        Ok(self.materialize(record).await)
    }

    #[instrument(skip(self))]
    pub async fn increment_shop(&self, username: &str, shop_id: ShopId) -> Result<ShopView, ServiceError> {
        let username = user::normalize_username(username);
        let day = self.today();
        if !self.repo.increment(&username, shop_id, day).await? {
            return Err(ServiceError::not_found("shop"));
        }
        info!(shop_id, %username, day = %day, "shop_incremented");
        self.get_shop_as_public(shop_id).await
    }

    /// Take back one of today's events. Saturates: with a zero total or
    /// nothing logged today the shop comes back unchanged.
    #[instrument(skip(self))]
    pub async fn undo_shop_increment(&self, username: &str, shop_id: ShopId) -> Result<ShopView, ServiceError> {
        let username = user::normalize_username(username);
        let day = self.today();
        match self.repo.undo(&username, shop_id, day).await? {
            UndoOutcome::NotFound => return Err(ServiceError::not_found("shop")),
            UndoOutcome::NoOp => info!(shop_id, %username, day = %day, "shop_undo_noop"),
            UndoOutcome::Undone => info!(shop_id, %username, day = %day, "shop_undone"),
        }
        self.get_shop_as_public(shop_id).await
    }

    /// `false` when nothing was removed. The avatar blob is left to the caller.
    #[instrument(skip(self))]
    pub async fn delete_shop(&self, username: &str, shop_id: ShopId) -> Result<bool, ServiceError> {
        let username = user::normalize_username(username);
        let removed = self.repo.delete_shop(&username, shop_id).await?;
        if removed {
            info!(shop_id, %username, "shop_deleted");
        }
        Ok(removed)
    }

    pub async fn owns_shop(&self, username: &str, shop_id: ShopId) -> Result<bool, ServiceError> {
        self.repo.is_owner(&user::normalize_username(username), shop_id).await
    }

    pub async fn get_shop_as_public(&self, shop_id: ShopId) -> Result<ShopView, ServiceError> {
        let record = self
            .repo
            .load_shop(shop_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("shop"))?;
        Ok(self.materialize(record).await)
    }

    /// All of a user's shops, avatars resolved concurrently.
    pub async fn get_public_user(&self, username: &str) -> Result<PublicUser, ServiceError> {
        let user = self
            .repo
            .load_user(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        let shops = join_all(user.shops.into_iter().map(|s| self.materialize(s))).await;
        Ok(PublicUser { username: user.username, created_at: user.created_at, shops })
    }

    async fn materialize(&self, record: ShopRecord) -> ShopView {
        let avatar_url = self.avatars.resolve(record.id).await;
        ShopView::new(record, avatar_url)
    }
}
