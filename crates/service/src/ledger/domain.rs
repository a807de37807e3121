use std::collections::BTreeMap;

use models::{shop, shop_date, user, DayKey, ShopId};
use serde::Serialize;

/// Day key → count. Only non-zero buckets are ever present.
pub type DayCounts = BTreeMap<DayKey, i64>;

/// Shop as stored: counters and day buckets, no avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopRecord {
    pub id: ShopId,
    pub name: String,
    pub total: i64,
    pub dates: DayCounts,
}

impl ShopRecord {
    pub fn from_parts(shop: shop::Model, buckets: Vec<shop_date::Model>) -> Self {
        let dates = buckets
            .into_iter()
            .map(|b| (DayKey::from_secs(b.date_key), b.count))
            .collect();
        Self { id: shop.id, name: shop.name, total: shop.total, dates }
    }

    pub fn bucket_sum(&self) -> i64 {
        self.dates.values().sum()
    }
}

/// Owner plus all of their shops.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub created_at: i64,
    pub shops: Vec<ShopRecord>,
}

impl UserRecord {
    pub fn new(user: user::Model, shops: Vec<ShopRecord>) -> Self {
        Self { username: user.username, created_at: user.created_at, shops }
    }
}

/// Materialized shop view returned to callers. Derived on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopView {
    pub id: ShopId,
    pub name: String,
    pub total: i64,
    pub dates: DayCounts,
    #[serde(rename = "avatar")]
    pub avatar_url: Option<String>,
}

impl ShopView {
    pub fn new(record: ShopRecord, avatar_url: Option<String>) -> Self {
        Self { id: record.id, name: record.name, total: record.total, dates: record.dates, avatar_url }
    }

    pub fn count_on(&self, day: DayKey) -> i64 {
        self.dates.get(&day).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub created_at: i64,
    pub shops: Vec<ShopView>,
}

/// What a conditional undo did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Undone,
    /// Total already zero, or nothing logged today.
    NoOp,
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_serializes_dates_keyed_by_midnight() {
        let record = ShopRecord::from_parts(
            shop::Model { id: 1, username: "alice".into(), name: "Boba House".into(), total: 3 },
            vec![
                shop_date::Model { shop_id: 1, date_key: 172_800, count: 1 },
                shop_date::Model { shop_id: 1, date_key: 86_400, count: 2 },
            ],
        );
        assert_eq!(record.bucket_sum(), 3);

        let view = ShopView::new(record, None);
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["total"], 3);
        assert_eq!(v["dates"]["86400"], 2);
        assert_eq!(v["dates"]["172800"], 1);
        assert!(v["avatar"].is_null());
    }
}
