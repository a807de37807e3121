pub mod errors;
pub mod db;
pub mod day_key;
pub mod user;
pub mod shop;
pub mod shop_date;

pub use day_key::DayKey;
pub use shop::ShopId;

#[cfg(test)]
mod tests;
