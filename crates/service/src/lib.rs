pub mod errors;
pub mod auth;
pub mod avatar;
pub mod ledger;
#[cfg(test)]
pub mod test_support;
