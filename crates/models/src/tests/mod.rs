/// CRUD operations tests for all models
pub mod crud_tests;

/// Transaction handling and constraint tests
pub mod transaction_tests;
