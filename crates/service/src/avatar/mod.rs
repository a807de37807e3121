//! Custom shop images: where they are stored, whether one exists, and the
//! URL clients should load.

pub mod blob;
pub mod local;
pub mod http;
pub mod cache;
pub mod resolver;
pub mod service;

pub use blob::{avatar_key, BlobError, BlobObject, BlobStore};
pub use cache::ExistenceCache;
pub use resolver::AvatarResolver;
pub use service::AvatarService;
