//! Domain layer types and invariants.

pub mod error;
pub mod feed;

pub use error::DomainError;
pub use feed::{FeedItem, FeedSnapshot, ResourceId};
