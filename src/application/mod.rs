//! Application services: the feed read path and invalidation.

pub mod error;
pub mod feed;
pub mod fetcher;
pub mod invalidation;
pub mod pagination;
pub mod webhook;
