//! # Cache Module
//!
//! Generic key/value cache used for checksum maps and parsed-entity
//! memoization.
//!
//! ## Overview
//!
//! - Typed cache keys (entity kind + id) so keys can never collide across
//!   entity kinds
//! - `CacheService` trait with checksum-scoped gets: a stored value is only
//!   returned while its associated checksum still matches
//! - `MemoryCache`, an in-process LRU implementation suitable for tests and
//!   single-process deployments; hosts may substitute a persistent service

pub mod error;
pub mod key;
pub mod service;

pub use error::{CacheError, Result};
pub use key::CacheKey;
pub use service::{CacheService, CacheServiceExt, MemoryCache, TRACK_CACHE_TTL};
