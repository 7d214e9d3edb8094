//! Short-lived in-memory cache for fetched data
//!
//! This module provides a TTL cache keyed by an opaque request descriptor.
//! Lookups only ever return unexpired values; `get_or_fetch` reads through to
//! a caller-supplied fetch on a miss and stores the result only when the
//! fetch succeeds. Time comes from an injectable clock.

mod clock;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{CacheError, CacheStats, TtlCache};
