//! Reusable synchronization sessions over the graphsync engine.
//!
//! A [`Synchronizer`] pairs the identity tables, class registry, and
//! generation counter into one context, so a sequence of `write`/`recv`
//! calls accumulates incremental state: repeated rounds carry only what
//! changed, and the receiving side mutates its materialized instances in
//! place.

pub mod synchronizer;

pub use synchronizer::{SessionError, Synchronizer};
