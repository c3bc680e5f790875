//! Background Tasks Module
//!
//! # Tasks
//! - Purge: Drops expired cache entries at a configured interval

mod purge;

pub use purge::spawn_purge_task;
