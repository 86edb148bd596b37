//! Task document storage
//!
//! Durable local persistence for the single task document. The local copy is
//! the source of truth whenever the remotes are absent or unreachable.

pub mod local;

pub use local::LocalTaskStore;
