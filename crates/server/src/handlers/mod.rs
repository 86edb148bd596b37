//! HTTP handlers

pub mod tasks;

pub use tasks::{get_tasks, put_tasks};
