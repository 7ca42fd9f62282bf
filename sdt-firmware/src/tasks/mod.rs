//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod config;

pub use config::config_task;
