//! Drive orchestration: settings, the tree aggregator, host events, and
//! write operations.

pub mod command;
pub mod drive;
pub mod event;
pub mod settings;
pub mod workspace;
