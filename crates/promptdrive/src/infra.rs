//! Infrastructure adapters for the external version-control tool and the
//! configuration store.

/// Layered key/value configuration backed by a JSON settings file.
pub mod config;
pub mod git;
