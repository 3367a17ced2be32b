//! Prompt Drive: one tree over the user, repository, and workspace prompt
//! folders.
//!
//! The [`app::drive::PromptDrive`] aggregator decides which roots are
//! visible, lists their `.prompt` files on demand, and signals subscribers
//! when the tree needs a redraw. External collaborators (git, the
//! configuration store) sit behind traits in [`infra`].

pub mod app;
pub mod domain;
pub mod infra;

pub use app::drive::PromptDrive;
pub use app::settings::SettingsStore;
pub use domain::entry::{Entry, EntryKind, RootKind};
pub use domain::settings::Settings;
