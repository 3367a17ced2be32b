//! Pure drive types shared by the app and infrastructure layers.

pub mod entry;
pub mod path;
pub mod settings;
