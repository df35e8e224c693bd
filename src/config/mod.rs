//! Configuration loaded from `.bluejay.toml`.

pub mod settings;

pub use settings::Settings;
