//! Run configuration.
//!
//! Secrets and identifiers come from the environment (a `.env` file is read
//! first when present); generator settings come from an optional TOML file.

pub mod schema;

pub use schema::{
    Config, FieldProfile, GeneratorSettings, GistConfig, PanelConfig, SERVER_PLACEHOLDER,
};
