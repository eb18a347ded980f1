//! Sync 3x-ui inbound clients into per-client Clash configs and publish them
//! to a GitHub Gist.
//!
//! ```text
//! PanelSession::login → fetch_inbound → parse_settings
//!   → build_client_proxy (per client) + extra servers
//!   → Renderer::render → strip_comments
//!   → build_index → GistPublisher::publish
//! ```

pub mod config;
pub mod error;
pub mod extra_servers;
pub mod gist;
pub mod panel;
pub mod proxy;
pub mod render;
pub mod sync;

pub use config::{Config, FieldProfile, GeneratorSettings};
pub use error::{Result, SyncError};
pub use sync::{run, SyncReport, UploadOutcome};
