//! Panel access: login, inbound lookup, and decoding of the inbound's
//! embedded settings.

pub mod client;
pub mod inbound;

pub use client::PanelSession;
pub use inbound::{
    parse_settings, Client, GeneralSettings, Inbound, RealityKeyMaterial, RealitySettings,
    SecurityMode, StreamSettings, TlsSettings,
};
