//! Clash proxy entries: the ordered descriptor type and the builder that
//! derives one per panel client.

pub mod builder;
pub mod descriptor;

pub use builder::{build_client_proxy, BuildOptions, VISION_FLOW};
pub use descriptor::ProxyDescriptor;
