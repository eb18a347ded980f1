//! Inbound client → Clash proxy mapping.
//!
//! Field order:
//! ```text
//! name, type, server, port, udp, uuid
//! flow                      (per profile)
//! packet-encoding
//! tls, servername, ...      (per security mode)
//! encryption
//! network
//! ```
//!
//! Reality proxies carry `skip-cert-verify: true`. Reality servers present
//! a borrowed or ephemeral certificate, so the client authenticates the
//! server through `reality-opts.public-key` instead of the certificate
//! chain. Anyone consuming the generated files should know that standard
//! certificate verification is disabled for these entries.

use serde_yaml::Value;

use super::descriptor::{mapping, ProxyDescriptor};
use crate::config::{Config, FieldProfile};
use crate::panel::{Client, GeneralSettings, Inbound, SecurityMode, StreamSettings};

/// Fixed flow for the `reality-vision` profile.
pub const VISION_FLOW: &str = "xtls-rprx-vision";

const PACKET_ENCODING: &str = "xudp";
const REALITY_ALPN: [&str; 2] = ["h2", "http/1.1"];
const DEFAULT_FINGERPRINT: &str = "chrome";

/// Build-time options that do not come from the panel.
#[derive(Debug, Clone)]
pub struct BuildOptions<'a> {
    pub server: &'a str,
    pub profile: FieldProfile,
    pub supported_protocols: &'a [String],
}

impl<'a> BuildOptions<'a> {
    pub fn from_config(config: &'a Config) -> Self {
        Self {
            server: config.server_address(),
            profile: config.generator.profile,
            supported_protocols: &config.generator.supported_protocols,
        }
    }
}

/// Build the proxy for one client.
///
/// Returns `None` when the inbound protocol is unsupported or the client has
/// no usable `(email, id)` identity.
pub fn build_client_proxy(
    client: &Client,
    inbound: &Inbound,
    stream: &StreamSettings,
    general: &GeneralSettings,
    options: &BuildOptions<'_>,
) -> Option<ProxyDescriptor> {
    if !options
        .supported_protocols
        .iter()
        .any(|p| *p == inbound.protocol)
    {
        return None;
    }
    let (_, uuid) = client.identity()?;
    let security = stream.security_mode();

    let mut proxy = ProxyDescriptor::new()
        .with("name", inbound.remark.as_str())
        .with("type", inbound.protocol.as_str())
        .with("server", options.server)
        .with("port", inbound.port)
        .with("udp", true)
        .with("uuid", uuid);

    if let Some(flow) = flow_for(client, security, options.profile) {
        proxy.push("flow", flow);
    }

    proxy.push("packet-encoding", PACKET_ENCODING);

    match security {
        SecurityMode::None => {}
        SecurityMode::Tls => {
            proxy.push("tls", true);
            proxy.push(
                "servername",
                first_or_empty(&stream.tls_settings.server_names),
            );
        }
        SecurityMode::Reality => {
            let reality = &stream.reality_settings;
            proxy.push("tls", true);
            proxy.push("servername", first_or_empty(&reality.server_names));
            proxy.push("alpn", REALITY_ALPN.to_vec());
            proxy.push(
                "client-fingerprint",
                reality
                    .settings
                    .fingerprint
                    .as_deref()
                    .filter(|f| !f.is_empty())
                    .unwrap_or(DEFAULT_FINGERPRINT),
            );
            proxy.push("skip-cert-verify", true);
            proxy.push(
                "reality-opts",
                mapping([
                    (
                        "public-key",
                        Value::from(reality.settings.public_key.as_str()),
                    ),
                    ("short-id", Value::from(first_or_empty(&reality.short_ids))),
                ]),
            );
        }
    }

    proxy.push("encryption", general.encryption.as_str());
    proxy.push("network", stream.network());

    Some(proxy)
}

fn flow_for<'c>(client: &'c Client, security: SecurityMode, profile: FieldProfile) -> Option<&'c str> {
    match profile {
        FieldProfile::ClientFlow => client.flow(),
        FieldProfile::RealityVision => {
            (security == SecurityMode::Reality).then_some(VISION_FLOW)
        }
    }
}

fn first_or_empty(values: &[String]) -> &str {
    values.first().map(String::as_str).unwrap_or("")
}
