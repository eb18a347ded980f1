//! Inbound records and the JSON blobs embedded in them.
//!
//! The panel returns `streamSettings` and `settings` as JSON-encoded strings
//! inside the JSON list response, so they are decoded in a second pass.

use serde::Deserialize;

use crate::error::{Result, SyncError};

/// One inbound as returned by `/panel/api/inbounds/list`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    pub id: i64,
    pub protocol: String,
    pub port: u16,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub stream_settings: String,
    #[serde(default)]
    pub settings: String,
}

/// Transport security of an inbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    None,
    Tls,
    Reality,
}

impl SecurityMode {
    /// Unknown values fall through to `None` rather than failing the run.
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("tls") => Self::Tls,
            Some("reality") => Self::Reality,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub security: Option<String>,
    #[serde(default)]
    pub reality_settings: RealitySettings,
    #[serde(default)]
    pub tls_settings: TlsSettings,
}

impl StreamSettings {
    pub fn network(&self) -> &str {
        self.network.as_deref().unwrap_or("tcp")
    }

    pub fn security_mode(&self) -> SecurityMode {
        SecurityMode::parse(self.security.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealitySettings {
    #[serde(default)]
    pub server_names: Vec<String>,
    #[serde(default)]
    pub short_ids: Vec<String>,
    #[serde(default)]
    pub settings: RealityKeyMaterial,
}

/// Client-facing half of the reality key pair.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealityKeyMaterial {
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSettings {
    #[serde(default)]
    pub server_names: Vec<String>,
}

/// The decoded `settings` blob.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneralSettings {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub encryption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Client {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub flow: Option<String>,
}

impl Client {
    /// `(email, id)` when both are present and non-empty.
    pub fn identity(&self) -> Option<(&str, &str)> {
        let email = self.email.as_deref().filter(|s| !s.is_empty())?;
        let id = self.id.as_deref().filter(|s| !s.is_empty())?;
        Some((email, id))
    }

    pub fn flow(&self) -> Option<&str> {
        self.flow.as_deref().filter(|s| !s.is_empty())
    }
}

/// Decode both embedded blobs. Either one being malformed fails the run.
pub fn parse_settings(inbound: &Inbound) -> Result<(StreamSettings, GeneralSettings)> {
    let stream: StreamSettings =
        serde_json::from_str(&inbound.stream_settings).map_err(|e| SyncError::Parse {
            field: "streamSettings",
            reason: e.to_string(),
        })?;
    let general: GeneralSettings =
        serde_json::from_str(&inbound.settings).map_err(|e| SyncError::Parse {
            field: "settings",
            reason: e.to_string(),
        })?;
    Ok((stream, general))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(stream: &str, settings: &str) -> Inbound {
        Inbound {
            id: 1,
            protocol: "vless".into(),
            port: 443,
            remark: "edge".into(),
            stream_settings: stream.into(),
            settings: settings.into(),
        }
    }

    #[test]
    fn parses_reality_inbound() {
        let stream = r#"{
            "network": "tcp",
            "security": "reality",
            "realitySettings": {
                "show": false,
                "dest": "sni.example:443",
                "serverNames": ["sni.example", "alt.example"],
                "shortIds": ["ab12", "cd34"],
                "settings": {"publicKey": "PKEY", "fingerprint": "firefox"}
            }
        }"#;
        let settings = r#"{
            "clients": [{"id": "uuid-1", "email": "alice", "flow": "xtls-rprx-vision", "enable": true}],
            "decryption": "none"
        }"#;
        let (stream, general) = parse_settings(&inbound(stream, settings)).unwrap();

        assert_eq!(stream.security_mode(), SecurityMode::Reality);
        assert_eq!(stream.reality_settings.server_names[0], "sni.example");
        assert_eq!(stream.reality_settings.short_ids[0], "ab12");
        assert_eq!(stream.reality_settings.settings.public_key, "PKEY");
        assert_eq!(
            stream.reality_settings.settings.fingerprint.as_deref(),
            Some("firefox")
        );
        assert_eq!(general.clients.len(), 1);
        assert_eq!(general.clients[0].identity(), Some(("alice", "uuid-1")));
        assert_eq!(general.clients[0].flow(), Some("xtls-rprx-vision"));
        assert_eq!(general.encryption, "");
    }

    #[test]
    fn network_defaults_to_tcp() {
        let (stream, _) = parse_settings(&inbound("{}", "{}")).unwrap();
        assert_eq!(stream.network(), "tcp");
        assert_eq!(stream.security_mode(), SecurityMode::None);
    }

    #[test]
    fn unknown_security_is_none() {
        let (stream, _) = parse_settings(&inbound(r#"{"security": "xtls"}"#, "{}")).unwrap();
        assert_eq!(stream.security_mode(), SecurityMode::None);
    }

    #[test]
    fn missing_clients_is_empty_list() {
        let (_, general) = parse_settings(&inbound("{}", r#"{"decryption": "none"}"#)).unwrap();
        assert!(general.clients.is_empty());
    }

    #[test]
    fn malformed_stream_settings_names_field() {
        let err = parse_settings(&inbound("{not json", "{}")).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Parse {
                field: "streamSettings",
                ..
            }
        ));
    }

    #[test]
    fn malformed_settings_names_field() {
        let err = parse_settings(&inbound("{}", "")).unwrap_err();
        assert!(matches!(err, SyncError::Parse { field: "settings", .. }));
    }

    #[test]
    fn identity_requires_email_and_id() {
        let missing_email = Client {
            id: Some("uuid".into()),
            ..Default::default()
        };
        let empty_id = Client {
            id: Some(String::new()),
            email: Some("bob".into()),
            flow: None,
        };
        assert!(missing_email.identity().is_none());
        assert!(empty_id.identity().is_none());
    }

    #[test]
    fn inbound_deserializes_from_panel_json() {
        let raw = r#"{
            "id": 4, "up": 0, "down": 0, "remark": "NL", "enable": true,
            "port": 8443, "protocol": "vless",
            "settings": "{\"clients\":[]}",
            "streamSettings": "{\"network\":\"grpc\"}",
            "tag": "inbound-8443"
        }"#;
        let inbound: Inbound = serde_json::from_str(raw).unwrap();
        assert_eq!(inbound.id, 4);
        assert_eq!(inbound.port, 8443);
        assert_eq!(inbound.remark, "NL");
        let (stream, _) = parse_settings(&inbound).unwrap();
        assert_eq!(stream.network(), "grpc");
    }
}
