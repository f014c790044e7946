//! Status snapshots consumed by the tray.
//!
//! The VPN client's own state machine is opaque to this crate. Hosts hand the
//! tray a [`Status`] value whenever something changes; only the
//! [`Status::Ipn`] variant carries connectivity information the tray renders.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Read-only view over a connectivity snapshot.
pub trait StatusSnapshot {
    /// Whether the client is logged in and the tunnel is up.
    fn online(&self) -> bool;

    /// Whether traffic is currently routed through an exit node.
    fn exit_node_active(&self) -> bool;

    /// Address assigned to this machine, if it has a valid one.
    fn self_address(&self) -> Option<IpAddr>;

    /// Human-readable name of this machine.
    fn self_display_name(&self) -> &str;
}

/// Connectivity snapshot of the local node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnStatus {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub exit_node_active: bool,
    #[serde(default)]
    pub self_addr: Option<IpAddr>,
    #[serde(default)]
    pub self_display_name: String,
}

impl IpnStatus {
    /// Snapshot of a node that is offline and has no address.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Snapshot of an online node with the given name and address.
    pub fn connected(name: impl Into<String>, addr: IpAddr) -> Self {
        Self {
            online: true,
            exit_node_active: false,
            self_addr: Some(addr),
            self_display_name: name.into(),
        }
    }

    pub fn with_exit_node(mut self, active: bool) -> Self {
        self.exit_node_active = active;
        self
    }
}

impl StatusSnapshot for IpnStatus {
    fn online(&self) -> bool {
        self.online
    }

    fn exit_node_active(&self) -> bool {
        self.exit_node_active
    }

    fn self_address(&self) -> Option<IpAddr> {
        self.self_addr
    }

    fn self_display_name(&self) -> &str {
        &self.self_display_name
    }
}

/// Login profiles known to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStatus {
    #[serde(default)]
    pub current_profile: Option<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
}

/// Incoming files waiting to be accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    #[serde(default)]
    pub waiting_files: Vec<String>,
}

/// Any status update the host may publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    Ipn(IpnStatus),
    Profiles(ProfileStatus),
    Files(FileStatus),
}

impl Status {
    /// The connectivity snapshot, if this update carries one.
    pub fn as_ipn(&self) -> Option<&IpnStatus> {
        match self {
            Self::Ipn(status) => Some(status),
            _ => None,
        }
    }

    /// Short variant name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ipn(_) => "ipn",
            Self::Profiles(_) => "profiles",
            Self::Files(_) => "files",
        }
    }
}

impl From<IpnStatus> for Status {
    fn from(status: IpnStatus) -> Self {
        Self::Ipn(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn offline_snapshot_has_no_address() {
        let status = IpnStatus::offline();
        assert!(!status.online());
        assert!(!status.exit_node_active());
        assert_eq!(status.self_address(), None);
        assert_eq!(status.self_display_name(), "");
    }

    #[test]
    fn only_ipn_variant_exposes_snapshot() {
        let ipn = Status::from(IpnStatus::connected(
            "host",
            IpAddr::V4(Ipv4Addr::new(100, 1, 2, 3)),
        ));
        assert!(ipn.as_ipn().is_some());
        assert_eq!(ipn.kind(), "ipn");

        let files = Status::Files(FileStatus::default());
        assert!(files.as_ipn().is_none());
        assert_eq!(files.kind(), "files");
    }

    #[test]
    fn status_deserializes_from_tagged_json() {
        let raw = r#"{
            "kind": "ipn",
            "online": true,
            "exit_node_active": true,
            "self_addr": "100.64.0.7",
            "self_display_name": "laptop"
        }"#;

        let status: Status = serde_json::from_str(raw).expect("status should parse");
        let ipn = status.as_ipn().expect("ipn variant");
        assert!(ipn.online());
        assert!(ipn.exit_node_active());
        assert_eq!(
            ipn.self_address(),
            Some(IpAddr::V4(Ipv4Addr::new(100, 64, 0, 7)))
        );
        assert_eq!(ipn.self_display_name(), "laptop");
    }

    #[test]
    fn missing_fields_default_to_offline() {
        let status: Status =
            serde_json::from_str(r#"{"kind":"ipn"}"#).expect("status should parse");
        assert_eq!(status.as_ipn(), Some(&IpnStatus::offline()));
    }

    #[test]
    fn profile_status_parses() {
        let raw = r#"{"kind":"profiles","current_profile":"work","profiles":["work","home"]}"#;
        let status: Status = serde_json::from_str(raw).expect("status should parse");
        assert_eq!(
            status,
            Status::Profiles(ProfileStatus {
                current_profile: Some("work".to_string()),
                profiles: vec!["work".to_string(), "home".to_string()],
            })
        );
    }
}
