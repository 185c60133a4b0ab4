//! Host identity
//!
//! Resolves the hostname, primary IPv4 address and, when running on EC2,
//! the instance metadata that goes into alert payloads.

use crate::config::HostConfig;
use serde::{Deserialize, Serialize};
use std::net::UdpSocket;
use std::time::Duration;

const METADATA_BASE: &str = "http://169.254.169.254/latest";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

/// Cloud instance details, all optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudInstance {
    pub instance_id: Option<String>,
    pub instance_name: Option<String>,
    pub instance_type: Option<String>,
    pub availability_zone: Option<String>,
    pub region: Option<String>,
}

impl CloudInstance {
    /// Whether any field was resolved
    pub fn is_empty(&self) -> bool {
        self.instance_id.is_none()
            && self.instance_name.is_none()
            && self.instance_type.is_none()
            && self.availability_zone.is_none()
    }
}

/// Identity of the monitored host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    pub hostname: String,
    pub ip_address: String,
    pub cloud: Option<CloudInstance>,
    /// Operator-chosen name that overrides the derived display name
    #[serde(skip)]
    pub display_name: Option<String>,
}

impl HostIdentity {
    /// Identity without any network lookups
    pub fn local(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip_address: "unknown".to_string(),
            cloud: None,
            display_name: None,
        }
    }

    /// Resolve the identity of the current machine
    pub fn resolve(config: &HostConfig) -> Self {
        let hostname = local_hostname();
        let ip_address = primary_ip().unwrap_or_else(|| "unknown".to_string());

        let cloud = if config.cloud_metadata {
            let timeout = Duration::from_secs(config.metadata_timeout_secs);
            let instance = fetch_ec2_metadata(timeout);
            if instance.is_empty() {
                log::debug!("No EC2 instance metadata available");
                None
            } else {
                log::debug!("Resolved EC2 instance metadata: {:?}", instance);
                Some(instance)
            }
        } else {
            None
        };

        Self {
            hostname,
            ip_address,
            cloud,
            display_name: config.display_name.clone(),
        }
    }

    /// Name used in alert messages
    pub fn display(&self) -> String {
        if let Some(name) = &self.display_name {
            return name.clone();
        }

        let cloud = self.cloud.as_ref();
        if let Some(name) = cloud.and_then(|c| c.instance_name.as_ref()) {
            format!("{} ({})", name, self.hostname)
        } else if let Some(id) = cloud.and_then(|c| c.instance_id.as_ref()) {
            format!("{} ({})", self.hostname, id)
        } else {
            self.hostname.clone()
        }
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".into())
}

/// Address of the interface that routes to the public internet
///
/// Connecting a UDP socket only selects a route; nothing is sent.
fn primary_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

/// Query the EC2 instance metadata service
///
/// Uses an IMDSv2 session token when one can be obtained and falls back to
/// unauthenticated IMDSv1 requests otherwise. Every failure just leaves the
/// corresponding field empty.
fn fetch_ec2_metadata(timeout: Duration) -> CloudInstance {
    let client = match reqwest::blocking::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::debug!("Failed to build metadata client: {}", e);
            return CloudInstance::default();
        }
    };

    let token = client
        .put(format!("{}/api/token", METADATA_BASE))
        .header(TOKEN_TTL_HEADER, "21600")
        .send()
        .ok()
        .filter(|r| r.status().is_success())
        .and_then(|r| r.text().ok());

    let get = |path: &str| -> Option<String> {
        let mut request = client.get(format!("{}/meta-data/{}", METADATA_BASE, path));
        if let Some(token) = &token {
            request = request.header(TOKEN_HEADER, token);
        }
        let response = request.send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        response
            .text()
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let instance_id = get("instance-id");
    if instance_id.is_none() {
        // Not on EC2, or the metadata service is unreachable
        return CloudInstance::default();
    }

    let availability_zone = get("placement/availability-zone");
    CloudInstance {
        instance_type: get("instance-type"),
        // Only present when instance metadata tags are enabled
        instance_name: get("tags/instance/Name"),
        region: availability_zone.as_deref().and_then(region_from_zone),
        availability_zone,
        instance_id,
    }
}

/// `us-east-1a` -> `us-east-1`
fn region_from_zone(zone: &str) -> Option<String> {
    let region = zone.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if region.is_empty() || region == zone {
        None
    } else {
        Some(region.to_string())
    }
}
