//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "0.0.0.0"       # Network interface (0.0.0.0 = LAN accessible)
//! port = 9001                 # HTTP port number
//! watch = true                # Rebuild on file changes
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

/// Development server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,
    pub port: u16,
    /// Rebuild when sources or `kiln.toml` change.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 9001,
            watch: true,
        }
    }
}
