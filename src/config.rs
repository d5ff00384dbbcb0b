//! # config — server settings from environment variables
//!
//! | Variable               | Default        | Description                         |
//! |------------------------|----------------|-------------------------------------|
//! | `BIND_ADDR`            | `0.0.0.0:8000` | Address Axum listens on             |
//! | `PROJECTION_DATA_PATH` | unset          | JSON file to serve instead of mock  |
//! | `RUST_LOG`             | `numin_mock=debug` | Tracing filter                  |

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub projection_data_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address, e.g. 0.0.0.0:8000")?;

        let projection_data_path = std::env::var("PROJECTION_DATA_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            projection_data_path,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            projection_data_path: None,
        }
    }
}
