//! Panel configuration model and loading.

use std::net::SocketAddr;

use anyhow::Result;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "castpanel.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Base URL of the admin backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Preview URL offered to the cast picker.
    #[serde(default = "default_preview_url")]
    pub preview_url: String,
    /// Receiver the direct session path connects to.
    #[serde(default = "default_receiver_addr")]
    pub receiver_addr: SocketAddr,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_owned()
}

fn default_preview_url() -> String {
    "http://127.0.0.1:5000/preview".to_owned()
}

fn default_receiver_addr() -> SocketAddr {
    ([127, 0, 0, 1], 46899).into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            preview_url: default_preview_url(),
            receiver_addr: default_receiver_addr(),
        }
    }
}

impl Config {
    /// Read `castpanel.toml` from the working directory, then apply
    /// `CASTPANEL_*` environment overrides. A missing file means defaults.
    pub fn load() -> Result<Self> {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(raw) => toml::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };

        if let Ok(url) = std::env::var("CASTPANEL_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(url) = std::env::var("CASTPANEL_PREVIEW_URL") {
            config.preview_url = url;
        }
        if let Ok(addr) = std::env::var("CASTPANEL_RECEIVER_ADDR") {
            config.receiver_addr = addr.parse()?;
        }

        Ok(config)
    }
}
