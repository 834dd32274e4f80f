//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! server listening on `0.0.0.0:3185`.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use crate::error::{NetpadError, Result};

/// Longest device name the uinput facility accepts (`UINPUT_MAX_NAME_SIZE` minus NUL)
pub const MAX_DEVICE_NAME_LEN: usize = 79;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Network listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_listen_backlog")]
    pub listen_backlog: u32,

    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// Identity of every emulated device
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_device_name")]
    pub name: String,

    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,

    #[serde(default = "default_product_id")]
    pub product_id: u16,

    #[serde(default = "default_device_version")]
    pub version: u16,
}

// Default value functions
fn default_port() -> u16 { 3185 }
fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_listen_backlog() -> u32 { 32 }
fn default_read_buffer_size() -> usize { 1024 }

fn default_device_name() -> String { "Ethernet Gamepad".to_string() }
fn default_vendor_id() -> u16 { 0x0569 }
fn default_product_id() -> u16 { 0x0318 }
fn default_device_version() -> u16 { 1 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            listen_backlog: default_listen_backlog(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            version: default_device_version(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use netpad::config::Config;
    ///
    /// let config = Config::load("netpad.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Socket address the server listens on
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.server.bind_address.parse().map_err(|_| {
            invalid(format!("bind_address '{}' is not an IP address", self.server.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if self.server.listen_backlog == 0 || self.server.listen_backlog > 4096 {
            return Err(invalid("listen_backlog must be between 1 and 4096"));
        }

        if self.server.read_buffer_size == 0 || self.server.read_buffer_size > 65536 {
            return Err(invalid("read_buffer_size must be between 1 and 65536"));
        }

        if self.device.name.is_empty() {
            return Err(invalid("device name cannot be empty"));
        }

        if self.device.name.len() > MAX_DEVICE_NAME_LEN {
            return Err(invalid(format!(
                "device name must be at most {} bytes",
                MAX_DEVICE_NAME_LEN
            )));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> NetpadError {
    NetpadError::Config(toml::de::Error::custom(msg))
}
