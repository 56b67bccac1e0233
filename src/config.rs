use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Process configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interface both listeners bind to
    pub bind_address: String,
    /// Plaintext HTTP port
    pub port: u16,
    /// HTTPS port, only bound when `tls` is present
    pub ssl_port: u16,
    /// Directory request paths are resolved against
    pub doc_root: PathBuf,
    /// Maximum number of connections served at once, across both listeners
    pub max_threads: usize,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    /// How long in-flight connections may run after a shutdown signal
    pub shutdown_grace_secs: u64,
    pub log_level: String,
    pub tls: Option<TlsConfig>,
}

/// PEM files for the HTTPS listener.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            ssl_port: 8443,
            doc_root: PathBuf::from("./public"),
            max_threads: 64,
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            shutdown_grace_secs: 5,
            log_level: "info".to_string(),
            tls: None,
        }
    }
}

impl Config {
    /// Reads and validates a YAML config file, then applies `KEEL_*`
    /// environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let mut cfg = Self::from_yaml(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        cfg.apply_env_from(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a YAML document. Missing fields keep their defaults.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_from(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overrides fields from a key lookup (normally the process environment).
    pub fn apply_env_from<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("KEEL_BIND") {
            self.bind_address = addr;
        }
        if let Some(port) = lookup("KEEL_PORT") {
            self.port = port.parse().with_context(|| format!("KEEL_PORT={port}"))?;
        }
        if let Some(port) = lookup("KEEL_SSL_PORT") {
            self.ssl_port = port
                .parse()
                .with_context(|| format!("KEEL_SSL_PORT={port}"))?;
        }
        if let Some(root) = lookup("KEEL_DOC_ROOT") {
            self.doc_root = PathBuf::from(root);
        }
        if let Some(n) = lookup("KEEL_MAX_THREADS") {
            self.max_threads = n
                .parse()
                .with_context(|| format!("KEEL_MAX_THREADS={n}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            bail!("port must be between 1 and 65535");
        }
        if self.tls.is_some() && self.ssl_port == 0 {
            bail!("ssl_port must be between 1 and 65535");
        }
        if self.tls.is_some() && self.ssl_port == self.port {
            bail!("port and ssl_port must differ");
        }
        if self.doc_root.as_os_str().is_empty() {
            bail!("doc_root is empty");
        }
        if self.max_threads == 0 {
            bail!("max_threads must be at least 1");
        }
        self.max_log_level()?;
        Ok(())
    }

    /// `log_level` as a `tracing` level. Case-insensitive.
    pub fn max_log_level(&self) -> anyhow::Result<tracing::Level> {
        match self.log_level.parse() {
            Ok(level) => Ok(level),
            Err(_) => bail!(
                "log_level `{}` is not one of trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn https_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.ssl_port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
