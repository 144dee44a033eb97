use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Runtime settings. Every field has a default, so an empty YAML document is
/// a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Protocol token written at the start of serialized status lines.
    pub protocol: String,
    /// Largest head the reader buffers before giving up on a stream.
    pub max_header_bytes: usize,
    /// Largest declared `Content-Length` the reader accepts.
    pub max_content_bytes: usize,
    /// Bytes requested from the stream per read.
    pub read_buffer_size: usize,
    /// Default `tracing` filter for the binary.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: "HTTP/1.1".to_string(),
            max_header_bytes: 64 * 1024,
            max_content_bytes: 16 * 1024 * 1024,
            read_buffer_size: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads the file named by `AIRWIRE_CONFIG` (defaults when unset), then
    /// applies `AIRWIRE_PROTOCOL` on top.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("AIRWIRE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        if let Ok(protocol) = std::env::var("AIRWIRE_PROTOCOL") {
            cfg.protocol = protocol;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes as null rather than an empty map.
        let cfg: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.protocol.is_empty() || self.protocol.contains(char::is_whitespace) {
            anyhow::bail!("protocol must be a single non-empty token, got {:?}", self.protocol);
        }
        if self.max_header_bytes == 0 {
            anyhow::bail!("max_header_bytes must be greater than zero");
        }
        if self.max_content_bytes == 0 {
            anyhow::bail!("max_content_bytes must be greater than zero");
        }
        if self.read_buffer_size == 0 {
            anyhow::bail!("read_buffer_size must be greater than zero");
        }
        Ok(())
    }
}
