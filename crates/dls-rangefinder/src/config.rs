use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Connection settings for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangefinderConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Module address used in every command (`s<address>...`).
    pub address: u8,
    /// Give up on a reply after this long. Absent means wait indefinitely.
    pub read_timeout_ms: Option<u64>,
    /// Granularity of blocking serial reads.
    pub poll_interval_ms: u64,
}

impl Default for RangefinderConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 19200,
            address: 0,
            read_timeout_ms: None,
            poll_interval_ms: 100,
        }
    }
}

impl RangefinderConfig {
    pub fn with_port(&self, port: &str) -> Self {
        Self {
            port: port.to_string(),
            ..self.clone()
        }
    }
}

pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<RangefinderConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    let config: RangefinderConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing yaml: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: RangefinderConfig = serde_yaml::from_str("port: /dev/ttyS1\n").unwrap();
        assert_eq!(cfg.port, "/dev/ttyS1");
        assert_eq!(cfg.baud_rate, 19200);
        assert_eq!(cfg.address, 0);
        assert_eq!(cfg.read_timeout_ms, None);
    }

    #[test]
    fn loads_file() {
        let path = std::env::temp_dir().join(format!("dls-config-{}.yaml", std::process::id()));
        fs::write(&path, "baud_rate: 9600\nread_timeout_ms: 1500\n").unwrap();
        let cfg = load_config_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.read_timeout_ms, Some(1500));
        assert_eq!(cfg.port, "/dev/ttyUSB0");
    }

    #[test]
    fn unreadable_file_names_path() {
        let err = load_config_file("/nonexistent/dls.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/dls.yaml"));
    }
}
