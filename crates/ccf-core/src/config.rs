//! Configuration module
//!
//! `ArchiveConfig` is built once when a command starts and handed to every
//! component. Nothing below the binaries reads the process environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::Protocol;
use crate::validation::normalize_server_name;

const FAILOVER_INTERVAL_SECS: u64 = 60;
const FAILOVER_MAX_PASSES: u32 = 60;
const PROBE_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 600;
const DEFAULT_PIPELINE_NAME: &str = "MsmAllProcessing";

#[derive(Clone, Debug)]
pub struct ArchiveConfig {
    pub protocol: Protocol,
    /// Interchangeable front-ends, in round-robin order
    pub shadow_servers: Vec<String>,
    /// Wait between two failed failover passes
    pub failover_interval: Duration,
    pub failover_max_passes: u32,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
    /// Root under which local scratch directories are created
    pub scratch_root: PathBuf,
    /// Prefix of marker file names
    pub pipeline_name: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Https,
            shadow_servers: Vec::new(),
            failover_interval: Duration::from_secs(FAILOVER_INTERVAL_SECS),
            failover_max_passes: FAILOVER_MAX_PASSES,
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            scratch_root: env::temp_dir(),
            pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
        }
    }
}

impl ArchiveConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a key lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let shadow_servers = match lookup("XNAT_PBS_JOBS_SHADOW_SERVERS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    normalize_server_name(s).map_err(|e| {
                        anyhow::anyhow!("XNAT_PBS_JOBS_SHADOW_SERVERS entry '{}': {}", s, e)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let secs = |key: &str, default: u64| -> Result<u64, anyhow::Error> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} must be a number of seconds", key)),
                None => Ok(default),
            }
        };

        let failover_max_passes = match lookup("XNAT_FAILOVER_MAX_PASSES") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("XNAT_FAILOVER_MAX_PASSES must be a number"))?,
            None => FAILOVER_MAX_PASSES,
        };

        let config = Self {
            protocol: defaults.protocol,
            shadow_servers,
            failover_interval: Duration::from_secs(secs(
                "XNAT_FAILOVER_INTERVAL_SECS",
                FAILOVER_INTERVAL_SECS,
            )?),
            failover_max_passes,
            probe_timeout: Duration::from_secs(secs("XNAT_PROBE_TIMEOUT_SECS", PROBE_TIMEOUT_SECS)?),
            request_timeout: Duration::from_secs(secs(
                "XNAT_REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )?),
            scratch_root: lookup("XNAT_PBS_JOBS_BUILD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_root),
            pipeline_name: lookup("XNAT_PBS_JOBS_PIPELINE_NAME")
                .unwrap_or(defaults.pipeline_name),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.failover_max_passes == 0 {
            return Err(anyhow::anyhow!(
                "XNAT_FAILOVER_MAX_PASSES must be at least 1"
            ));
        }
        if self.pipeline_name.trim().is_empty() {
            return Err(anyhow::anyhow!("XNAT_PBS_JOBS_PIPELINE_NAME must not be empty"));
        }
        if self.pipeline_name.contains('/') {
            return Err(anyhow::anyhow!(
                "XNAT_PBS_JOBS_PIPELINE_NAME must not contain '/'"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.protocol, Protocol::Https);
        assert!(config.shadow_servers.is_empty());
        assert_eq!(config.failover_interval, Duration::from_secs(60));
        assert_eq!(config.failover_max_passes, 60);
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.pipeline_name, "MsmAllProcessing");
    }

    #[test]
    fn test_config_overrides() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[
            (
                "XNAT_PBS_JOBS_SHADOW_SERVERS",
                "db-shadow1.nrg.mir:8080, db-shadow2.nrg.mir:8080,,",
            ),
            ("XNAT_FAILOVER_INTERVAL_SECS", "5"),
            ("XNAT_FAILOVER_MAX_PASSES", "3"),
            ("XNAT_PBS_JOBS_BUILD_DIR", "/scratch/build"),
            ("XNAT_PBS_JOBS_PIPELINE_NAME", "StructuralPreprocessing"),
        ]))
        .unwrap();
        assert_eq!(
            config.shadow_servers,
            vec!["db-shadow1.nrg.mir:8080", "db-shadow2.nrg.mir:8080"]
        );
        assert_eq!(config.failover_interval, Duration::from_secs(5));
        assert_eq!(config.failover_max_passes, 3);
        assert_eq!(config.scratch_root, PathBuf::from("/scratch/build"));
        assert_eq!(config.pipeline_name, "StructuralPreprocessing");
    }

    #[test]
    fn test_shadow_servers_are_normalized() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[(
            "XNAT_PBS_JOBS_SHADOW_SERVERS",
            "https://db-shadow1.nrg.mir/, http://db-shadow2.nrg.mir:8080",
        )]))
        .unwrap();
        assert_eq!(
            config.shadow_servers,
            vec!["db-shadow1.nrg.mir", "db-shadow2.nrg.mir:8080"]
        );

        let err = ArchiveConfig::from_lookup(lookup_from(&[(
            "XNAT_PBS_JOBS_SHADOW_SERVERS",
            "db-shadow1.nrg.mir, https://db-shadow2/app",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("XNAT_PBS_JOBS_SHADOW_SERVERS"));
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        assert!(ArchiveConfig::from_lookup(lookup_from(&[("XNAT_FAILOVER_MAX_PASSES", "0")])).is_err());
        assert!(
            ArchiveConfig::from_lookup(lookup_from(&[("XNAT_PROBE_TIMEOUT_SECS", "soon")])).is_err()
        );
        assert!(
            ArchiveConfig::from_lookup(lookup_from(&[("XNAT_PBS_JOBS_PIPELINE_NAME", " ")])).is_err()
        );
    }
}
