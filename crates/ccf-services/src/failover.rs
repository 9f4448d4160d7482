//! Shadow-server failover.
//!
//! The archive sits behind a pool of interchangeable front-ends. The primary is
//! used whenever it answers; otherwise the pool is walked round-robin starting
//! just after the primary, pass after pass, up to a fixed bound.

use ccf_api_client::ServerProbe;
use ccf_core::{ArchiveConfig, ArchiveError, ArchiveResult, ServerCandidate};
use std::sync::Arc;
use std::time::Duration;

/// Bounds of the failover loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailoverPolicy {
    /// Wait between two passes that found no healthy server
    pub interval: Duration,
    pub max_passes: u32,
}

impl From<&ArchiveConfig> for FailoverPolicy {
    fn from(config: &ArchiveConfig) -> Self {
        Self {
            interval: config.failover_interval,
            max_passes: config.failover_max_passes,
        }
    }
}

#[derive(Clone)]
pub struct ServerFailoverResolver {
    probe: Arc<dyn ServerProbe>,
    candidates: Vec<String>,
    policy: FailoverPolicy,
}

impl ServerFailoverResolver {
    pub fn new(probe: Arc<dyn ServerProbe>, candidates: Vec<String>, policy: FailoverPolicy) -> Self {
        Self {
            probe,
            candidates,
            policy,
        }
    }

    pub fn from_config(probe: Arc<dyn ServerProbe>, config: &ArchiveConfig) -> Self {
        Self::new(probe, config.shadow_servers.clone(), FailoverPolicy::from(config))
    }

    /// Candidates in probing order: everything after the primary, then wrapping around.
    ///
    /// A primary missing from the pool starts the walk at the first candidate. An
    /// empty pool degenerates to retrying the primary alone.
    pub fn rotated_candidates(&self, primary: &str) -> Vec<String> {
        if self.candidates.is_empty() {
            return vec![primary.to_string()];
        }

        match self.candidates.iter().position(|c| c == primary) {
            Some(index) => self.candidates[index + 1..]
                .iter()
                .chain(self.candidates[..=index].iter())
                .cloned()
                .collect(),
            None => self.candidates.clone(),
        }
    }

    /// Return a server that currently answers the liveness probe.
    ///
    /// Fails with `ArchiveError::FailoverExhausted` once `max_passes` passes found
    /// nothing; callers must abort the job in that case.
    pub async fn resolve(&self, primary: &str) -> ArchiveResult<ServerCandidate> {
        if self.probe.is_healthy(primary).await {
            return Ok(ServerCandidate::new(primary, true));
        }

        tracing::warn!(primary = %primary, "Primary server is not responding, trying shadow servers");

        let rotation = self.rotated_candidates(primary);
        for pass in 1..=self.policy.max_passes {
            for candidate in &rotation {
                if self.probe.is_healthy(candidate).await {
                    tracing::info!(
                        primary = %primary,
                        server = %candidate,
                        pass,
                        "Selected healthy shadow server"
                    );
                    return Ok(ServerCandidate::new(candidate.as_str(), true));
                }
            }

            tracing::warn!(
                pass,
                max_passes = self.policy.max_passes,
                interval_secs = self.policy.interval.as_secs(),
                "No healthy server found in this pass"
            );
            if pass < self.policy.max_passes {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        tracing::error!(
            primary = %primary,
            passes = self.policy.max_passes,
            "Failover exhausted, giving up"
        );
        Err(ArchiveError::FailoverExhausted {
            primary: primary.to_string(),
            passes: self.policy.max_passes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakeProbe;

    fn pool() -> Vec<String> {
        ["db-shadow1:8080", "db-shadow2:8080", "db-shadow3:8080", "db-shadow4:8080"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn policy(max_passes: u32) -> FailoverPolicy {
        FailoverPolicy {
            interval: Duration::ZERO,
            max_passes,
        }
    }

    #[tokio::test]
    async fn test_healthy_primary_probes_nothing_else() {
        let probe = Arc::new(FakeProbe::healthy(&["db-shadow2:8080", "db-shadow3:8080"]));
        let resolver = ServerFailoverResolver::new(probe.clone(), pool(), policy(60));

        let chosen = resolver.resolve("db-shadow2:8080").await.unwrap();
        assert_eq!(chosen.address, "db-shadow2:8080");
        assert!(chosen.healthy);
        assert_eq!(probe.calls(), vec!["db-shadow2:8080"]);
    }

    #[tokio::test]
    async fn test_rotation_starts_after_primary() {
        let probe = Arc::new(FakeProbe::healthy(&["db-shadow1:8080", "db-shadow4:8080"]));
        let resolver = ServerFailoverResolver::new(probe.clone(), pool(), policy(60));

        let chosen = resolver.resolve("db-shadow2:8080").await.unwrap();
        // shadow3 (down), then shadow4 (up); shadow1 must not be reached first.
        assert_eq!(chosen.address, "db-shadow4:8080");
        assert_eq!(
            probe.calls(),
            vec!["db-shadow2:8080", "db-shadow3:8080", "db-shadow4:8080"]
        );
    }

    #[tokio::test]
    async fn test_rotation_wraps_around() {
        let probe = Arc::new(FakeProbe::healthy(&["db-shadow1:8080"]));
        let resolver = ServerFailoverResolver::new(probe.clone(), pool(), policy(60));

        let chosen = resolver.resolve("db-shadow3:8080").await.unwrap();
        assert_eq!(chosen.address, "db-shadow1:8080");
        assert_eq!(
            probe.calls(),
            vec!["db-shadow3:8080", "db-shadow4:8080", "db-shadow1:8080"]
        );
    }

    #[test]
    fn test_rotated_candidates() {
        let resolver =
            ServerFailoverResolver::new(Arc::new(FakeProbe::healthy(&[])), pool(), policy(1));
        assert_eq!(
            resolver.rotated_candidates("db-shadow4:8080"),
            vec!["db-shadow1:8080", "db-shadow2:8080", "db-shadow3:8080", "db-shadow4:8080"]
        );
        assert_eq!(resolver.rotated_candidates("db.example.org"), pool());

        let lonely =
            ServerFailoverResolver::new(Arc::new(FakeProbe::healthy(&[])), vec![], policy(1));
        assert_eq!(lonely.rotated_candidates("db.example.org"), vec!["db.example.org"]);
    }

    #[tokio::test]
    async fn test_exhaustion_after_exactly_max_passes() {
        let probe = Arc::new(FakeProbe::healthy(&[]));
        let resolver = ServerFailoverResolver::new(probe.clone(), pool(), policy(60));

        let err = resolver.resolve("db-shadow1:8080").await.unwrap_err();
        match err {
            ArchiveError::FailoverExhausted { primary, passes } => {
                assert_eq!(primary, "db-shadow1:8080");
                assert_eq!(passes, 60);
            }
            other => panic!("unexpected error: {other}"),
        }
        // One primary probe, then 60 full passes over the pool.
        assert_eq!(probe.calls().len(), 1 + 60 * 4);
    }

    #[tokio::test]
    async fn test_recovers_in_a_later_pass() {
        let probe = Arc::new(FakeProbe::healthy_after(&["db-shadow3:8080"], 9));
        let resolver = ServerFailoverResolver::new(probe.clone(), pool(), policy(60));

        let chosen = resolver.resolve("db-shadow1:8080").await.unwrap();
        assert_eq!(chosen.address, "db-shadow3:8080");
        // Pass 1 and 2 probe 4 servers each; shadow3 is the 2nd probe of pass 3.
        assert_eq!(probe.calls().len(), 1 + 4 + 4 + 2);
    }

    #[test]
    fn test_policy_from_config() {
        let config = ArchiveConfig::default();
        let policy = FailoverPolicy::from(&config);
        assert_eq!(policy.interval, Duration::from_secs(60));
        assert_eq!(policy.max_passes, 60);
    }
}
