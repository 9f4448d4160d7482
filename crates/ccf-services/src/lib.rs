//! Job-status and resource upload services.
//!
//! Composes the archive client into the pieces a batch job calls:
//! server failover, PUT orchestration with confirmation, and the
//! RUNNING marker lifecycle.

pub mod failover;
pub mod marker;
pub mod orchestrator;
pub mod prompt;
pub mod staging;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use failover::{FailoverPolicy, ServerFailoverResolver};
pub use marker::{MarkerTransition, RunningStatusMarker};
pub use orchestrator::ResourcePutOrchestrator;
pub use prompt::{NonInteractivePrompt, Prompt, StdinPrompt};
pub use staging::StagingDir;
