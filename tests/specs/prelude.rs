//! Shared fixtures for the spec §8 scenarios.

use jido_core::{FakeClock, NoopTelemetrySink};
use jido_registry::{SessionRegistry, SessionRegistryConfig};
use jido_render::test_support::echo_registry;
use std::sync::Arc;
use tempfile::TempDir;

/// A registry rooted at `workspace` with its own checkpoint directory, a
/// `FakeClock` the test drives by hand, and only the `echo` render adapter
/// registered.
pub fn registry_at(
    workspace: &std::path::Path,
) -> (Arc<SessionRegistry<FakeClock>>, FakeClock, TempDir) {
    registry_with_config(workspace, SessionRegistryConfig::default())
}

pub fn registry_with_config(
    workspace: &std::path::Path,
    config: SessionRegistryConfig,
) -> (Arc<SessionRegistry<FakeClock>>, FakeClock, TempDir) {
    let checkpoints = TempDir::new().expect("checkpoint dir");
    let clock = FakeClock::new();
    let registry = registry_with_checkpoint_dir(workspace, checkpoints.path(), config, clock.clone());
    (registry, clock, checkpoints)
}

/// Like [`registry_at`], but pointed at a caller-owned checkpoint
/// directory — used by scenarios that "restart" against the same
/// checkpoint store.
pub fn registry_with_checkpoint_dir(
    workspace: &std::path::Path,
    checkpoint_dir: &std::path::Path,
    mut config: SessionRegistryConfig,
    clock: FakeClock,
) -> Arc<SessionRegistry<FakeClock>> {
    config.session.workspace_root = workspace.to_path_buf();
    SessionRegistry::new(
        checkpoint_dir,
        echo_registry(),
        Arc::new(NoopTelemetrySink),
        clock,
        config,
    )
}
