// ABOUTME: Shared helper for connecting to the registry and the local toolchain.
// ABOUTME: Used by apply, refresh and destroy.

use ecrbuildpush::config::Config;
use ecrbuildpush::error::Result;
use ecrbuildpush::output::Output;
use ecrbuildpush::reconcile::Reconciler;
use ecrbuildpush::registry::EcrRegistry;
use ecrbuildpush::runtime::{BollardBuilder, RuntimeError, resolve_runtime};

/// Connect a reconciler for the configured toolchain.
///
/// The toolchain connection is lazy; reachability is checked by the
/// operations that build. Registry calls go to the region of each
/// operation's context.
pub async fn connect(
    config: &Config,
    output: &Output,
) -> Result<Reconciler<EcrRegistry, BollardBuilder>> {
    output.progress("  → Detecting toolchain...");
    let runtime_info = resolve_runtime(&config.runtime).map_err(RuntimeError::from)?;

    output.progress(&format!(
        "  → Found {} at {}",
        runtime_info.runtime_type, runtime_info.socket_path
    ));

    let builder = BollardBuilder::connect(&runtime_info).map_err(RuntimeError::from)?;
    let registry = EcrRegistry::connect().await;

    Ok(Reconciler::new(registry, builder))
}
