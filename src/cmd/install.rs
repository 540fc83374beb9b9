//! Install command: `install <scripts…> [--no-deps] [--force]`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use pallet::core::builder::{self, BuildOutput};
use pallet::ops::install as lifecycle;
use pallet::policy::Policy;
use pallet::store::catalog::Catalog;

/// Builds every script in `scripts` and installs the resulting batch
/// together. The batch form lets a package and its fresh dependencies
/// install in one call without the dependency check failing.
pub fn install(scripts: &[PathBuf], policy: &Policy) -> Result<()> {
    let mut batch: Vec<BuildOutput> = Vec::with_capacity(scripts.len());
    for script in scripts {
        let out = builder::build(script)
            .with_context(|| format!("building package script {}", script.display()))?;
        tracing::info!(package = %out.manifest.name, version = %out.manifest.version, "built package");
        batch.push(out);
    }

    if policy.force {
        tracing::warn!("--force is reserved and has no effect");
    }

    let mut catalog = Catalog::open(&policy.db).context("opening catalog")?;
    let root = std::env::current_dir().context("determining installation root")?;

    lifecycle::install(&mut catalog, &root, batch, policy)?;

    println!("installed successfully");
    Ok(())
}
