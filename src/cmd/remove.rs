//! Remove command: `remove <packages…> [--no-deps] [--hard]`.

use anyhow::{Context, Result};

use pallet::ops::remove as lifecycle;
use pallet::policy::Policy;
use pallet::store::catalog::Catalog;

pub fn remove(packages: &[String], policy: &Policy) -> Result<()> {
    let mut catalog = Catalog::open(&policy.db).context("opening catalog")?;
    let root = std::env::current_dir().context("determining installation root")?;

    lifecycle::remove(&mut catalog, &root, packages, policy)?;

    println!("removed successfully");
    Ok(())
}
