//! Query command: `query <packages…> [--files] [--info]`.

use std::collections::HashSet;

use anyhow::{Context, Result};
use comfy_table::Table;
use crossterm::style::Stylize;

use pallet::core::manifest::EntryKind;
use pallet::policy::Policy;
use pallet::store::catalog::Catalog;

/// Reads the catalog for every package matching `patterns` (SQL-`LIKE`
/// wildcards accepted), or every installed package if `patterns` is empty,
/// and renders a summary table, optionally followed by manifest detail
/// (`--info`) and owned-file listings (`--files`).
pub fn query(patterns: &[String], files: bool, info: bool, policy: &Policy) -> Result<()> {
    let catalog = Catalog::open(&policy.db).context("opening catalog")?;

    let search: Vec<String> = if patterns.is_empty() {
        vec!["%".to_string()]
    } else {
        patterns.to_vec()
    };

    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    for pattern in &search {
        for pkg in catalog.list(pattern)? {
            if seen.insert(pkg.name.clone()) {
                matched.push(pkg);
            }
        }
    }

    if matched.is_empty() {
        println!("no packages matched");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["package", "version", "maintainer"]);
    for pkg in &matched {
        table.add_row(vec![pkg.name.as_str(), pkg.version.as_str(), pkg.maintainer.as_str()]);
    }
    println!("{table}");

    if info {
        for pkg in &matched {
            println!();
            println!("{}", pkg.name.as_str().bold());
            println!("  version:    {}", pkg.version);
            println!("  maintainer: {}", pkg.maintainer);
            let deps = if pkg.deps.trim().is_empty() {
                "(none)"
            } else {
                pkg.deps.trim()
            };
            println!("  deps:       {deps}");
        }
    }

    if files {
        for pkg in &matched {
            let mut rows = catalog.list_package_files(&pkg.name)?;
            rows.sort_by(|a, b| a.path.cmp(&b.path));
            println!();
            println!("{} ({} files)", pkg.name.as_str().bold(), rows.len());
            for row in rows {
                let kind = match row.kind {
                    EntryKind::File => "file",
                    EntryKind::Dir => "dir ",
                };
                println!("  {kind} {}", row.path);
            }
        }
    }

    Ok(())
}
