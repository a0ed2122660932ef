use std::io::Write;
use std::path::Path;

use beamwatch_core::{ArtifactGroupStore, DirectoryScanner, Layout};

/// Scan `directory` once and print its complete groups, oldest first.
pub fn execute(directory: &Path, layout: Layout, json: bool) -> anyhow::Result<()> {
    let scanner = DirectoryScanner::new(directory, layout)?;
    let mut store = ArtifactGroupStore::new();
    store.record_new_groups(scanner.scan(store.tracked()));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&to_json(&scanner, &store))?)?;
    } else {
        write_listing(&mut out, &scanner, &store)?;
    }
    Ok(())
}

fn to_json(scanner: &DirectoryScanner, store: &ArtifactGroupStore) -> serde_json::Value {
    let groups: Vec<serde_json::Value> = store
        .groups()
        .iter()
        .map(|g| {
            let paths = scanner.paths(&g.tag);
            serde_json::json!({
                "tag": g.tag,
                "discovered_at": g.discovered_at_rfc3339(),
                "summary": paths.summary,
                "model": paths.model,
                "maps": paths.maps,
            })
        })
        .collect();
    serde_json::json!({
        "directory": scanner.directory(),
        "layout": scanner.layout(),
        "groups": groups,
    })
}

fn write_listing(
    out: &mut impl Write,
    scanner: &DirectoryScanner,
    store: &ArtifactGroupStore,
) -> std::io::Result<()> {
    if store.is_empty() {
        writeln!(
            out,
            "No complete groups in {} ({} layout).",
            scanner.directory().display(),
            scanner.layout()
        )?;
        return Ok(());
    }
    for (i, group) in store.groups().iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {}  {}",
            i + 1,
            group.discovered_at_rfc3339(),
            group.tag
        )?;
    }
    Ok(())
}
