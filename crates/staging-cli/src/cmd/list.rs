use crate::output::{print_json, Table};
use anyhow::Context;
use staging_core::staging;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let stagings = staging::list(root)
        .with_context(|| format!("failed to list stagings under {}", root.display()))?;

    if json {
        return print_json(&stagings);
    }
    if stagings.is_empty() {
        println!("No staging charts found under {}.", root.display());
        return Ok(());
    }

    let mut table = Table::new(&["STAGING", "ALIAS", "SUSPENDED", "PATH"]);
    for s in &stagings {
        table.row(vec![
            s.name.clone(),
            s.alias.clone(),
            if s.suspended { "yes" } else { "no" }.to_string(),
            s.path.display().to_string(),
        ]);
    }
    table.print();
    Ok(())
}
