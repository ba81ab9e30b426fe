use crate::output::print_json;
use staging_core::chart;
use std::path::Path;

pub fn run(chart_dir: &Path, json: bool) -> anyhow::Result<()> {
    let alias = chart::app_alias(chart_dir)?;
    if json {
        print_json(&serde_json::json!({ "alias": alias }))?;
    } else {
        println!("{alias}");
    }
    Ok(())
}
