use crate::output::{print_json, print_table};
use anyhow::Context;
use orkit_core::aggregate::{self, Corpus};
use orkit_core::config::Config;
use orkit_core::emit;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let corpus = Corpus::load(root, &config).context("failed to scan plugin sources")?;
    let output = aggregate::aggregate(&corpus, &config.aggregate);
    let written = emit::write_outputs(root, &output, &config.aggregate.outputs)
        .context("failed to write aggregate outputs")?;

    if json {
        let value = serde_json::json!({
            "totals": output.totals,
            "categories": output.categories,
            "written": written,
        });
        return print_json(&value);
    }

    let t = &output.totals;
    println!(
        "Aggregated {} plugins, {} skills ({} commands), {} agents, {} hooks",
        t.plugins, t.skills, t.commands, t.agents, t.hooks
    );

    if !output.plugins.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = output
            .plugins
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    p.version.clone(),
                    p.skill_count.to_string(),
                    p.agent_count.to_string(),
                ]
            })
            .collect();
        print_table(&["PLUGIN", "VERSION", "SKILLS", "AGENTS"], &rows);
    }

    println!();
    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
