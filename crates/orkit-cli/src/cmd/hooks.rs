use crate::output::{print_json, print_table};
use anyhow::Context;
use orkit_core::aggregate::Corpus;
use orkit_core::config::Config;
use orkit_core::hooks;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let corpus = Corpus::load(root, &config).context("failed to scan plugin sources")?;
    let counts = hooks::count_hooks(&corpus.hooks, &corpus.agents, &corpus.skills);
    let entries = corpus.hooks.entries();

    if json {
        let value = serde_json::json!({
            "counts": counts,
            "entries": entries,
        });
        return print_json(&value);
    }

    println!(
        "{} hooks: {} global, {} scoped to agents/skills",
        counts.total, counts.global, counts.scoped
    );
    if entries.is_empty() {
        return Ok(());
    }

    println!();
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let name = if e.fire_and_forget {
                format!("{} (async)", e.name)
            } else {
                e.name.clone()
            };
            vec![
                hooks::event_slug(&e.event),
                e.matcher.clone(),
                name,
                e.scope.as_str().to_string(),
            ]
        })
        .collect();
    print_table(&["EVENT", "MATCHER", "NAME", "SCOPE"], &rows);
    Ok(())
}
