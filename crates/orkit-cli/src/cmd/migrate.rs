use crate::output::{print_json, print_table};
use anyhow::Context;
use orkit_core::config::Config;
use orkit_core::migrate::{self, MigrateOutcome};
use orkit_core::paths;
use std::path::Path;

pub fn run(root: &Path, dir: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let dir = match dir {
        Some(d) => paths::resolve(root, d),
        None => {
            let config = Config::load(root).context("failed to load config")?;
            paths::resolve(root, &config.sources.agents_dir)
        }
    };

    let results = migrate::migrate_dir(&dir)
        .with_context(|| format!("failed to migrate agents in {}", dir.display()))?;

    if json {
        let value: Vec<serde_json::Value> = results
            .iter()
            .map(|(file, outcome)| {
                let mut v = serde_json::to_value(outcome).unwrap_or_default();
                if let Some(obj) = v.as_object_mut() {
                    obj.insert("file".to_string(), file.clone().into());
                }
                v
            })
            .collect();
        return print_json(&value);
    }

    if results.is_empty() {
        println!("No agent files in {}", dir.display());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|(file, outcome)| match outcome {
            MigrateOutcome::Migrated {
                model,
                tools,
                skills,
                ..
            } => vec![
                file.clone(),
                "migrated".to_string(),
                format!("model={model} tools={tools} skills={skills}"),
            ],
            MigrateOutcome::Unchanged => {
                vec![file.clone(), "unchanged".to_string(), String::new()]
            }
            MigrateOutcome::Skipped => {
                vec![file.clone(), "skipped".to_string(), "no frontmatter".to_string()]
            }
        })
        .collect();
    print_table(&["FILE", "STATUS", "DETAIL"], &rows);

    let migrated = results
        .iter()
        .filter(|(_, o)| matches!(o, MigrateOutcome::Migrated { .. }))
        .count();
    println!();
    println!("{migrated}/{} agent files migrated", results.len());
    Ok(())
}
