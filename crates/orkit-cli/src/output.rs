use anyhow::Context;
use serde::Serialize;
use std::path::Path;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Pretty JSON to `path` when given, otherwise stdout.
pub fn emit_json<T: Serialize>(value: &T, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let json = serde_json::to_string_pretty(value)?;
            orkit_core::io::atomic_write(path, format!("{json}\n").as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
        None => print_json(value),
    }
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    // Widths in chars so box-drawing and accented names line up.
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let render = |cells: &mut dyn Iterator<Item = &str>| -> String {
        cells
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", render(&mut headers.iter().copied()));
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));
    for row in rows {
        println!("{}", render(&mut row.iter().map(String::as_str)));
    }
}
