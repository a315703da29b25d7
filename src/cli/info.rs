use anyhow::{Context, Result};
use std::path::PathBuf;

use snpack::store::{ContainerReader, TableSource};

/// Display information about an snpack container
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let mut reader = ContainerReader::open(&file)
        .with_context(|| format!("Failed to open container {}", file.display()))?;

    println!("snpack Container Information");
    println!("============================");
    println!("File: {}", file.display());
    println!();

    println!("Global Keys:");
    for (key, value) in reader.global_keys() {
        let value = value.to_string();
        let preview = if value.chars().count() > 100 {
            let head: String = value.chars().take(100).collect();
            format!("{}... ({} bytes)", head, value.len())
        } else {
            value
        };
        println!("  {}: {}", key, preview);
    }
    println!();

    for index in 0..reader.table_count() {
        reader
            .move_to_table(index)
            .with_context(|| format!("Failed to load table {}", index))?;
        println!(
            "Table {}: {} ({} rows)",
            index,
            reader.table_name()?,
            reader.num_rows()?
        );
        for column in 1..=reader.num_columns()? {
            println!(
                "  {:3}. {} ({})",
                column,
                reader.column_name(column)?,
                reader.column_form(column)?
            );
        }
        println!();
    }

    Ok(())
}
