//! Validate command - inspect CSV structure and properties.

use std::path::PathBuf;

use colored::Colorize;

use pgdraft::{SampleConfig, SampleReader};

pub fn run(csv: PathBuf, show_sample: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !csv.exists() {
        return Err(format!("File not found: {}", csv.display()).into());
    }

    println!();
    println!(
        "{} {}",
        "Validating CSV:".bold(),
        csv.display().to_string().cyan()
    );
    println!();

    let reader = SampleReader::with_config(SampleConfig {
        delimiter: None,
        max_rows: 10,
        quote: b'"',
    });
    let sample = reader.sample_file(&csv)?;

    println!("{} Encoding:  {}", "✓".green(), sample.properties.encoding.cyan());
    println!(
        "{} Delimiter: {}",
        "✓".green(),
        format!("{:?}", sample.properties.delimiter as char).cyan()
    );
    println!(
        "{} Columns:   {}",
        "✓".green(),
        sample.properties.column_count.to_string().cyan()
    );

    println!();
    println!("{}", "Headers:".bold());
    println!();
    for (i, header) in sample.headers.iter().take(20).enumerate() {
        println!("  {}. {}", i + 1, header);
    }
    if sample.headers.len() > 20 {
        println!("  ... and {} more", sample.headers.len() - 20);
    }

    if show_sample {
        println!();
        println!("{}", "Sample Data (first 5 rows):".bold());
        println!();
        let shown: Vec<&String> = sample.headers.iter().take(10).collect();
        println!(
            "  {}",
            shown
                .iter()
                .map(|h| format!("{:<16.16}", h))
                .collect::<String>()
        );
        for row in sample.rows.iter().take(5) {
            let cells: String = shown
                .iter()
                .map(|h| {
                    let value = row
                        .get(h.as_str())
                        .and_then(|v| v.as_deref())
                        .unwrap_or("");
                    format!("{:<16.16}", value)
                })
                .collect();
            println!("  {}", cells);
        }
        if sample.headers.len() > 10 {
            println!();
            println!("  (showing 10 of {} columns)", sample.headers.len());
        }
    }

    println!();
    println!("{}", "✓ CSV validation complete".green());
    println!();

    Ok(())
}
