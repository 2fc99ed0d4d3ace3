//! Environment check command.

use console::style;

use crate::config::Settings;
use crate::extract::TextExtractor;

/// Report OCR tool availability and model configuration.
pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("OCR Tools").bold());
    println!("{}", "-".repeat(50));

    let extractor = TextExtractor::from_config(&settings.ocr);
    for (tool, available) in extractor.check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }
    println!("  {}", style(extractor.ocr_hint()).dim());

    println!("\n{}", style("Model").bold());
    println!("{}", "-".repeat(50));
    println!("  {:<15} {}", "Provider", settings.llm.provider);
    println!("  {:<15} {}", "Model", settings.llm.model);
    println!("  {:<15} {}", "Endpoint", settings.llm.endpoint());
    match settings.require_credentials() {
        Ok(()) => println!("  {:<15} {}", "API key", style("✓ configured").green()),
        Err(e) => {
            println!("  {:<15} {}", "API key", style("✗ missing").red());
            println!("  {}", style(e).dim());
        }
    }

    println!("\n{}", style("Uploads").bold());
    println!("{}", "-".repeat(50));
    println!(
        "  {:<15} {}",
        "Allowed",
        settings.allowed_extensions.join(", ")
    );
    println!("  {:<15} {} bytes", "Max size", settings.max_upload_bytes);
    println!();

    Ok(())
}
