//! Invoice processing command: extraction plus structuring.

use std::path::Path;

use console::style;
use serde_json::Value;

use super::extract::extract_file;
use crate::config::Settings;
use crate::invoice::{interpret_model_output, InvoiceFields};
use crate::llm::{InvoiceStructurer, LlmClient, StructuringOutcome};

/// Extract and structure one invoice file.
pub async fn cmd_process(settings: &Settings, file: &Path, raw: bool) -> anyhow::Result<()> {
    settings.require_credentials()?;

    let result = extract_file(settings, file).await?;
    if result.is_blank() {
        anyhow::bail!("Could not extract text from {}", file.display());
    }
    eprintln!(
        "{} Extracted {} chars via {}, asking {}...",
        style("→").cyan(),
        result.text.len(),
        result.method.as_str(),
        settings.llm.model
    );

    let client = LlmClient::new(settings.llm.clone())?;
    let output = match client.structure(&result.text).await {
        StructuringOutcome::Structured(output) => output,
        StructuringOutcome::Failed(message) => {
            eprintln!("{} {}", style("✗").red(), message);
            anyhow::bail!("Structuring failed");
        }
    };

    if raw {
        println!("{}", output);
        return Ok(());
    }

    let data = interpret_model_output(&output);
    match InvoiceFields::from_value(&data) {
        Some(fields) if !fields.is_empty() => print!("{}", render_invoice(&fields)),
        _ => match &data {
            Value::String(text) => println!("{}", text),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        },
    }
    Ok(())
}

/// Human-readable summary of an invoice.
fn render_invoice(fields: &InvoiceFields) -> String {
    let mut out = String::new();
    let currency = fields.currency.as_deref().unwrap_or("");

    let rows: [(&str, Option<String>); 8] = [
        ("Vendor", fields.vendor_name.clone()),
        ("Invoice #", fields.invoice_number.clone()),
        ("Date", fields.date.clone()),
        ("Due", fields.due_date.clone()),
        ("Currency", fields.currency.clone()),
        ("Subtotal", fields.subtotal.map(|v| money(v, currency))),
        ("Tax", fields.tax.map(|v| money(v, currency))),
        ("Total", fields.total.map(|v| money(v, currency))),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            out.push_str(&format!("{:<12} {}\n", label, value));
        }
    }

    if !fields.line_items.is_empty() {
        out.push_str(&format!("\n{}\n", style("Line items").bold()));
        for item in &fields.line_items {
            out.push_str(&format!(
                "  {:<36} {:>8} {:>12} {:>12}\n",
                item.description.as_deref().unwrap_or("-"),
                item.quantity.map(|q| q.to_string()).unwrap_or_default(),
                item.unit_price.map(|v| money(v, currency)).unwrap_or_default(),
                item.amount.map(|v| money(v, currency)).unwrap_or_default(),
            ));
        }
    }

    for (key, value) in &fields.extra {
        if !value.is_null() {
            out.push_str(&format!("{:<12} {}\n", key, value));
        }
    }
    out
}

fn money(value: f64, currency: &str) -> String {
    if currency.is_empty() {
        format!("{:.2}", value)
    } else {
        format!("{:.2} {}", value, currency)
    }
}
