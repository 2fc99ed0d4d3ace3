//! Default prompt templates.

/// Placeholder replaced with the extracted document text.
pub const PROMPT_PLACEHOLDER: &str = "{invoice_text}";

/// Default instruction template for invoice structuring.
pub const DEFAULT_INVOICE_PROMPT: &str = r#"You are an assistant that extracts structured data from invoices.

Read the invoice text below and return a single JSON object with these fields:
- "invoice_number": string
- "vendor_name": string
- "date": invoice date as YYYY-MM-DD
- "due_date": due date as YYYY-MM-DD, or null
- "currency": ISO 4217 code, e.g. "USD"
- "subtotal": number
- "tax": number, or null
- "total": number
- "line_items": array of objects with "description" (string), "quantity" (number), "unit_price" (number) and "amount" (number)

Use null for any field that does not appear in the text. Write amounts as plain numbers without currency symbols or thousands separators. Return only the JSON object, with no commentary and no Markdown.

Invoice text:
{invoice_text}
"#;
