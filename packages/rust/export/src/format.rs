//! Flat-cell value rendering shared by the CSV and spreadsheet encoders.

use resultforge_shared::Value;

/// Render a field value as a flat cell.
///
/// Strings get their double-quotes doubled and are wrapped in quotes when
/// the result contains a comma or newline. Arrays join their elements with
/// `;`. Nested detail records have no faithful flat rendering and become
/// the empty string.
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => quote_if_delimited(double_quotes(s)),
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Float(f)) => format_float(*f),
        Some(Value::Array(items)) => format_array(items),
        Some(Value::Record(_)) | Some(Value::Records(_)) => String::new(),
    }
}

fn format_array(items: &[Value]) -> String {
    let joined = items
        .iter()
        .map(|item| match item {
            Value::String(s) => double_quotes(s),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            _ => String::new(),
        })
        .collect::<Vec<_>>()
        .join(";");
    quote_if_delimited(joined)
}

/// Shortest decimal representation that round-trips (`Display` for floats).
fn format_float(f: f64) -> String {
    f.to_string()
}

fn double_quotes(s: &str) -> String {
    if s.contains('"') {
        s.replace('"', "\"\"")
    } else {
        s.to_string()
    }
}

fn quote_if_delimited(s: String) -> String {
    if s.contains(',') || s.contains('\n') {
        format!("\"{s}\"")
    } else {
        s
    }
}
