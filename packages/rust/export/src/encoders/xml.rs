//! XML streaming encoder.

use resultforge_shared::{Record, Result, Value};

use super::StreamingEncoder;

/// Encodes records as `<field>…</field>` runs inside a single `<root>`.
///
/// Projected scalar fields are entity-escaped; scalar arrays join with `;`
/// inside one tag pair. A resolved detail field recurses, repeating the
/// wrapper tag for each array element — there is no list container element.
pub struct XmlEncoder {
    field_names: Vec<String>,
}

impl XmlEncoder {
    pub fn new(field_names: Vec<String>) -> Self {
        Self { field_names }
    }
}

impl StreamingEncoder for XmlEncoder {
    fn begin(&self) -> String {
        r#"<?xml version="1.0" encoding="UTF-8"?><root>"#.into()
    }

    fn delimiter(&self) -> &'static str {
        ""
    }

    fn encode_record(&self, record: &Record) -> Result<String> {
        let mut out = String::new();
        for field in &self.field_names {
            if let Some(value) = record.get(field) {
                write_field(&mut out, field, value);
            }
        }
        Ok(out)
    }

    fn finalize(&self) -> String {
        "</root>".into()
    }
}

fn write_field(out: &mut String, field: &str, value: &Value) {
    match value {
        Value::Record(child) => write_wrapped(out, field, child),
        Value::Records(children) => {
            for child in children {
                write_wrapped(out, field, child);
            }
        }
        scalar => {
            out.push('<');
            out.push_str(field);
            out.push('>');
            out.push_str(&scalar_text(scalar));
            out.push_str("</");
            out.push_str(field);
            out.push('>');
        }
    }
}

fn write_wrapped(out: &mut String, field: &str, child: &Record) {
    out.push('<');
    out.push_str(field);
    out.push('>');
    write_record(out, child);
    out.push_str("</");
    out.push_str(field);
    out.push('>');
}

/// Nested records emit all their fields, in deterministic order.
fn write_record(out: &mut String, record: &Record) {
    for (field, value) in record.fields() {
        write_field(out, field, value);
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_xml(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(";"),
        // handled by write_field
        Value::Record(_) | Value::Records(_) => String::new(),
    }
}

/// Escape the five predefined XML entities.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_frame() {
        let encoder = XmlEncoder::new(vec![]);
        assert!(encoder.begin().starts_with(r#"<?xml version="1.0""#));
        assert!(encoder.begin().ends_with("<root>"));
        assert_eq!(encoder.finalize(), "</root>");
        assert_eq!(encoder.delimiter(), "");
    }

    #[test]
    fn entities_are_escaped() {
        let encoder = XmlEncoder::new(vec!["title".into()]);
        let mut record = Record::new();
        record.insert("title", Value::String("Tom & Jerry <3".into()));

        let out = encoder.encode_record(&record).unwrap();
        assert_eq!(out, "<title>Tom &amp; Jerry &lt;3</title>");
    }

    #[test]
    fn scalar_arrays_join_inside_one_tag() {
        let encoder = XmlEncoder::new(vec!["tags".into()]);
        let mut record = Record::new();
        record.insert(
            "tags",
            Value::Array(vec![Value::String("a&b".into()), Value::String("c".into())]),
        );

        let out = encoder.encode_record(&record).unwrap();
        assert_eq!(out, "<tags>a&amp;b;c</tags>");
    }

    #[test]
    fn detail_array_repeats_the_wrapper_tag() {
        let mut first = Record::new();
        first.insert("n", Value::Integer(1));
        let mut second = Record::new();
        second.insert("n", Value::Integer(2));

        let encoder = XmlEncoder::new(vec!["details".into()]);
        let mut record = Record::new();
        record.insert("details", Value::Records(vec![first, second]));

        let out = encoder.encode_record(&record).unwrap();
        assert_eq!(out, "<details><n>1</n></details><details><n>2</n></details>");
    }

    #[test]
    fn absent_fields_are_skipped() {
        let encoder = XmlEncoder::new(vec!["a".into(), "b".into()]);
        let mut record = Record::new();
        record.insert("b", Value::Integer(7));

        let out = encoder.encode_record(&record).unwrap();
        assert_eq!(out, "<b>7</b>");
    }
}
