//! Markdown renderer
//!
//! Renders a calculation result as a `| field | value |` table. Lists of
//! records (schedules, slab breakdowns) get their own table underneath.

use finpilot_core::Value;
use std::collections::HashMap;

/// Display format for numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// Two decimal places, the way amounts are shown to users
    Money,
    /// Fixed decimal places
    Decimal(u32),
}

impl NumberFormat {
    fn places(self) -> u32 {
        match self {
            NumberFormat::Money => 2,
            NumberFormat::Decimal(places) => places,
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::Money
    }
}

/// Columns that identify a row and so lead a nested table
const LEADING_COLUMNS: [&str; 4] = ["period", "name", "asset", "slab"];

/// Result renderer
pub struct Renderer {
    format: NumberFormat,
}

impl Renderer {
    pub fn new() -> Self {
        Self { format: NumberFormat::default() }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    /// Render a calculator result. `field_order` lists the result fields in
    /// display order; fields it does not name follow alphabetically.
    pub fn render(&self, calculator: &str, value: &Value, field_order: &[&str]) -> String {
        let mut output = format!("## {}\n\n", calculator);

        let fields = match value {
            Value::Object(fields) => fields,
            Value::Error(e) => {
                output.push_str(&format!("**Error** `{}`: {}\n", e.code, e.message));
                if let Some(ref suggestion) = e.suggestion {
                    output.push_str(&format!("\n> {}\n", suggestion));
                }
                return output;
            }
            other => {
                output.push_str(&self.render_scalar(other));
                output.push('\n');
                return output;
            }
        };

        let mut nested = Vec::new();
        output.push_str("| field | value |\n");
        output.push_str("|-------|-------|\n");
        for key in Self::ordered_keys(fields, field_order) {
            let v = &fields[&key];
            match v {
                Value::List(rows) if rows.iter().any(|r| matches!(r, Value::Object(_))) => {
                    output.push_str(&format!("| {} | {} rows |\n", key, rows.len()));
                    nested.push((key, rows));
                }
                _ => output.push_str(&format!("| {} | {} |\n", key, self.render_scalar(v))),
            }
        }

        for (key, rows) in nested {
            output.push('\n');
            output.push_str(&format!("### {}\n\n", key));
            output.push_str(&self.render_rows(rows));
        }

        output
    }

    fn ordered_keys(fields: &HashMap<String, Value>, field_order: &[&str]) -> Vec<String> {
        let mut keys: Vec<String> = field_order
            .iter()
            .filter(|k| fields.contains_key(**k))
            .map(|k| k.to_string())
            .collect();
        let mut rest: Vec<String> = fields
            .keys()
            .filter(|k| !field_order.contains(&k.as_str()))
            .cloned()
            .collect();
        rest.sort();
        keys.extend(rest);
        keys
    }

    /// Table of records; columns from the union of their fields
    fn render_rows(&self, rows: &[Value]) -> String {
        let mut columns: Vec<&str> = rows
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|r| r.keys().map(String::as_str))
            .collect();
        columns.sort_unstable();
        columns.dedup();
        columns.sort_by_key(|c| LEADING_COLUMNS.iter().position(|l| l == c).unwrap_or(LEADING_COLUMNS.len()));

        let mut out = format!("| {} |\n", columns.join(" | "));
        out.push_str(&format!("|{}\n", "------|".repeat(columns.len())));
        for row in rows.iter().filter_map(Value::as_object) {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| row.get(*c).map(|v| self.render_scalar(v)).unwrap_or_default())
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }

    fn render_scalar(&self, value: &Value) -> String {
        match value {
            Value::Number(n) if n.is_integer() => n.as_decimal(0),
            Value::Number(n) => n.as_decimal(self.format.places()),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => if *b { "yes".to_string() } else { "no".to_string() },
            Value::Object(_) => "[Object]".to_string(),
            Value::List(l) => l.iter().map(|v| self.render_scalar(v)).collect::<Vec<_>>().join(", "),
            Value::Null => String::new(),
            Value::Error(e) => format!("#ERROR: {}", e.code),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
