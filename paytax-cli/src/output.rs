use paytax_core::Breakdown;
use serde::Serialize;
use tabled::{Table, builder::Builder};

use crate::cli::OutputFormat;

/// Result of one batch entry: the breakdown, or the error that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Ok(Breakdown),
    Err { error: String },
}

/// Anything a command can print.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Names(Vec<String>),
    Years(Vec<i32>),
    Breakdown(Breakdown),
    Batch(Vec<Outcome>),
}

impl Report {
    pub fn render(
        &self,
        format: OutputFormat,
    ) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Table => Ok(self.to_table()),
        }
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Report::Names(names) => serde_json::to_string_pretty(names),
            Report::Years(years) => serde_json::to_string_pretty(years),
            Report::Breakdown(breakdown) => serde_json::to_string_pretty(breakdown),
            Report::Batch(outcomes) => serde_json::to_string_pretty(outcomes),
        }
    }

    fn to_table(&self) -> String {
        match self {
            Report::Names(names) => list_table(names),
            Report::Years(years) => {
                list_table(&years.iter().map(i32::to_string).collect::<Vec<_>>())
            }
            Report::Breakdown(breakdown) => breakdown_table(breakdown),
            Report::Batch(outcomes) => outcomes
                .iter()
                .enumerate()
                .map(|(idx, outcome)| {
                    let body = match outcome {
                        Outcome::Ok(breakdown) => breakdown_table(breakdown),
                        Outcome::Err { error } => format!("error: {error}"),
                    };
                    format!("#{}\n{body}", idx + 1)
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

fn list_table(items: &[String]) -> String {
    if items.is_empty() {
        return "(empty)".to_string();
    }
    let mut builder = Builder::default();
    for item in items {
        builder.push_record([item.as_str()]);
    }
    Table::from(builder).to_string()
}

fn breakdown_table(breakdown: &Breakdown) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    builder.push_record(["country", breakdown.jurisdiction.display_name()]);
    builder.push_record(["year".to_string(), breakdown.year.to_string()]);
    builder.push_record(["is_resident".to_string(), breakdown.is_resident.to_string()]);
    for (name, value) in breakdown.fields() {
        builder.push_record([name.to_string(), value.to_string()]);
    }
    Table::from(builder).to_string()
}

/// The `{"error": ...}` object printed when a command fails.
pub fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
