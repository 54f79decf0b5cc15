//! Output formatting for iotsim (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => print!("{}", to_csv(data)),
        }
    }

    /// Print a serializable value; tables fall back to key-value lines
    pub fn print_value<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
            ),
            OutputFormat::Csv => print!("{}", to_csv(std::slice::from_ref(data))),
            OutputFormat::Table => {
                if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(data) {
                    for (key, value) in map {
                        println!("{}: {}", key.bold(), format_json_value(&value));
                    }
                }
            }
        }
    }

    /// Print key-value pairs
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<String> = pairs.iter().map(|(k, _)| escape_csv(k)).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Render rows as CSV, header taken from the first row
fn to_csv<T: Serialize>(data: &[T]) -> String {
    let Some(first) = data.first() else {
        return String::new();
    };

    let mut out = String::new();
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(first) {
        let headers: Vec<String> = map.keys().cloned().collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for item in data {
            if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
                let values: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        row.get(h)
                            .map(|v| escape_csv(&format_json_value(v)))
                            .unwrap_or_default()
                    })
                    .collect();
                out.push_str(&values.join(","));
                out.push('\n');
            }
        }
    }
    out
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn format_json_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Render an optional value, "-" when absent
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Person display for people command
#[derive(Debug, Tabled, Serialize)]
pub struct PersonRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Name")]
    pub name: String,
}

/// Device display with selection mark
#[derive(Debug, Tabled, Serialize)]
pub struct DeviceRow {
    #[tabled(rename = "Sel")]
    pub selected: String,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Device ID")]
    pub device_id: String,
    #[tabled(rename = "Type")]
    pub device_type: String,
    #[tabled(rename = "Location")]
    pub location: String,
}

/// Data type display for types command
#[derive(Debug, Tabled, Serialize)]
pub struct DataTypeRow {
    #[tabled(rename = "Data Type")]
    pub data_type: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Unit")]
    pub unit: String,
    #[tabled(rename = "Min")]
    pub min: String,
    #[tabled(rename = "Max")]
    pub max: String,
    #[tabled(rename = "Per Day")]
    pub frequency: String,
}

/// Geofence place display for places command
#[derive(Debug, Tabled, Serialize)]
pub struct PlaceRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub place_type: String,
    #[tabled(rename = "Latitude")]
    pub latitude: String,
    #[tabled(rename = "Longitude")]
    pub longitude: String,
    #[tabled(rename = "Radius (m)")]
    pub radius: String,
}

/// Per-device counters for the run summary
#[derive(Debug, Tabled, Serialize)]
pub struct DeviceStatsRow {
    #[tabled(rename = "Device")]
    pub device: String,
    #[tabled(rename = "OK")]
    pub success: u64,
    #[tabled(rename = "Failed")]
    pub failed: u64,
    #[tabled(rename = "Total")]
    pub total: u64,
}
