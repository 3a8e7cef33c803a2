use serde_json::{json, Value};
use thiserror::Error;

use crate::cli::OutputFormat;

/// A failure that has already been shown through [`output_error`]; the binary
/// only sets the exit status for it.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ReportedError(pub String);

/// Prints the failure and returns the matching [`ReportedError`].
pub fn fail(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Error {
    if let Err(e) = output_error(output_format, message, error_code) {
        return e;
    }
    ReportedError(message.to_string()).into()
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(data_value) = data {
                for line in text_lines(&data_value) {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// `key: value` lines for an object; anything else prints as compact JSON.
fn text_lines(data: &Value) -> Vec<String> {
    match data {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{}: {}", key, s),
                other => format!("{}: {}", key, other),
            })
            .collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    }
}
