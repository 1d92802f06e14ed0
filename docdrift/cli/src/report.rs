//! Failure reports for terminal and JSON output.

use docdrift_lib::errors::{DocumentError, RunError};
use owo_colors::OwoColorize;
use serde_json::{Value, json};

fn fault(error: &DocumentError) -> &'static str {
    match error {
        DocumentError::Fetch(_) => "retrieval",
        DocumentError::Grammar(_) => "grammar",
        DocumentError::Drift(_) => "drift",
        DocumentError::Schema(_) => "schema",
    }
}

/// Formats a failed run for the terminal.
///
/// One block per failed document: the document name in bold, the fault class
/// in red and the message. Drift blocks also show the element position.
pub fn format_terminal(error: &RunError) -> String {
    let mut output = String::new();

    match error {
        RunError::Documents(failures) => {
            for failure in failures {
                output.push_str(&format!(
                    "{} {}\n",
                    failure.document.bold(),
                    format!("{} fault", fault(&failure.error)).red()
                ));
                match &failure.error {
                    DocumentError::Drift(drift) => {
                        output.push_str(&format!(
                            "  {} {}\n",
                            format!("element {}:", drift.position).dimmed(),
                            drift.kind
                        ));
                    }
                    other => output.push_str(&format!("  {other}\n")),
                }
            }
            output.push('\n');
            output.push_str(&format!(
                "{}\n",
                format!("Summary: {} document(s) failed", failures.len())
                    .red()
                    .bold()
            ));
        }
        other => {
            output.push_str(&format!("{}\n", other.to_string().red().bold()));
        }
    }

    output
}

/// Formats a failed run as JSON.
///
/// Drift faults keep their structure (expected and actual elements) so
/// tooling can diff them.
pub fn format_json(error: &RunError) -> Value {
    match error {
        RunError::Documents(failures) => {
            let documents: Vec<Value> = failures
                .iter()
                .map(|failure| {
                    let mut entry = json!({
                        "document": failure.document,
                        "fault": fault(&failure.error),
                        "message": failure.error.to_string(),
                    });
                    if let DocumentError::Drift(drift) = &failure.error {
                        entry["drift"] = serde_json::to_value(drift).unwrap_or(Value::Null);
                    }
                    entry
                })
                .collect();
            json!({ "status": "failed", "documents": documents })
        }
        RunError::Finalize(err) => json!({ "status": "failed", "finalize": err.to_string() }),
        RunError::Emit(err) => json!({ "status": "failed", "emit": err.to_string() }),
    }
}
