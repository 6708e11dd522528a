//! Handler for the `status` command.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::Mode;
use crate::error::Result;
use crate::infrastructure::status_file::StatusFile;

#[derive(Tabled)]
struct BoundaryRow {
    #[tabled(rename = "Timeframe")]
    timeframe: String,
    #[tabled(rename = "Live")]
    live: String,
    #[tabled(rename = "Paper")]
    paper: String,
}

/// Execute the status command.
pub fn execute(path: &Path, json: bool) -> Result<()> {
    if json {
        output::set_json(true);
    }

    if !path.exists() {
        if output::is_json() {
            output::json_output(json!({
                "command": "status",
                "status_file": path.display().to_string(),
                "status": "missing",
            }));
        } else {
            output::warning(&format!("Status file not found ({})", path.display()));
            if !output::is_quiet() {
                println!("  Run `cadence run` with `status_file` set to create it.");
            }
        }
        return Ok(());
    }

    let status = StatusFile::read(path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "status",
            "status_file": path.display().to_string(),
            "status": "ok",
            "snapshot": status,
        }));
        return Ok(());
    }

    display(&status);
    Ok(())
}

fn display(status: &StatusFile) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field(
        "Mode",
        match status.mode {
            Mode::Live => output::positive("live"),
            Mode::Paper => output::muted("paper"),
        },
    );
    output::field("PID", status.pid);
    output::field("Started", status.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    output::field("Updated", status.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    output::field(
        "Upstream",
        if status.upstream_connected {
            output::positive("connected")
        } else {
            output::negative("disconnected")
        },
    );

    output::section("Last runs");
    let rows: Vec<_> = status
        .timeframes
        .iter()
        .map(|tf| BoundaryRow {
            timeframe: tf.to_string(),
            live: boundary_label(status.last_run.get(tf).copied()),
            paper: boundary_label(status.paper_last_run.get(tf).copied()),
        })
        .collect();
    output::block(Table::new(rows));

    output::section("Runs");
    let runs = status.runs;
    output::field("Attempted", runs.attempted);
    output::field("Committed", runs.committed);
    output::field(
        "Unacked",
        if runs.unacknowledged > 0 {
            output::negative(runs.unacknowledged)
        } else {
            output::muted(0)
        },
    );
    output::field(
        "Failed",
        if runs.failed > 0 {
            output::negative(runs.failed)
        } else {
            output::muted(0)
        },
    );
    output::field("Skipped", runs.skipped);
}

fn boundary_label(boundary: Option<i64>) -> String {
    boundary
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_label_formats_millis_as_utc() {
        assert_eq!(boundary_label(Some(14_400_000 * 5)), "1970-01-01 20:00");
        assert_eq!(boundary_label(None), "-");
    }
}
