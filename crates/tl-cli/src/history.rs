//! Shell history lookups through `atuin`.

use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tl_core::{Interval, SubEvent};

/// Output format passed to `atuin search`.
pub const HISTORY_FORMAT: &str = "{time}@@@{command}@@@{directory}";

const FIELD_SEPARATOR: &str = "@@@";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to run {binary}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history search failed: {stderr}")]
    Failed { stderr: String },

    #[error("malformed history line: {line}")]
    Malformed { line: String },

    #[error("invalid history timestamp: {value}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Queries shell history for the commands run in a time range.
#[derive(Debug, Clone)]
pub struct HistoryResolver {
    binary: PathBuf,
    session_id: String,
}

impl HistoryResolver {
    /// `session_id` is passed as `ATUIN_SESSION` so searches never attach to
    /// an interactive shell's session.
    pub fn new(binary: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            session_id: session_id.into(),
        }
    }

    /// Commands run in `[start, end]`, oldest first.
    pub fn search(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SubEvent>, HistoryError> {
        let output = Command::new(&self.binary)
            .arg("search")
            .arg("--after")
            .arg(start.to_rfc3339())
            .arg("--before")
            .arg(end.to_rfc3339())
            .arg("--format")
            .arg(HISTORY_FORMAT)
            .env("ATUIN_SESSION", &self.session_id)
            .output()
            .map_err(|source| HistoryError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        // An empty search exits non-zero without writing to stderr.
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() && !stderr.trim().is_empty() {
            return Err(HistoryError::Failed {
                stderr: stderr.trim().to_string(),
            });
        }

        parse_history(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses `atuin search` output in [`HISTORY_FORMAT`] into zero-length
/// events, one per command, sorted oldest first.
pub fn parse_history(output: &str) -> Result<Vec<SubEvent>, HistoryError> {
    let mut events = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.splitn(3, FIELD_SEPARATOR);
            let (Some(time), Some(command), Some(_directory)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(HistoryError::Malformed {
                    line: line.to_string(),
                });
            };
            let at = parse_time(time.trim())?;
            Ok(SubEvent::new(Interval::instant(at), command))
        })
        .collect::<Result<Vec<_>, _>>()?;

    events.sort_by_key(|event| event.interval.start());
    Ok(events)
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, HistoryError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|source| HistoryError::Timestamp {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_oldest_first() {
        let output = "\
2025-01-15 09:05:00@@@cargo test@@@/home/me/tl
2025-01-15T09:01:00+00:00@@@cargo build@@@/home/me/tl

";

        let events = parse_history(output).unwrap();

        let commands: Vec<_> = events.iter().map(|e| e.payload.as_str()).collect();
        assert_eq!(commands, vec!["cargo build", "cargo test"]);
        assert_eq!(events[0].interval.duration(), chrono::Duration::zero());
        assert_eq!(
            events[1].interval.start().to_rfc3339(),
            "2025-01-15T09:05:00+00:00"
        );
    }

    #[test]
    fn keeps_separator_inside_directory() {
        let events = parse_history("2025-01-15 09:05:00@@@ls@@@/tmp/@@@odd").unwrap();

        assert_eq!(events[0].payload, "ls");
    }

    #[test]
    fn empty_output_has_no_commands() {
        assert!(parse_history("").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = parse_history("just a command").unwrap_err();

        assert_eq!(err.to_string(), "malformed history line: just a command");
    }

    #[test]
    fn rejects_bad_timestamps() {
        let err = parse_history("yesterday@@@ls@@@/tmp").unwrap_err();

        assert!(matches!(err, HistoryError::Timestamp { .. }));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let resolver = HistoryResolver::new("/nonexistent/atuin", "session");
        let now = Utc::now();

        let err = resolver.search(now, now).unwrap_err();

        assert!(matches!(err, HistoryError::Spawn { .. }));
    }
}
