//! Event sink boundary.
//!
//! Registry code never writes log lines itself; it emits an [`Event`] and
//! the configured [`EventSink`] renders it.

use crate::{Error, config::ConfigError};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Mutex, PoisonError},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

///
/// Event
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    CatalogMatch {
        catalog: &'static str,
        label: String,
    },
    CatalogMismatch {
        catalog: &'static str,
        external: String,
        local: String,
    },
    DuplicateRejected {
        field: String,
        existing: String,
    },
    FieldDeleted {
        label: String,
        rows: usize,
    },
    FieldInserted {
        label: String,
    },
    GeneratorRenamed {
        field: String,
        generator: String,
    },
    LabelComputed {
        prefix: String,
        label: String,
    },
    Normalized {
        input: String,
        output: String,
    },
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CatalogMatch { catalog, label } => {
                write!(f, "catalog {catalog} lists field as {label}")
            }
            Self::CatalogMismatch {
                catalog,
                external,
                local,
            } => write!(
                f,
                "catalog {catalog} lists field as {external}, local label is {local}"
            ),
            Self::DuplicateRejected { field, existing } => {
                write!(f, "already in db: {field} as {existing}")
            }
            Self::FieldDeleted { label, rows } => write!(f, "field deleted: {label} ({rows} row)"),
            Self::FieldInserted { label } => write!(f, "field inserted as: {label}"),
            Self::GeneratorRenamed { field, generator } => {
                write!(f, "generator renamed to {generator}: {field}")
            }
            Self::LabelComputed { prefix, label } => {
                write!(f, "label computed: {label} (prefix {prefix})")
            }
            Self::Normalized { input, output } => write!(f, "normalized: {input} -> {output}"),
        }
    }
}

///
/// EventSink
///

pub trait EventSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn record(&self, event: &Event);
}

///
/// NullSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn record(&self, _: &Event) {}
}

///
/// StderrSink
///
/// One line per event on stderr, leaving stdout to command output.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl EventSink for StderrSink {
    fn name(&self) -> &'static str {
        "stderr"
    }

    fn record(&self, event: &Event) {
        eprintln!("{event}");
    }
}

///
/// FileSink
///
/// Append-only log file, one timestamped line per event, flushed as it is
/// written.
///

#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| ConfigError::Invalid {
                key: "log.path",
                message: format!("cannot open '{}': {err}", path.display()),
            })?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn record(&self, event: &Event) {
        let stamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_string());
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(err) = writeln!(file, "{stamp} {event}").and_then(|()| file.flush()) {
            eprintln!("[warn] event log write failed: {err}");
        }
    }
}

///
/// MemorySink
///
/// Keeps every event in memory.
///

#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl EventSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn record(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn events_render_one_line_each() {
        let events = [
            Event::LabelComputed {
                prefix: "2.2.8.".to_string(),
                label: "2.2.8.1".to_string(),
            },
            Event::FieldInserted {
                label: "2.2.8.1".to_string(),
            },
            Event::DuplicateRejected {
                field: "Rational Field".to_string(),
                existing: "1.1.1.1".to_string(),
            },
        ];
        let lines: Vec<String> = events.iter().map(ToString::to_string).collect();

        assert_eq!(
            lines,
            vec![
                "label computed: 2.2.8.1 (prefix 2.2.8.)",
                "field inserted as: 2.2.8.1",
                "already in db: Rational Field as 1.1.1.1",
            ]
        );
        assert!(lines.iter().all(|l| !l.contains('\n')));
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.record(&Event::FieldInserted {
            label: "a".to_string(),
        });
        sink.record(&Event::FieldDeleted {
            label: "a".to_string(),
            rows: 1,
        });

        assert_eq!(
            sink.lines(),
            vec!["field inserted as: a", "field deleted: a (1 row)"]
        );
    }

    #[test]
    fn file_sink_appends_timestamped_lines() {
        let path = std::env::temp_dir().join(format!("dynabase-sink-{}.log", std::process::id()));
        let _ = fs::remove_file(&path);

        for label in ["2.2.8.1", "2.2.12.1"] {
            let sink = FileSink::open(&path).unwrap();
            sink.record(&Event::FieldInserted {
                label: label.to_string(),
            });
        }

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" field inserted as: 2.2.8.1"));
        assert!(lines[1].ends_with(" field inserted as: 2.2.12.1"));

        fs::remove_file(&path).unwrap();
    }
}
