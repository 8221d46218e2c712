//! Delimited input/output adapter around the validation engine.
//!
//! Input rows pass through untouched; each finalized address appends the
//! original columns (with the email column normalized) plus the validation
//! columns to `_results` and to exactly one of `_valid` / `_invalid`.

use std::path::{Path, PathBuf};

use csv::{StringRecord, Writer};

use crate::core::error::{AppError, Result};
use crate::verification::{ValidationOutcome, ValidationReason};

/// One input row: the raw email plus every original column.
#[derive(Debug, Clone)]
pub struct InputRow {
    pub email_raw: String,
    pub record: StringRecord,
}

/// Fully-read input file.
#[derive(Debug)]
pub struct InputFile {
    pub headers: StringRecord,
    pub email_index: usize,
    pub rows: Vec<InputRow>,
}

/// Reads the input file up front. The `email` column is required; all other
/// columns pass through unchanged.
pub fn read_input(path: &Path) -> Result<InputFile> {
    if !path.exists() {
        return Err(AppError::InputNotFound(path.display().to_string()));
    }
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::InputMalformed(format!("unreadable header row: {e}")))?
        .clone();
    let email_index = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("email"))
        .ok_or_else(|| {
            AppError::InputMalformed(format!(
                "missing required 'email' column in {}",
                path.display()
            ))
        })?;

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| AppError::InputMalformed(format!("row {}: {e}", line + 2)))?;
        let email_raw = record.get(email_index).unwrap_or_default().to_string();
        rows.push(InputRow { email_raw, record });
    }

    Ok(InputFile {
        headers,
        email_index,
        rows,
    })
}

/// Inserts a suffix before the extension: `out.csv` -> `out_valid.csv`.
fn derived_path(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    base.with_file_name(format!("{stem}{suffix}{ext}"))
}

/// Append-only writer for the three output files. Headers are written once,
/// at creation; records are flushed after every completed batch so a crash
/// never leaves a torn file beyond the final partial line.
pub struct ResultSink {
    email_index: usize,
    valid: Writer<std::fs::File>,
    invalid: Writer<std::fs::File>,
    results: Writer<std::fs::File>,
    pub valid_path: PathBuf,
    pub invalid_path: PathBuf,
    pub results_path: PathBuf,
}

const EXTRA_COLUMNS: [&str; 6] = [
    "email_original",
    "email_valid",
    "validation_reason",
    "format_valid",
    "domain_exists",
    "smtp_valid",
];

impl ResultSink {
    /// Opens the three writers. With `append` set (a resumed run), existing
    /// files keep the rows the interrupted run already emitted and the header
    /// is only written when a file is new or empty; otherwise the files are
    /// started fresh.
    pub fn create(
        output_base: &Path,
        headers: &StringRecord,
        email_index: usize,
        append: bool,
    ) -> Result<Self> {
        let valid_path = derived_path(output_base, "_valid");
        let invalid_path = derived_path(output_base, "_invalid");
        let results_path = derived_path(output_base, "_results");

        let mut header_row = StringRecord::new();
        for column in headers {
            header_row.push_field(column);
        }
        for column in EXTRA_COLUMNS {
            header_row.push_field(column);
        }

        let mut open = |path: &Path| -> Result<Writer<std::fs::File>> {
            let has_rows = append
                && std::fs::metadata(path)
                    .map(|meta| meta.len() > 0)
                    .unwrap_or(false);
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .append(append)
                .truncate(!append)
                .open(path)?;
            let mut writer = Writer::from_writer(file);
            if !has_rows {
                writer.write_record(&header_row)?;
            }
            Ok(writer)
        };

        Ok(Self {
            email_index,
            valid: open(&valid_path)?,
            invalid: open(&invalid_path)?,
            results: open(&results_path)?,
            valid_path,
            invalid_path,
            results_path,
        })
    }

    /// Emits one finalized outcome. `AlreadyProcessed` rows are bookkeeping
    /// only and never written, keeping `_valid` + `_invalid` an exact
    /// partition of `_results`.
    pub fn append(&mut self, row: &InputRow, outcome: &ValidationOutcome) -> Result<()> {
        if outcome.reason == ValidationReason::AlreadyProcessed {
            return Ok(());
        }

        let mut record = StringRecord::new();
        for (index, field) in row.record.iter().enumerate() {
            if index == self.email_index {
                record.push_field(&outcome.address);
            } else {
                record.push_field(field);
            }
        }
        record.push_field(&row.email_raw);
        record.push_field(if outcome.is_deliverable { "true" } else { "false" });
        record.push_field(&outcome.reason_text());
        record.push_field(if outcome.format_valid { "true" } else { "false" });
        record.push_field(if outcome.domain_has_mail_exchanger {
            "true"
        } else {
            "false"
        });
        record.push_field(if outcome.smtp_accepted { "true" } else { "false" });

        if outcome.is_deliverable {
            self.valid.write_record(&record)?;
        } else {
            self.invalid.write_record(&record)?;
        }
        self.results.write_record(&record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.valid.flush()?;
        self.invalid.flush()?;
        self.results.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_file(path: &Path, content: &str) {
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn derived_paths_insert_suffix_before_extension() {
        assert_eq!(
            derived_path(Path::new("out.csv"), "_valid"),
            PathBuf::from("out_valid.csv")
        );
        assert_eq!(
            derived_path(Path::new("dir/cleaned.csv"), "_results"),
            PathBuf::from("dir/cleaned_results.csv")
        );
        assert_eq!(
            derived_path(Path::new("bare"), "_invalid"),
            PathBuf::from("bare_invalid")
        );
    }

    #[test]
    fn read_input_requires_email_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.csv");
        write_file(&path, "name,phone\nalice,123\n");

        let err = read_input(&path).unwrap_err();
        assert!(matches!(err, AppError::InputMalformed(_)));
    }

    #[test]
    fn read_input_missing_file_is_not_found() {
        let err = read_input(Path::new("/nonexistent/in.csv")).unwrap_err();
        assert!(matches!(err, AppError::InputNotFound(_)));
    }

    #[test]
    fn read_input_passes_columns_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.csv");
        write_file(&path, "name,email\nAlice,Alice@X.com\nBob,bob@y.org\n");

        let input = read_input(&path).unwrap();
        assert_eq!(input.email_index, 1);
        assert_eq!(input.rows.len(), 2);
        assert_eq!(input.rows[0].email_raw, "Alice@X.com");
        assert_eq!(input.rows[0].record.get(0), Some("Alice"));
    }

    fn outcome(address: &str, deliverable: bool) -> ValidationOutcome {
        ValidationOutcome {
            address: address.to_string(),
            is_deliverable: deliverable,
            reason: if deliverable {
                ValidationReason::SmtpVerified
            } else {
                ValidationReason::InvalidFormat
            },
            detail: None,
            format_valid: deliverable,
            domain_has_mail_exchanger: deliverable,
            smtp_accepted: deliverable,
        }
    }

    #[test]
    fn sink_partitions_valid_and_invalid() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("out.csv");

        let headers = StringRecord::from(vec!["name", "email"]);
        let mut sink = ResultSink::create(&base, &headers, 1, false).unwrap();

        let good = InputRow {
            email_raw: "Good@X.com".to_string(),
            record: StringRecord::from(vec!["Alice", "Good@X.com"]),
        };
        let bad = InputRow {
            email_raw: "bad-format".to_string(),
            record: StringRecord::from(vec!["Bob", "bad-format"]),
        };
        sink.append(&good, &outcome("good@x.com", true)).unwrap();
        sink.append(&bad, &outcome("bad-format", false)).unwrap();
        sink.flush().unwrap();

        let valid = std::fs::read_to_string(&sink.valid_path).unwrap();
        let invalid = std::fs::read_to_string(&sink.invalid_path).unwrap();
        let results = std::fs::read_to_string(&sink.results_path).unwrap();

        assert!(valid.contains("good@x.com"));
        assert!(valid.contains("Good@X.com")); // email_original preserved
        assert!(!valid.contains("bad-format"));
        assert!(invalid.contains("bad-format"));
        assert!(results.contains("good@x.com") && results.contains("bad-format"));

        let header_line = results.lines().next().unwrap();
        assert_eq!(
            header_line,
            "name,email,email_original,email_valid,validation_reason,format_valid,domain_exists,smtp_valid"
        );
    }

    #[test]
    fn append_mode_keeps_prior_rows_and_single_header() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("out.csv");
        let headers = StringRecord::from(vec!["email"]);

        let first_row = InputRow {
            email_raw: "a@x.com".to_string(),
            record: StringRecord::from(vec!["a@x.com"]),
        };
        let mut sink = ResultSink::create(&base, &headers, 0, false).unwrap();
        sink.append(&first_row, &outcome("a@x.com", true)).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let second_row = InputRow {
            email_raw: "b@x.com".to_string(),
            record: StringRecord::from(vec!["b@x.com"]),
        };
        let mut sink = ResultSink::create(&base, &headers, 0, true).unwrap();
        sink.append(&second_row, &outcome("b@x.com", true)).unwrap();
        sink.flush().unwrap();

        let results = std::fs::read_to_string(&sink.results_path).unwrap();
        let lines: Vec<&str> = results.lines().collect();
        assert_eq!(lines.len(), 3); // one header, both runs' rows
        assert!(lines[0].starts_with("email,"));
        assert!(lines[1].contains("a@x.com"));
        assert!(lines[2].contains("b@x.com"));
    }

    #[test]
    fn append_mode_writes_header_to_fresh_file() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("out.csv");
        let headers = StringRecord::from(vec!["email"]);

        let sink = ResultSink::create(&base, &headers, 0, true).unwrap();
        drop(sink);

        let results = std::fs::read_to_string(dir.path().join("out_results.csv")).unwrap();
        assert!(results.starts_with("email,"));
    }

    #[test]
    fn already_processed_rows_are_not_written() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("out.csv");
        let headers = StringRecord::from(vec!["email"]);
        let mut sink = ResultSink::create(&base, &headers, 0, false).unwrap();

        let row = InputRow {
            email_raw: "dup@x.com".to_string(),
            record: StringRecord::from(vec!["dup@x.com"]),
        };
        let mut dup = outcome("dup@x.com", false);
        dup.reason = ValidationReason::AlreadyProcessed;
        sink.append(&row, &dup).unwrap();
        sink.flush().unwrap();

        let results = std::fs::read_to_string(&sink.results_path).unwrap();
        assert_eq!(results.lines().count(), 1); // header only
    }
}
