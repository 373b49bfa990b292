//! `validate` command.

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ScenarioLimits, load_scenario};
use crate::error::{ConfigError, MediaUnlockError, ValidationIssue};

/// Validates every scenario file in `args`.
///
/// # Errors
///
/// Returns the first file's [`ConfigError`] after reporting all files, or a
/// validation error for warnings when `--strict` is set.
pub fn run(args: &ValidateArgs) -> Result<(), MediaUnlockError> {
    let limits = ScenarioLimits::default();
    let mut first_error: Option<ConfigError> = None;
    let mut results = Vec::new();

    for file in &args.files {
        match load_scenario(file, &limits) {
            Ok(loaded) if args.strict && !loaded.warnings.is_empty() => {
                results.push(report(&file.display().to_string(), false, &loaded.warnings));
                first_error.get_or_insert(ConfigError::ValidationError {
                    path: file.display().to_string(),
                    errors: loaded.warnings,
                });
            }
            Ok(loaded) => {
                results.push(report(&file.display().to_string(), true, &loaded.warnings));
            }
            Err(e) => {
                let issues = match &e {
                    ConfigError::ValidationError { errors, .. } => errors.clone(),
                    _ => Vec::new(),
                };
                let mut entry = report(&file.display().to_string(), false, &issues);
                if issues.is_empty() {
                    entry.message = Some(e.to_string());
                }
                results.push(entry);
                first_error.get_or_insert(e);
            }
        }
    }

    match args.format {
        OutputFormat::Human => {
            for result in &results {
                let status = if result.valid { "ok" } else { "FAILED" };
                println!("{}: {status}", result.file);
                for line in &result.issues {
                    println!("  {line}");
                }
                if let Some(message) = &result.message {
                    println!("  {message}");
                }
            }
        }
        OutputFormat::Json => {
            let value: Vec<_> = results
                .iter()
                .map(|r| {
                    json!({
                        "file": r.file,
                        "valid": r.valid,
                        "issues": r.issues,
                        "message": r.message,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

struct FileReport {
    file: String,
    valid: bool,
    issues: Vec<String>,
    message: Option<String>,
}

fn report(file: &str, valid: bool, issues: &[ValidationIssue]) -> FileReport {
    FileReport {
        file: file.to_string(),
        valid,
        issues: issues.iter().map(ToString::to_string).collect(),
        message: None,
    }
}
