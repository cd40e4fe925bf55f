//! Helpers shared by the `toucan` binary.

use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use toucan_core::{AppError, ErrorMetadata, LogLevel, OpaqueId};
use toucan_processing::{IntakeFile, MediaValidator};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Initialize tracing for CLI binaries.
///
/// `RUST_LOG` sets the filter (default `info`); `LOG_FORMAT=json` switches to
/// JSON lines on stderr.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Read files from disk for upload, guessing MIME types from their names
pub async fn read_intake_files<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Vec<IntakeFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = MediaValidator::content_type_for(&name).unwrap_or(FALLBACK_CONTENT_TYPE);
        files.push(IntakeFile::new(name, content_type, data.into()));
    }
    Ok(files)
}

pub fn parse_photo_ids(raw: &[String]) -> Result<Vec<OpaqueId>, AppError> {
    raw.iter().map(|id| OpaqueId::parse(id)).collect()
}

/// One-line explanation of an error for the terminal
pub fn describe_error(err: &AppError) -> String {
    let hint = match err {
        AppError::Unauthorized(_) => Some("Run `toucan login` and set TOUCAN_SESSION"),
        other => other.suggested_action(),
    };
    match hint {
        Some(hint) => format!("{} ({})", err.client_message(), hint),
        None => err.client_message(),
    }
}

/// What gets logged for a failed command
///
/// Sensitive errors keep their source chain out of production logs.
pub fn error_log_details(err: &AppError, production: bool) -> String {
    if production && err.is_sensitive() {
        err.client_message()
    } else {
        err.detailed_message()
    }
}

/// Log a failed command at the level the error asks for
pub fn log_error(err: &AppError, production: bool) {
    let details = error_log_details(err, production);
    let error_type = err.error_type();
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Error => tracing::error!(error_type, code, "{}", details),
        LogLevel::Warn => tracing::warn!(error_type, code, "{}", details),
        LogLevel::Debug => tracing::debug!(error_type, code, "{}", details),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_intake_files_guesses_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("Beach.JPG");
        let other = dir.path().join("notes.txt");
        std::fs::File::create(&jpg).unwrap().write_all(b"jpeg").unwrap();
        std::fs::File::create(&other).unwrap().write_all(b"text").unwrap();

        let files = read_intake_files(&[&jpg, &other]).await.unwrap();

        assert_eq!(files[0].name, "Beach.JPG");
        assert_eq!(files[0].content_type, "image/jpeg");
        assert_eq!(files[0].data.as_ref(), b"jpeg");
        assert_eq!(files[1].content_type, FALLBACK_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.jpg");
        assert!(read_intake_files(&[missing]).await.is_err());
    }

    #[test]
    fn test_parse_photo_ids() {
        let ids = parse_photo_ids(&["AbCdEfGh12".to_string()]).unwrap();
        assert_eq!(ids[0].as_str(), "AbCdEfGh12");
        assert!(parse_photo_ids(&["AbCdEfGh12".to_string(), "bad".to_string()]).is_err());
    }

    #[test]
    fn test_error_log_details_hide_sensitive_chain_in_production() {
        let err = AppError::from(anyhow::anyhow!("disk full").context("writing blob"));
        assert!(error_log_details(&err, false).contains("writing blob"));
        let redacted = error_log_details(&err, true);
        assert_eq!(redacted, "Internal error");

        let err = AppError::InvalidInput("Album name must not be empty".to_string());
        assert_eq!(
            error_log_details(&err, true),
            "Invalid input: Album name must not be empty"
        );
    }

    #[test]
    fn test_unauthorized_hint_mentions_login() {
        let msg = describe_error(&AppError::Unauthorized("Login required".to_string()));
        assert!(msg.contains("toucan login"), "{}", msg);
    }
}
