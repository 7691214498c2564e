//! Human-readable lines for batch events.

use ncmconv_core::{BatchSummary, ConversionResult};

pub fn format_result(result: &ConversionResult) -> String {
    match result {
        ConversionResult::Success {
            source_path,
            output_paths,
            warnings,
        } => {
            let outputs: Vec<String> = output_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            let mut line = format!("ok    {} -> {}", source_path.display(), outputs.join(", "));
            for warning in warnings {
                line.push_str(&format!("\n      warning: {warning}"));
            }
            line
        }
        ConversionResult::Failure {
            source_path,
            error_kind,
            message,
        } => format!("FAIL  {} [{}] {}", source_path.display(), error_kind, message),
    }
}

pub fn format_summary(summary: &BatchSummary, rejected: usize) -> String {
    let mut line = format!(
        "{}/{} converted, {} failed",
        summary.succeeded, summary.total, summary.failed
    );
    if rejected > 0 {
        line.push_str(&format!(", {rejected} skipped"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncmconv_core::FailureKind;

    #[test]
    fn test_success_line() {
        let result = ConversionResult::Success {
            source_path: "/m/a.ncm".into(),
            output_paths: vec!["/m/a.flac".into(), "/m/a.mp3".into()],
            warnings: vec![],
        };
        assert_eq!(format_result(&result), "ok    /m/a.ncm -> /m/a.flac, /m/a.mp3");
    }

    #[test]
    fn test_success_with_warning() {
        let result = ConversionResult::Success {
            source_path: "/m/a.ncm".into(),
            output_paths: vec!["/m/a.mp3".into()],
            warnings: vec!["tag write failed".to_string()],
        };
        let text = format_result(&result);
        assert!(text.starts_with("ok    /m/a.ncm -> /m/a.mp3"));
        assert!(text.ends_with("warning: tag write failed"));
    }

    #[test]
    fn test_failure_line() {
        let result = ConversionResult::failure("/m/b.ncm", FailureKind::Decode, "bad magic");
        let text = format_result(&result);
        assert!(text.starts_with("FAIL  /m/b.ncm ["));
        assert!(text.ends_with("bad magic"));
    }

    #[test]
    fn test_summary_line() {
        let summary = BatchSummary {
            total: 4,
            completed: 4,
            succeeded: 3,
            failed: 1,
        };
        assert_eq!(format_summary(&summary, 0), "3/4 converted, 1 failed");
        assert_eq!(format_summary(&summary, 2), "3/4 converted, 1 failed, 2 skipped");
    }
}
