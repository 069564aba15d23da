use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::error::ReportError;
use crate::app::models::{Device, EngineState, OperationResult};

/// Writes one audit file per batch operation. Files are write-once:
/// a name collision fails loudly instead of overwriting history.
pub struct ReportWriter {
    reports_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn write(&self, device: &Device, result: &OperationResult) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.reports_dir)?;
        let path = self.reports_dir.join(report_filename(device, result));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::AlreadyExists {
                    ReportError::AlreadyExists {
                        path: path.display().to_string(),
                    }
                } else {
                    ReportError::Io(err)
                }
            })?;
        file.write_all(render_markdown(device, result).as_bytes())?;
        Ok(path)
    }
}

/// `<deviceId>-<compact timestamp>.md`, derived entirely from the result
/// so the name is stable for a given operation.
pub fn report_filename(device: &Device, result: &OperationResult) -> String {
    format!(
        "{}-{}.md",
        sanitize_component(&device.id),
        result.started_at.format("%Y%m%d-%H%M%S")
    )
}

/// Device ids can carry `:` (tcp endpoints) and other separators that
/// filesystems dislike.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Pure rendering: identical inputs always produce byte-identical text.
pub fn render_markdown(device: &Device, result: &OperationResult) -> String {
    let action = result.request.action.label();
    let status = match result.state {
        EngineState::Completed => "Completed",
        EngineState::Aborted => "Aborted (partial results)",
        EngineState::Idle | EngineState::Running => "Unknown",
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# App Freeze Report: {action}"));
    lines.push(String::new());
    lines.push(format!(
        "**Started:** {}",
        result.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(format!(
        "**Finished:** {}",
        result.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(format!("**Status:** {status}"));
    lines.push(String::new());

    lines.push("## Device".to_string());
    lines.push(String::new());
    lines.push(format!("- **Device ID:** {}", device.id));
    lines.push(format!("- **Name:** {}", device.display_name()));
    if !device.manufacturer.is_empty() {
        lines.push(format!("- **Manufacturer:** {}", device.manufacturer));
    }
    if !device.model.is_empty() {
        lines.push(format!("- **Model:** {}", device.model));
    }
    if !device.android_version.is_empty() {
        lines.push(format!("- **Android Version:** {}", device.android_version));
    }
    if device.sdk_level > 0 {
        lines.push(format!("- **SDK Level:** {}", device.sdk_level));
    }
    lines.push(String::new());

    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push(format!("- **Action:** {action}"));
    lines.push(format!("- **Users:** {}", result.request.user_ids.len()));
    lines.push(format!("- **Attempted:** {}", result.attempted()));
    lines.push(format!("- **Succeeded:** {}", result.succeeded()));
    lines.push(format!("- **Failed:** {}", result.failed()));
    lines.push(String::new());

    lines.push("## Results".to_string());
    lines.push(String::new());
    lines.push("| Status | User | Package | Message |".to_string());
    lines.push("|--------|------|---------|---------|".to_string());
    for outcome in &result.outcomes {
        let status = if outcome.succeeded { "✓" } else { "✗" };
        let message = outcome
            .message
            .as_deref()
            .unwrap_or("")
            .replace('\n', " ")
            .replace('|', "\\|");
        lines.push(format!(
            "| {status} | {} | {} | {message} |",
            outcome.user_id, outcome.package
        ));
    }
    lines.push(String::new());

    let failures: Vec<_> = result.outcomes.iter().filter(|o| !o.succeeded).collect();
    if !failures.is_empty() {
        lines.push("## Failed Operations".to_string());
        lines.push(String::new());
        for outcome in failures {
            lines.push(format!(
                "### {} (user {})",
                outcome.package, outcome.user_id
            ));
            lines.push(String::new());
            lines.push(format!(
                "**Message:** {}",
                outcome.message.as_deref().unwrap_or("Unknown error")
            ));
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{
        ActionKind, ConnectionState, OperationOutcome, OperationRequest,
    };
    use chrono::{TimeZone, Utc};

    fn device() -> Device {
        let mut device = Device::new("192.168.1.5:5555", ConnectionState::Device);
        device.model = "Pixel 7".to_string();
        device.manufacturer = "Google".to_string();
        device.android_version = "14".to_string();
        device.sdk_level = 34;
        device
    }

    fn result(state: EngineState, outcomes: Vec<OperationOutcome>) -> OperationResult {
        OperationResult {
            request: OperationRequest {
                device_id: "192.168.1.5:5555".to_string(),
                action: ActionKind::Disable,
                packages: vec!["com.a".to_string(), "com.b".to_string()],
                user_ids: vec![0, 10],
            },
            outcomes,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 9).unwrap(),
            state,
        }
    }

    fn outcome(user_id: u32, package: &str, succeeded: bool) -> OperationOutcome {
        OperationOutcome {
            user_id,
            package: package.to_string(),
            succeeded,
            message: if succeeded {
                None
            } else {
                Some("Failure [not found]".to_string())
            },
        }
    }

    #[test]
    fn filename_is_deterministic_and_filesystem_safe() {
        let name = report_filename(&device(), &result(EngineState::Completed, vec![]));
        assert_eq!(name, "192.168.1.5_5555-20240501-120000.md");
    }

    #[test]
    fn rendering_is_byte_identical_for_identical_inputs() {
        let result = result(
            EngineState::Completed,
            vec![outcome(0, "com.a", true), outcome(10, "com.b", false)],
        );
        let first = render_markdown(&device(), &result);
        let second = render_markdown(&device(), &result);
        assert_eq!(first, second);
    }

    #[test]
    fn report_contains_rows_totals_and_failure_detail() {
        let rendered = render_markdown(
            &device(),
            &result(
                EngineState::Completed,
                vec![outcome(0, "com.a", true), outcome(10, "com.b", false)],
            ),
        );
        assert!(rendered.contains("# App Freeze Report: Disable"));
        assert!(rendered.contains("| ✓ | 0 | com.a |  |"));
        assert!(rendered.contains("| ✗ | 10 | com.b | Failure [not found] |"));
        assert!(rendered.contains("- **Attempted:** 2"));
        assert!(rendered.contains("- **Succeeded:** 1"));
        assert!(rendered.contains("- **Failed:** 1"));
        assert!(rendered.contains("### com.b (user 10)"));
    }

    #[test]
    fn aborted_partial_result_still_renders_its_rows() {
        let rendered = render_markdown(
            &device(),
            &result(
                EngineState::Aborted,
                vec![outcome(0, "com.a", true), outcome(0, "com.b", true)],
            ),
        );
        assert!(rendered.contains("**Status:** Aborted (partial results)"));
        assert_eq!(rendered.matches("| ✓ |").count(), 2);
    }

    #[test]
    fn write_creates_file_and_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = ReportWriter::new(dir.path());
        let result = result(EngineState::Completed, vec![outcome(0, "com.a", true)]);

        let path = writer.write(&device(), &result).expect("first write");
        assert!(path.exists());
        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(written, render_markdown(&device(), &result));

        let err = writer
            .write(&device(), &result)
            .expect_err("second write must fail");
        assert!(matches!(err, ReportError::AlreadyExists { .. }));
        assert_eq!(fs::read_to_string(&path).expect("unchanged"), written);
    }
}
