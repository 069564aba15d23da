use std::path::Path;
use std::time::Duration;

use crate::app::adb::runner::run_command_with_timeout;
use crate::app::error::AdbError;

pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|candidate| candidate.strip_suffix('"'))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|candidate| candidate.strip_suffix('\''))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

pub fn resolve_adb_program(config_command_path: &str) -> String {
    let normalized = normalize_command_path(config_command_path);
    if normalized.is_empty() {
        "adb".to_string()
    } else {
        normalized
    }
}

pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err("adb command is empty".to_string());
    }
    if program == "adb" {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err("adb path must point to an executable file".to_string());
    }
    if !path.exists() {
        return Err("adb executable not found at the configured path".to_string());
    }
    Ok(())
}

/// Liveness probe: runs `adb version` once and returns its first line.
/// This is the only version check the tool performs; everything past it
/// assumes a working bridge.
pub fn probe_adb(program: &str) -> Result<String, AdbError> {
    let output = run_command_with_timeout(
        program,
        &["version".to_string()],
        Duration::from_secs(5),
    )?;
    if output.exit_code.unwrap_or_default() != 0 {
        return Err(AdbError::NonZeroExit {
            code: output.exit_code.unwrap_or(-1),
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output
        .stdout
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}
