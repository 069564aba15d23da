use std::collections::BTreeSet;

use regex::Regex;

use crate::app::models::{ConnectionState, Device, PackageOrigin, UserAccount, UserRole};

/// Parsed `dumpsys package` facts for one package. Absent markers fall
/// back to the unremarkable defaults: enabled, user-installed. Many real
/// devices omit the markers precisely when the state is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageDump {
    pub enabled: bool,
    pub origin: PackageOrigin,
}

impl Default for PackageDump {
    fn default() -> Self {
        Self {
            enabled: true,
            origin: PackageOrigin::User,
        }
    }
}

/// Parses `adb devices -l` output. One device per line; a line whose
/// state token is unrecognized still yields a device with state
/// `Unknown` so the operator sees it.
pub fn parse_device_list(output: &str) -> Vec<Device> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                return None;
            }
            let mut device = Device::new(tokens[0], ConnectionState::parse(tokens[1]));
            for token in tokens.iter().skip(2) {
                if let Some(value) = token.strip_prefix("model:") {
                    device.model = value.replace('_', " ");
                }
            }
            Some(device)
        })
        .collect()
}

/// Parses `pm list packages` output with set semantics: identifiers are
/// trimmed and duplicates collapse to one. Returned sorted ascending.
pub fn parse_package_list(output: &str) -> Vec<String> {
    let mut packages = BTreeSet::new();
    for raw in output.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let name = line.strip_prefix("package:").unwrap_or(line).trim();
        if !name.is_empty() {
            packages.insert(name.to_string());
        }
    }
    packages.into_iter().collect()
}

/// Scans `dumpsys package <pkg>` text for the per-user enabled marker and
/// the system flag marker.
///
/// Enabled states follow the platform encoding on the `User <uid>:` line:
/// 0 (default) and 1 (enabled) count as enabled, anything else as
/// disabled. An absent marker means enabled.
pub fn parse_package_dump(output: &str, user_id: u32) -> PackageDump {
    let mut dump = PackageDump::default();
    let user_prefix = format!("User {user_id}:");

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(&user_prefix) {
            if let Some(state) = extract_number_after(trimmed, "enabled=") {
                dump.enabled = state <= 1;
            }
        }
        if is_flags_line(trimmed) && has_system_flag(trimmed) {
            dump.origin = PackageOrigin::System;
        }
    }
    dump
}

fn is_flags_line(line: &str) -> bool {
    line.starts_with("flags=[") || line.starts_with("pkgFlags=[")
}

fn has_system_flag(line: &str) -> bool {
    let Some(start) = line.find('[') else {
        return false;
    };
    let Some(end) = line.rfind(']') else {
        return false;
    };
    if end <= start {
        return false;
    }
    line[start + 1..end]
        .split_whitespace()
        .any(|flag| flag == "SYSTEM")
}

fn extract_number_after(line: &str, marker: &str) -> Option<u32> {
    let tail = &line[line.find(marker)? + marker.len()..];
    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Extracts every user record from `pm list users` output. Lines without
/// a `UserInfo{<id>:<name>:…}` record are skipped, never fatal.
pub fn parse_user_list(output: &str) -> Vec<UserAccount> {
    let Ok(pattern) = Regex::new(r"UserInfo\{(\d+):([^:}]*)") else {
        return Vec::new();
    };
    output
        .lines()
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            let id: u32 = caps[1].parse().ok()?;
            Some(UserAccount {
                id,
                role: role_for(id, &caps[2]),
            })
        })
        .collect()
}

fn role_for(id: u32, name: &str) -> UserRole {
    let lower = name.to_lowercase();
    if lower.contains("guest") {
        UserRole::Guest
    } else if lower.contains("work") || lower.contains("managed") {
        UserRole::WorkProfile
    } else if id == 0 {
        UserRole::Owner
    } else {
        UserRole::Secondary
    }
}

/// Best-effort size extraction from a `du`-style line ("25M\t/path").
/// Returns megabytes, or `None` when the line is absent or garbled;
/// size is advisory only and never worth failing a catalog load over.
pub fn parse_size(output: &str) -> Option<f64> {
    let line = output.lines().find(|line| !line.trim().is_empty())?;
    let token = line.split_whitespace().next()?;

    let (number_part, unit) = match token.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&token[..token.len() - 1], Some(c)),
        _ => (token, None),
    };
    let value: f64 = number_part.parse().ok()?;

    let mb = match unit {
        Some('M') | Some('m') => value,
        Some('G') | Some('g') => value * 1024.0,
        Some('K') | Some('k') => value / 1000.0,
        None => value / 1000.0,
        Some(_) => return None,
    };
    Some((mb * 100.0).round() / 100.0)
}

/// Resolves the install directory from `pm path <pkg>` output by locating
/// the base.apk entry.
pub fn parse_package_path(output: &str) -> Option<String> {
    for line in output.lines() {
        let trimmed = line.trim();
        let Some(path) = trimmed.strip_prefix("package:") else {
            continue;
        };
        if let Some(dir) = path.strip_suffix("/base.apk") {
            return Some(dir.to_string());
        }
    }
    None
}
