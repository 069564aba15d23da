use std::collections::BTreeSet;

use crate::app::engine::ProgressEvent;
use crate::app::models::{ActionKind, AppPackage, Device, OperationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    DeviceSelect,
    AppList,
    Confirm,
    Execute,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    All,
    Enabled,
    Disabled,
    User,
    System,
}

impl FilterMode {
    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Enabled => "enabled",
            FilterMode::Disabled => "disabled",
            FilterMode::User => "user",
            FilterMode::System => "system",
        }
    }
}

/// Everything the host loop can feed into the state machine: operator
/// input already mapped to intent, plus completion notices for the work
/// an `Effect` asked the host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Up,
    Down,
    Top,
    Bottom,
    Select,
    ToggleMark,
    SelectAll,
    ClearMarks,
    RequestAction(ActionKind),
    Confirm,
    Cancel,
    Back,
    Refresh,
    ToggleHelp,
    Quit,
    FilterStart,
    FilterChar(char),
    FilterBackspace,
    FilterAccept,
    FilterClear,
    SetFilterMode(FilterMode),
    DevicesLoaded(Vec<Device>),
    DeviceLoadFailed(String),
    AppsLoaded { apps: Vec<AppPackage>, warnings: usize },
    AppLoadFailed(String),
    ExecutionFinished {
        result: OperationResult,
        report_path: Option<String>,
        report_error: Option<String>,
    },
}

/// The frozen inputs for one engine run, snapshotted at confirmation.
/// Later selection toggles cannot reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRun {
    pub device_id: String,
    pub action: ActionKind,
    pub packages: Vec<String>,
}

/// Work the host loop must perform after a transition. At most one per
/// input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    LoadDevices,
    LoadApps { device_id: String, refresh: bool },
    Execute(PendingRun),
    Quit,
}

#[derive(Debug)]
pub struct NavState {
    pub screen: Screen,
    pub help_visible: bool,
    pub status_text: String,

    pub devices: Vec<Device>,
    pub device_cursor: usize,
    pub selected_device: Option<Device>,

    pub apps: Vec<AppPackage>,
    pub warning_count: usize,
    pub app_cursor: usize,
    pub selection: BTreeSet<String>,
    pub filter_text: String,
    pub filter_mode: FilterMode,
    pub filter_input: bool,

    pub pending_action: Option<ActionKind>,
    pub progress: Vec<ProgressEvent>,
    pub last_result: Option<OperationResult>,
    pub report_path: Option<String>,
    pub report_error: Option<String>,
}

impl NavState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Main,
            help_visible: false,
            status_text: "Scanning for devices...".to_string(),
            devices: Vec::new(),
            device_cursor: 0,
            selected_device: None,
            apps: Vec::new(),
            warning_count: 0,
            app_cursor: 0,
            selection: BTreeSet::new(),
            filter_text: String::new(),
            filter_mode: FilterMode::All,
            filter_input: false,
            pending_action: None,
            progress: Vec::new(),
            last_result: None,
            report_path: None,
            report_error: None,
        }
    }

    pub fn filtered_apps(&self) -> Vec<&AppPackage> {
        let query = self.filter_text.to_lowercase();
        self.apps
            .iter()
            .filter(|app| query.is_empty() || app.package.to_lowercase().contains(&query))
            .filter(|app| match self.filter_mode {
                FilterMode::All => true,
                FilterMode::Enabled => app.enabled,
                FilterMode::Disabled => !app.enabled,
                FilterMode::User => !app.is_system(),
                FilterMode::System => app.is_system(),
            })
            .collect()
    }
}

impl Default for NavState {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies one event to the navigation state and reports what the host
/// must do next. Pure with respect to the outside world: no I/O here.
pub fn transition(state: &mut NavState, event: NavEvent) -> Effect {
    // The help overlay swallows everything until it is dismissed, then
    // returns to the screen it covered.
    if state.help_visible {
        if matches!(event, NavEvent::ToggleHelp | NavEvent::Back | NavEvent::Quit) {
            state.help_visible = false;
        }
        return Effect::None;
    }
    if matches!(event, NavEvent::ToggleHelp) {
        if state.screen != Screen::Execute {
            state.help_visible = true;
        }
        return Effect::None;
    }

    match state.screen {
        Screen::Main => main_transition(state, event),
        Screen::DeviceSelect => device_select_transition(state, event),
        Screen::AppList => app_list_transition(state, event),
        Screen::Confirm => confirm_transition(state, event),
        Screen::Execute => execute_transition(state, event),
        Screen::Summary => summary_transition(state, event),
    }
}

fn main_transition(state: &mut NavState, event: NavEvent) -> Effect {
    match event {
        NavEvent::DevicesLoaded(devices) => apply_discovery(state, devices),
        NavEvent::DeviceLoadFailed(message) => {
            state.status_text = message;
            Effect::None
        }
        NavEvent::AppsLoaded { apps, warnings } => apply_apps(state, apps, warnings),
        NavEvent::AppLoadFailed(message) => {
            state.status_text = message;
            state.selected_device = None;
            Effect::None
        }
        NavEvent::Refresh => Effect::LoadDevices,
        NavEvent::Select if !state.devices.is_empty() => {
            state.screen = Screen::DeviceSelect;
            Effect::None
        }
        NavEvent::Quit => Effect::Quit,
        _ => Effect::None,
    }
}

fn apply_discovery(state: &mut NavState, devices: Vec<Device>) -> Effect {
    state.devices = devices;
    state.device_cursor = 0;
    let ready: Vec<&Device> = state.devices.iter().filter(|d| d.state.is_ready()).collect();

    if ready.len() == 1 && state.devices.len() == 1 {
        let device = ready[0].clone();
        state.status_text = format!("Loading apps from {}...", device.display_name());
        state.selected_device = Some(device.clone());
        state.selection.clear();
        state.apps.clear();
        return Effect::LoadApps {
            device_id: device.id,
            refresh: false,
        };
    }
    if state.devices.is_empty() {
        state.status_text =
            "No devices found. Connect a device with USB debugging enabled, then press r"
                .to_string();
        state.screen = Screen::Main;
        return Effect::None;
    }
    state.status_text = format!("{} device(s) found", state.devices.len());
    state.screen = Screen::DeviceSelect;
    Effect::None
}

fn device_select_transition(state: &mut NavState, event: NavEvent) -> Effect {
    match event {
        NavEvent::Up => {
            state.device_cursor = state.device_cursor.saturating_sub(1);
            Effect::None
        }
        NavEvent::Down => {
            if !state.devices.is_empty() {
                state.device_cursor = (state.device_cursor + 1).min(state.devices.len() - 1);
            }
            Effect::None
        }
        NavEvent::Top => {
            state.device_cursor = 0;
            Effect::None
        }
        NavEvent::Bottom => {
            state.device_cursor = state.devices.len().saturating_sub(1);
            Effect::None
        }
        NavEvent::Select => {
            let Some(device) = state.devices.get(state.device_cursor).cloned() else {
                return Effect::None;
            };
            if !device.state.is_ready() {
                state.status_text = format!(
                    "{} is {} and cannot be used",
                    device.id,
                    device.state.label()
                );
                return Effect::None;
            }
            let device_changed = state
                .selected_device
                .as_ref()
                .map(|d| d.id != device.id)
                .unwrap_or(true);
            if device_changed {
                state.selection.clear();
                state.apps.clear();
            }
            state.status_text = format!("Loading apps from {}...", device.display_name());
            state.selected_device = Some(device.clone());
            Effect::LoadApps {
                device_id: device.id,
                refresh: false,
            }
        }
        NavEvent::DevicesLoaded(devices) => apply_discovery(state, devices),
        NavEvent::AppsLoaded { apps, warnings } => apply_apps(state, apps, warnings),
        NavEvent::AppLoadFailed(message) => {
            state.status_text = message;
            state.selected_device = None;
            Effect::None
        }
        NavEvent::Refresh => Effect::LoadDevices,
        NavEvent::Back => {
            state.screen = Screen::Main;
            Effect::None
        }
        NavEvent::Quit => Effect::Quit,
        _ => Effect::None,
    }
}

fn apply_apps(state: &mut NavState, apps: Vec<AppPackage>, warnings: usize) -> Effect {
    // The selection may only reference packages in the current catalog.
    let names: BTreeSet<&str> = apps.iter().map(|a| a.package.as_str()).collect();
    state.selection.retain(|pkg| names.contains(pkg.as_str()));

    state.apps = apps;
    state.warning_count = warnings;
    state.app_cursor = 0;
    state.status_text = if warnings > 0 {
        format!(
            "{} apps loaded ({} with degraded info)",
            state.apps.len(),
            warnings
        )
    } else {
        format!("{} apps loaded", state.apps.len())
    };
    state.screen = Screen::AppList;
    Effect::None
}

fn app_list_transition(state: &mut NavState, event: NavEvent) -> Effect {
    if state.filter_input {
        match event {
            NavEvent::FilterChar(c) => {
                state.filter_text.push(c);
                state.app_cursor = 0;
            }
            NavEvent::FilterBackspace => {
                state.filter_text.pop();
                state.app_cursor = 0;
            }
            NavEvent::FilterAccept => state.filter_input = false,
            NavEvent::FilterClear => {
                state.filter_input = false;
                state.filter_text.clear();
                state.app_cursor = 0;
            }
            _ => {}
        }
        return Effect::None;
    }

    match event {
        NavEvent::Up => {
            state.app_cursor = state.app_cursor.saturating_sub(1);
            Effect::None
        }
        NavEvent::Down => {
            let count = state.filtered_apps().len();
            if count > 0 {
                state.app_cursor = (state.app_cursor + 1).min(count - 1);
            }
            Effect::None
        }
        NavEvent::Top => {
            state.app_cursor = 0;
            Effect::None
        }
        NavEvent::Bottom => {
            state.app_cursor = state.filtered_apps().len().saturating_sub(1);
            Effect::None
        }
        NavEvent::ToggleMark => {
            let package = state
                .filtered_apps()
                .get(state.app_cursor)
                .map(|app| app.package.clone());
            if let Some(package) = package {
                if !state.selection.remove(&package) {
                    state.selection.insert(package);
                }
            }
            Effect::None
        }
        NavEvent::SelectAll => {
            let packages: Vec<String> = state
                .filtered_apps()
                .iter()
                .map(|app| app.package.clone())
                .collect();
            state.selection.extend(packages);
            Effect::None
        }
        NavEvent::ClearMarks => {
            state.selection.clear();
            Effect::None
        }
        NavEvent::RequestAction(action) => {
            // The action key with an empty selection is a no-op.
            if state.selection.is_empty() {
                state.status_text = "Nothing selected".to_string();
                return Effect::None;
            }
            state.pending_action = Some(action);
            state.screen = Screen::Confirm;
            Effect::None
        }
        NavEvent::FilterStart => {
            state.filter_input = true;
            Effect::None
        }
        NavEvent::FilterClear => {
            state.filter_text.clear();
            state.app_cursor = 0;
            Effect::None
        }
        NavEvent::SetFilterMode(mode) => {
            state.filter_mode = if state.filter_mode == mode {
                FilterMode::All
            } else {
                mode
            };
            state.app_cursor = 0;
            Effect::None
        }
        NavEvent::Refresh => {
            let Some(device) = state.selected_device.clone() else {
                return Effect::None;
            };
            state.status_text = "Refreshing app list...".to_string();
            Effect::LoadApps {
                device_id: device.id,
                refresh: true,
            }
        }
        NavEvent::AppsLoaded { apps, warnings } => apply_apps(state, apps, warnings),
        NavEvent::AppLoadFailed(message) => {
            state.status_text = message;
            Effect::None
        }
        NavEvent::Back => {
            // Leaving AppList never clears the selection.
            state.screen = Screen::DeviceSelect;
            Effect::None
        }
        NavEvent::Quit => Effect::Quit,
        _ => Effect::None,
    }
}

fn confirm_transition(state: &mut NavState, event: NavEvent) -> Effect {
    match event {
        NavEvent::Confirm => {
            let (Some(action), Some(device)) =
                (state.pending_action, state.selected_device.clone())
            else {
                state.screen = Screen::AppList;
                return Effect::None;
            };
            // Freeze the selection: this vector is the request's package
            // list; later toggles cannot touch it.
            let packages: Vec<String> = state.selection.iter().cloned().collect();
            state.progress.clear();
            state.last_result = None;
            state.report_path = None;
            state.report_error = None;
            state.screen = Screen::Execute;
            Effect::Execute(PendingRun {
                device_id: device.id,
                action,
                packages,
            })
        }
        NavEvent::Cancel | NavEvent::Back => {
            // Cancellation leaves the selection untouched.
            state.pending_action = None;
            state.screen = Screen::AppList;
            Effect::None
        }
        _ => Effect::None,
    }
}

fn execute_transition(state: &mut NavState, event: NavEvent) -> Effect {
    match event {
        NavEvent::ExecutionFinished {
            result,
            report_path,
            report_error,
        } => {
            state.status_text = result.summary_line();
            state.last_result = Some(result);
            state.report_path = report_path;
            state.report_error = report_error;
            state.pending_action = None;
            state.selection.clear();
            state.screen = Screen::Summary;
            Effect::None
        }
        // No operator input is accepted while executing; the forced-quit
        // path is handled by the host through the engine's cancel flag.
        _ => Effect::None,
    }
}

fn summary_transition(state: &mut NavState, event: NavEvent) -> Effect {
    match event {
        NavEvent::Back | NavEvent::Select => {
            let Some(device) = state.selected_device.clone() else {
                state.screen = Screen::Main;
                return Effect::None;
            };
            state.screen = Screen::AppList;
            state.status_text = "Refreshing app list...".to_string();
            Effect::LoadApps {
                device_id: device.id,
                refresh: true,
            }
        }
        NavEvent::Quit => Effect::Quit,
        _ => Effect::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{
        ConnectionState, EngineState, OperationOutcome, OperationRequest, PackageOrigin,
    };
    use chrono::{TimeZone, Utc};

    fn device(id: &str, state: ConnectionState) -> Device {
        Device::new(id, state)
    }

    fn app(package: &str, enabled: bool, origin: PackageOrigin) -> AppPackage {
        AppPackage {
            package: package.to_string(),
            enabled,
            origin,
            size_mb: None,
        }
    }

    fn state_on_app_list() -> NavState {
        let mut state = NavState::new();
        transition(
            &mut state,
            NavEvent::DevicesLoaded(vec![device("ABC", ConnectionState::Device)]),
        );
        transition(
            &mut state,
            NavEvent::AppsLoaded {
                apps: vec![
                    app("com.a", true, PackageOrigin::User),
                    app("com.b", false, PackageOrigin::System),
                ],
                warnings: 0,
            },
        );
        state
    }

    fn finished_result() -> OperationResult {
        OperationResult {
            request: OperationRequest {
                device_id: "ABC".to_string(),
                action: ActionKind::Disable,
                packages: vec!["com.a".to_string()],
                user_ids: vec![0],
            },
            outcomes: vec![OperationOutcome {
                user_id: 0,
                package: "com.a".to_string(),
                succeeded: true,
                message: None,
            }],
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 2).unwrap(),
            state: EngineState::Completed,
        }
    }

    #[test]
    fn single_ready_device_goes_straight_to_app_loading() {
        let mut state = NavState::new();
        let effect = transition(
            &mut state,
            NavEvent::DevicesLoaded(vec![device("ABC", ConnectionState::Device)]),
        );
        assert_eq!(
            effect,
            Effect::LoadApps {
                device_id: "ABC".to_string(),
                refresh: false
            }
        );
        assert_eq!(state.screen, Screen::Main);

        transition(
            &mut state,
            NavEvent::AppsLoaded {
                apps: vec![app("com.a", true, PackageOrigin::User)],
                warnings: 0,
            },
        );
        assert_eq!(state.screen, Screen::AppList);
    }

    #[test]
    fn multiple_devices_go_to_device_select() {
        let mut state = NavState::new();
        let effect = transition(
            &mut state,
            NavEvent::DevicesLoaded(vec![
                device("ABC", ConnectionState::Device),
                device("DEF", ConnectionState::Device),
            ]),
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(state.screen, Screen::DeviceSelect);
    }

    #[test]
    fn single_unauthorized_device_is_shown_not_auto_selected() {
        let mut state = NavState::new();
        transition(
            &mut state,
            NavEvent::DevicesLoaded(vec![device("ABC", ConnectionState::Unauthorized)]),
        );
        assert_eq!(state.screen, Screen::DeviceSelect);

        let effect = transition(&mut state, NavEvent::Select);
        assert_eq!(effect, Effect::None);
        assert_eq!(state.screen, Screen::DeviceSelect);
        assert!(state.status_text.contains("unauthorized"));
    }

    #[test]
    fn action_key_with_empty_selection_is_a_no_op() {
        let mut state = state_on_app_list();
        let effect = transition(&mut state, NavEvent::RequestAction(ActionKind::Disable));
        assert_eq!(effect, Effect::None);
        assert_eq!(state.screen, Screen::AppList);
    }

    #[test]
    fn action_key_with_selection_opens_confirm() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        let effect = transition(&mut state, NavEvent::RequestAction(ActionKind::Disable));
        assert_eq!(effect, Effect::None);
        assert_eq!(state.screen, Screen::Confirm);
        assert_eq!(state.pending_action, Some(ActionKind::Disable));
    }

    #[test]
    fn cancelling_confirm_keeps_the_selection() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        transition(&mut state, NavEvent::RequestAction(ActionKind::Disable));
        let effect = transition(&mut state, NavEvent::Cancel);
        assert_eq!(effect, Effect::None);
        assert_eq!(state.screen, Screen::AppList);
        assert_eq!(state.pending_action, None);
        assert!(state.selection.contains("com.a"));
    }

    #[test]
    fn confirming_freezes_the_selection_into_the_request() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        transition(&mut state, NavEvent::Down);
        transition(&mut state, NavEvent::ToggleMark);
        transition(&mut state, NavEvent::RequestAction(ActionKind::Disable));
        let effect = transition(&mut state, NavEvent::Confirm);

        let Effect::Execute(run) = effect else {
            panic!("expected Execute effect, got {effect:?}");
        };
        assert_eq!(state.screen, Screen::Execute);
        assert_eq!(run.packages, vec!["com.a", "com.b"]);

        // Mutating the live selection afterwards cannot reach the frozen run.
        state.selection.clear();
        assert_eq!(run.packages, vec!["com.a", "com.b"]);
    }

    #[test]
    fn execute_ignores_operator_input_until_finished() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        transition(&mut state, NavEvent::RequestAction(ActionKind::Disable));
        transition(&mut state, NavEvent::Confirm);

        for event in [NavEvent::Back, NavEvent::Select, NavEvent::Quit] {
            assert_eq!(transition(&mut state, event), Effect::None);
            assert_eq!(state.screen, Screen::Execute);
        }

        transition(
            &mut state,
            NavEvent::ExecutionFinished {
                result: finished_result(),
                report_path: Some("reports/ABC-x.md".to_string()),
                report_error: None,
            },
        );
        assert_eq!(state.screen, Screen::Summary);
        assert_eq!(state.status_text, "1 attempted, 1 succeeded, 0 failed");
    }

    #[test]
    fn back_key_walks_summary_to_app_list_to_device_select_to_main() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        transition(&mut state, NavEvent::RequestAction(ActionKind::Disable));
        transition(&mut state, NavEvent::Confirm);
        transition(
            &mut state,
            NavEvent::ExecutionFinished {
                result: finished_result(),
                report_path: None,
                report_error: None,
            },
        );
        assert_eq!(state.screen, Screen::Summary);

        let effect = transition(&mut state, NavEvent::Back);
        assert_eq!(state.screen, Screen::AppList);
        assert!(matches!(effect, Effect::LoadApps { refresh: true, .. }));

        transition(&mut state, NavEvent::Back);
        assert_eq!(state.screen, Screen::DeviceSelect);

        transition(&mut state, NavEvent::Back);
        assert_eq!(state.screen, Screen::Main);
    }

    #[test]
    fn leaving_app_list_keeps_selection_and_device_change_clears_it() {
        let mut state = NavState::new();
        transition(
            &mut state,
            NavEvent::DevicesLoaded(vec![
                device("ABC", ConnectionState::Device),
                device("DEF", ConnectionState::Device),
            ]),
        );
        transition(&mut state, NavEvent::Select);
        transition(
            &mut state,
            NavEvent::AppsLoaded {
                apps: vec![app("com.a", true, PackageOrigin::User)],
                warnings: 0,
            },
        );
        transition(&mut state, NavEvent::ToggleMark);
        assert!(state.selection.contains("com.a"));

        transition(&mut state, NavEvent::Back);
        assert_eq!(state.screen, Screen::DeviceSelect);
        assert!(state.selection.contains("com.a"));

        // Re-selecting the same device keeps the selection.
        transition(&mut state, NavEvent::Select);
        assert!(state.selection.contains("com.a"));

        // Selecting the other device clears it.
        transition(&mut state, NavEvent::Down);
        transition(&mut state, NavEvent::Select);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn selection_is_pruned_to_the_current_catalog() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        transition(&mut state, NavEvent::Down);
        transition(&mut state, NavEvent::ToggleMark);
        assert_eq!(state.selection.len(), 2);

        transition(
            &mut state,
            NavEvent::AppsLoaded {
                apps: vec![app("com.a", true, PackageOrigin::User)],
                warnings: 0,
            },
        );
        assert!(state.selection.contains("com.a"));
        assert!(!state.selection.contains("com.b"));
    }

    #[test]
    fn toggle_is_idempotent() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        assert!(state.selection.contains("com.a"));
        transition(&mut state, NavEvent::ToggleMark);
        assert!(!state.selection.contains("com.a"));
    }

    #[test]
    fn help_overlays_and_returns_to_the_covered_screen() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleHelp);
        assert!(state.help_visible);
        assert_eq!(state.screen, Screen::AppList);

        // Everything except dismissal is swallowed.
        assert_eq!(transition(&mut state, NavEvent::ToggleMark), Effect::None);
        assert!(state.selection.is_empty());

        transition(&mut state, NavEvent::ToggleHelp);
        assert!(!state.help_visible);
        assert_eq!(state.screen, Screen::AppList);
    }

    #[test]
    fn filter_modes_toggle_and_never_touch_selection() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::ToggleMark);
        transition(&mut state, NavEvent::SetFilterMode(FilterMode::System));
        assert_eq!(state.filter_mode, FilterMode::System);
        assert_eq!(state.filtered_apps().len(), 1);
        assert!(state.selection.contains("com.a"));

        transition(&mut state, NavEvent::SetFilterMode(FilterMode::System));
        assert_eq!(state.filter_mode, FilterMode::All);
    }

    #[test]
    fn filter_text_narrows_the_visible_list() {
        let mut state = state_on_app_list();
        transition(&mut state, NavEvent::FilterStart);
        transition(&mut state, NavEvent::FilterChar('b'));
        assert_eq!(state.filtered_apps().len(), 1);
        assert_eq!(state.filtered_apps()[0].package, "com.b");

        transition(&mut state, NavEvent::FilterClear);
        assert_eq!(state.filtered_apps().len(), 2);
        assert!(!state.filter_input);
    }

    #[test]
    fn no_devices_keeps_main_with_guidance() {
        let mut state = NavState::new();
        let effect = transition(&mut state, NavEvent::DevicesLoaded(Vec::new()));
        assert_eq!(effect, Effect::None);
        assert_eq!(state.screen, Screen::Main);
        assert!(state.status_text.contains("USB debugging"));
    }
}
