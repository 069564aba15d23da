use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use crate::app::adb::client::{AdbClient, BridgeRunner};
use crate::app::adb::locator::{probe_adb, resolve_adb_program, validate_adb_program};
use crate::app::catalog::DeviceCatalog;
use crate::app::config::AppConfig;
use crate::app::engine::ExecutionEngine;
use crate::app::models::{ActionKind, Device};
use crate::app::report::ReportWriter;
use crate::app::ui::nav::{
    transition, Effect, FilterMode, NavEvent, NavState, PendingRun, Screen,
};
use crate::app::ui::screens;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

pub fn run(config: &AppConfig) -> Result<(), String> {
    let program = resolve_adb_program(&config.adb.command_path);
    validate_adb_program(&program)?;
    let version = probe_adb(&program).map_err(|err| err.to_string())?;
    info!(adb = %program, version = %version, "adb probe ok");

    let client = AdbClient::new(program);
    let mut catalog = DeviceCatalog::new(client, config);
    let writer = ReportWriter::new(&config.reports.reports_dir);

    let mut stdout = io::stdout();
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    execute!(stdout, EnterAlternateScreen, Hide)
        .map_err(|e| format!("failed to enter alternate screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {e}"))?;

    let result = run_loop(&mut terminal, &mut catalog, &writer, config);

    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(terminal.backend_mut(), Show, LeaveAlternateScreen)
        .map_err(|e| format!("failed to leave alternate screen: {e}"))?;
    result
}

fn run_loop<B: BridgeRunner>(
    terminal: &mut Tui,
    catalog: &mut DeviceCatalog<B>,
    writer: &ReportWriter,
    config: &AppConfig,
) -> Result<(), String> {
    let mut state = NavState::new();
    let mut pending = apply(&mut state, None, Some(Effect::LoadDevices));

    loop {
        // Drain follow-up work before waiting on input again; each effect
        // feeds its completion back through the state machine.
        while let Some(effect) = pending.take() {
            match effect {
                Effect::Quit => return Ok(()),
                Effect::LoadDevices => {
                    draw(terminal, &state)?;
                    let event = load_devices(catalog, config);
                    pending = apply(&mut state, Some(event), None);
                }
                Effect::LoadApps { device_id, refresh } => {
                    draw(terminal, &state)?;
                    if refresh {
                        catalog.refresh(&device_id);
                    }
                    let event = load_apps(catalog, &device_id);
                    pending = apply(&mut state, Some(event), None);
                }
                Effect::Execute(run) => {
                    let event = run_execution(terminal, &mut state, catalog, writer, config, run)?;
                    pending = apply(&mut state, Some(event), None);
                }
                Effect::None => {}
            }
        }

        draw(terminal, &state)?;

        if !event::poll(Duration::from_millis(250))
            .map_err(|e| format!("failed to poll input: {e}"))?
        {
            continue;
        }
        let ev = event::read().map_err(|e| format!("failed to read input: {e}"))?;
        let Event::Key(key) = ev else {
            continue;
        };
        let Some(nav_event) = nav_event_for_key(&state, key) else {
            continue;
        };
        pending = apply(&mut state, Some(nav_event), None);
    }
}

fn apply(
    state: &mut NavState,
    event: Option<NavEvent>,
    seed: Option<Effect>,
) -> Option<Effect> {
    let effect = match (event, seed) {
        (Some(event), _) => transition(state, event),
        (None, Some(effect)) => effect,
        (None, None) => Effect::None,
    };
    match effect {
        Effect::None => None,
        other => Some(other),
    }
}

fn draw(terminal: &mut Tui, state: &NavState) -> Result<(), String> {
    terminal
        .draw(|frame| screens::draw(frame, state))
        .map(|_| ())
        .map_err(|e| format!("failed to render: {e}"))
}

fn load_devices<B: BridgeRunner>(catalog: &mut DeviceCatalog<B>, config: &AppConfig) -> NavEvent {
    match catalog.discover_devices() {
        Ok(devices) => {
            let devices: Vec<Device> = devices
                .into_iter()
                .filter(|d| {
                    config.catalog.show_offline_devices
                        || d.state != crate::app::models::ConnectionState::Offline
                })
                .map(|basic| {
                    if basic.state.is_ready() {
                        catalog.load_device_detail(&basic)
                    } else {
                        basic
                    }
                })
                .collect();
            NavEvent::DevicesLoaded(devices)
        }
        Err(err) => NavEvent::DeviceLoadFailed(err.to_string()),
    }
}

fn load_apps<B: BridgeRunner>(catalog: &mut DeviceCatalog<B>, device_id: &str) -> NavEvent {
    match catalog.load_apps(device_id) {
        Ok(inventory) => NavEvent::AppsLoaded {
            apps: inventory.apps,
            warnings: inventory.warnings.len(),
        },
        Err(err) => NavEvent::AppLoadFailed(err.to_string()),
    }
}

/// Drives one batch to completion on the UI thread. The engine's
/// progress emitter doubles as the cooperative cancellation checkpoint:
/// after every pair we redraw and look for a forced quit, which stops
/// the batch at the next pair boundary without tearing down the
/// in-flight call.
fn run_execution<B: BridgeRunner>(
    terminal: &mut Tui,
    state: &mut NavState,
    catalog: &mut DeviceCatalog<B>,
    writer: &ReportWriter,
    config: &AppConfig,
    run: PendingRun,
) -> Result<NavEvent, String> {
    let cancel = AtomicBool::new(false);
    let call_timeout = Duration::from_secs(config.adb.command_timeout_secs);

    draw(terminal, state)?;
    let result = {
        let mut engine = ExecutionEngine::new(catalog.bridge(), call_timeout);
        let progress = &mut state.progress;
        let device = state.selected_device.clone();
        let pending_action = state.pending_action;
        engine.run(
            &run.device_id,
            run.action,
            run.packages,
            &cancel,
            &mut |event| {
                progress.push(event);
                let view = ExecuteView {
                    progress: progress.as_slice(),
                    device: device.as_ref(),
                    pending_action,
                };
                let _ = terminal.draw(|frame| view.draw(frame));
                if force_quit_requested() {
                    cancel.store(true, Ordering::SeqCst);
                }
            },
        )
    };

    let device = state
        .selected_device
        .clone()
        .unwrap_or_else(|| Device::new(run.device_id.clone(), crate::app::models::ConnectionState::Device));
    let (report_path, report_error) = match writer.write(&device, &result) {
        Ok(path) => (Some(path.display().to_string()), None),
        Err(err) => (None, Some(err.to_string())),
    };
    // The batch changed on-device state; the cached inventory is stale.
    catalog.refresh(&result.request.device_id);

    Ok(NavEvent::ExecutionFinished {
        result,
        report_path,
        report_error,
    })
}

/// Non-blocking sweep of queued input while a batch runs. Only a forced
/// quit is honored; everything else is dropped on the floor.
fn force_quit_requested() -> bool {
    let mut requested = false;
    while event::poll(Duration::from_millis(0)).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                && key.code == KeyCode::Char('c');
            if key.kind == KeyEventKind::Press && ctrl_c {
                requested = true;
            }
        }
    }
    requested
}

/// Minimal execute-screen renderer used from inside the progress
/// emitter, where the full `NavState` is mutably split.
struct ExecuteView<'a> {
    progress: &'a [crate::app::engine::ProgressEvent],
    device: Option<&'a Device>,
    pending_action: Option<ActionKind>,
}

impl ExecuteView<'_> {
    fn draw(&self, frame: &mut ratatui::Frame) {
        let mut preview = NavState::new();
        preview.screen = Screen::Execute;
        preview.progress = self.progress.to_vec();
        preview.selected_device = self.device.cloned();
        preview.pending_action = self.pending_action;
        preview.status_text = "Executing... press ctrl-c to stop after the current call".to_string();
        screens::draw(frame, &preview);
    }
}

fn nav_event_for_key(state: &NavState, key: KeyEvent) -> Option<NavEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(NavEvent::Quit);
    }
    if state.help_visible {
        return match key.code {
            KeyCode::Char('?') => Some(NavEvent::ToggleHelp),
            KeyCode::Esc => Some(NavEvent::Back),
            KeyCode::Char('q') => Some(NavEvent::Quit),
            _ => None,
        };
    }
    if state.screen == Screen::AppList && state.filter_input {
        return match key.code {
            KeyCode::Esc => Some(NavEvent::FilterClear),
            KeyCode::Enter => Some(NavEvent::FilterAccept),
            KeyCode::Backspace => Some(NavEvent::FilterBackspace),
            KeyCode::Char(c) => Some(NavEvent::FilterChar(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('?') => Some(NavEvent::ToggleHelp),
        KeyCode::Up | KeyCode::Char('k') => Some(NavEvent::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(NavEvent::Down),
        KeyCode::Char('g') => Some(NavEvent::Top),
        KeyCode::Char('G') => Some(NavEvent::Bottom),
        KeyCode::Enter => Some(match state.screen {
            Screen::Confirm => NavEvent::Confirm,
            _ => NavEvent::Select,
        }),
        KeyCode::Char(' ') => Some(NavEvent::ToggleMark),
        KeyCode::Char('a') => Some(NavEvent::SelectAll),
        KeyCode::Char('n') => Some(match state.screen {
            Screen::Confirm => NavEvent::Cancel,
            _ => NavEvent::ClearMarks,
        }),
        KeyCode::Char('/') => Some(NavEvent::FilterStart),
        KeyCode::Char('e') => Some(NavEvent::SetFilterMode(FilterMode::Enabled)),
        KeyCode::Char('d') => Some(NavEvent::SetFilterMode(FilterMode::Disabled)),
        KeyCode::Char('u') => Some(NavEvent::SetFilterMode(FilterMode::User)),
        KeyCode::Char('s') => Some(NavEvent::SetFilterMode(FilterMode::System)),
        KeyCode::Char('D') => Some(NavEvent::RequestAction(ActionKind::Disable)),
        KeyCode::Char('E') => Some(NavEvent::RequestAction(ActionKind::Enable)),
        KeyCode::Char('y') => Some(NavEvent::Confirm),
        KeyCode::Char('r') => Some(NavEvent::Refresh),
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Backspace => Some(NavEvent::Back),
        KeyCode::Char('q') => Some(match state.screen {
            Screen::Confirm => NavEvent::Cancel,
            _ => NavEvent::Quit,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_cancels_on_confirm_and_quits_elsewhere() {
        let mut state = NavState::new();
        assert_eq!(
            nav_event_for_key(&state, press(KeyCode::Char('q'))),
            Some(NavEvent::Quit)
        );
        state.screen = Screen::Confirm;
        assert_eq!(
            nav_event_for_key(&state, press(KeyCode::Char('q'))),
            Some(NavEvent::Cancel)
        );
    }

    #[test]
    fn enter_confirms_only_on_confirm_screen() {
        let mut state = NavState::new();
        assert_eq!(
            nav_event_for_key(&state, press(KeyCode::Enter)),
            Some(NavEvent::Select)
        );
        state.screen = Screen::Confirm;
        assert_eq!(
            nav_event_for_key(&state, press(KeyCode::Enter)),
            Some(NavEvent::Confirm)
        );
    }

    #[test]
    fn filter_input_captures_characters() {
        let mut state = NavState::new();
        state.screen = Screen::AppList;
        state.filter_input = true;
        assert_eq!(
            nav_event_for_key(&state, press(KeyCode::Char('q'))),
            Some(NavEvent::FilterChar('q'))
        );
        assert_eq!(
            nav_event_for_key(&state, press(KeyCode::Esc)),
            Some(NavEvent::FilterClear)
        );
    }

    #[test]
    fn ctrl_c_always_maps_to_quit() {
        let mut state = NavState::new();
        state.screen = Screen::AppList;
        state.filter_input = true;
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(nav_event_for_key(&state, key), Some(NavEvent::Quit));
    }
}
