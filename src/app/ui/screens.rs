use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::ui::nav::{NavState, Screen};

const ACCENT: Color = Color::Cyan;
const OK: Color = Color::Green;
const ERR: Color = Color::Red;
const DIM: Color = Color::DarkGray;

pub fn draw(frame: &mut Frame, state: &NavState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(header(state), chunks[0]);
    match state.screen {
        Screen::Main => draw_main(frame, state, chunks[1]),
        Screen::DeviceSelect => draw_device_select(frame, state, chunks[1]),
        Screen::AppList | Screen::Confirm => draw_app_list(frame, state, chunks[1]),
        Screen::Execute => draw_execute(frame, state, chunks[1]),
        Screen::Summary => draw_summary(frame, state, chunks[1]),
    }
    frame.render_widget(status_line(state), chunks[2]);
    frame.render_widget(footer(state), chunks[3]);

    if state.help_visible {
        let area = frame.area();
        draw_help(frame, area);
    }
}

fn header(state: &NavState) -> Paragraph<'_> {
    let mut spans = vec![Span::styled(
        " app-freeze ",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )];
    if let Some(device) = &state.selected_device {
        spans.push(Span::raw("— "));
        spans.push(Span::styled(
            device.display_name(),
            Style::default().fg(OK),
        ));
        spans.push(Span::styled(
            format!(" ({})", device.id),
            Style::default().fg(DIM),
        ));
    }
    Paragraph::new(Line::from(spans))
}

fn draw_main(frame: &mut Frame, state: &NavState, area: Rect) {
    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            "  Freeze and unfreeze Android apps without touching their data.",
            Style::default(),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            format!("  {}", state.status_text),
            Style::default().fg(DIM),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::raw("  Press "),
            Span::styled("r", Style::default().fg(ACCENT)),
            Span::raw(" to rescan, "),
            Span::styled("enter", Style::default().fg(ACCENT)),
            Span::raw(" to pick a device, "),
            Span::styled("?", Style::default().fg(ACCENT)),
            Span::raw(" for help."),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_device_select(frame: &mut Frame, state: &NavState, area: Rect) {
    if state.devices.is_empty() {
        frame.render_widget(
            Paragraph::new("\n  No devices found. Connect a device and press r."),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = state
        .devices
        .iter()
        .map(|device| {
            let state_style = if device.state.is_ready() {
                Style::default().fg(OK)
            } else {
                Style::default().fg(ERR)
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("  {} ", device.display_name())),
                Span::styled(format!("[{}]", device.state.label()), state_style),
                Span::styled(
                    if device.android_version.is_empty() {
                        String::new()
                    } else {
                        format!("  Android {}", device.android_version)
                    },
                    Style::default().fg(DIM),
                ),
                Span::styled(format!("  {}", device.id), Style::default().fg(DIM)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::NONE))
        .highlight_style(Style::default().bg(Color::Indexed(237)).add_modifier(Modifier::BOLD))
        .highlight_symbol("❯");
    let mut list_state = ListState::default();
    list_state.select(Some(state.device_cursor));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_app_list(frame: &mut Frame, state: &NavState, area: Rect) {
    let filtered = state.filtered_apps();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let count_line = Line::from(vec![
        Span::styled(
            format!("  showing: {} ", state.filter_mode.label()),
            Style::default().fg(DIM),
        ),
        Span::styled(
            format!("({} apps, {} selected)", filtered.len(), state.selection.len()),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            if state.filter_text.is_empty() {
                String::new()
            } else {
                format!("  /{}", state.filter_text)
            },
            Style::default().fg(ACCENT),
        ),
    ]);
    frame.render_widget(Paragraph::new(count_line), chunks[0]);

    if filtered.is_empty() {
        frame.render_widget(Paragraph::new("\n  No apps match the filter."), chunks[1]);
        return;
    }

    let items: Vec<ListItem> = filtered
        .iter()
        .map(|app| {
            let marked = state.selection.contains(&app.package);
            let mark = if marked { "●" } else { " " };
            let enabled = if app.enabled {
                Span::styled("✓", Style::default().fg(OK))
            } else {
                Span::styled("✗", Style::default().fg(ERR))
            };
            let sys = if app.is_system() {
                Span::styled(" [S]", Style::default().fg(DIM))
            } else {
                Span::raw("    ")
            };
            let size = match app.size_mb {
                Some(mb) => format!("{mb:>8.1}MB"),
                None => "         -".to_string(),
            };
            let row_style = if marked {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {mark} "), Style::default().fg(Color::Yellow)),
                enabled,
                sys,
                Span::styled(format!(" {:<50}", app.package), row_style),
                Span::styled(size, Style::default().fg(DIM)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::Indexed(237)))
        .highlight_symbol("❯");
    let mut list_state = ListState::default();
    list_state.select(Some(state.app_cursor.min(filtered.len() - 1)));
    frame.render_stateful_widget(list, chunks[1], &mut list_state);
}

fn draw_execute(frame: &mut Frame, state: &NavState, area: Rect) {
    let action = state
        .pending_action
        .map(|a| a.progress_label())
        .unwrap_or("Working");
    let (done, total) = state
        .progress
        .last()
        .map(|event| (event.seq, event.total))
        .unwrap_or((0, 0));

    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("  {action} apps... {done}/{total}"),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
    ];
    for event in state.progress.iter().rev().take(10).rev() {
        let line = if event.succeeded {
            Line::from(Span::styled(
                format!("  ✓ user {} {}", event.user_id, event.package),
                Style::default().fg(OK),
            ))
        } else {
            Line::from(Span::styled(
                format!("  ✗ user {} {}", event.user_id, event.package),
                Style::default().fg(ERR),
            ))
        };
        lines.push(line);
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_summary(frame: &mut Frame, state: &NavState, area: Rect) {
    let Some(result) = &state.last_result else {
        frame.render_widget(Paragraph::new("\n  No result."), area);
        return;
    };

    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("  {} finished", result.request.action.label()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            format!("  {}", result.summary_line()),
            Style::default().fg(Color::Yellow),
        )),
    ];
    if result.state == crate::app::models::EngineState::Aborted {
        lines.push(Line::from(Span::styled(
            "  Aborted early; partial results were kept.",
            Style::default().fg(ERR),
        )));
    }
    lines.push(Line::raw(""));
    match (&state.report_path, &state.report_error) {
        (Some(path), _) => lines.push(Line::from(vec![
            Span::raw("  Report: "),
            Span::styled(path.clone(), Style::default().fg(ACCENT)),
        ])),
        (None, Some(err)) => lines.push(Line::from(Span::styled(
            format!("  Report not written: {err}"),
            Style::default().fg(ERR),
        ))),
        (None, None) => {}
    }
    for outcome in result.outcomes.iter().filter(|o| !o.succeeded).take(8) {
        lines.push(Line::from(Span::styled(
            format!(
                "  ✗ user {} {}: {}",
                outcome.user_id,
                outcome.package,
                outcome.message.as_deref().unwrap_or("unknown error")
            ),
            Style::default().fg(ERR),
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn status_line(state: &NavState) -> Paragraph<'_> {
    Paragraph::new(Line::from(Span::styled(
        format!(" {}", state.status_text),
        Style::default().fg(DIM),
    )))
}

fn footer(state: &NavState) -> Paragraph<'_> {
    let keys: &[(&str, &str)] = match state.screen {
        Screen::Main => &[("r", "rescan"), ("enter", "devices"), ("?", "help"), ("q", "quit")],
        Screen::DeviceSelect => &[
            ("↑↓", "nav"),
            ("enter", "select"),
            ("r", "rescan"),
            ("esc", "back"),
            ("q", "quit"),
        ],
        Screen::AppList => &[
            ("space", "mark"),
            ("a/n", "all/none"),
            ("/", "filter"),
            ("D", "disable"),
            ("E", "enable"),
            ("r", "refresh"),
            ("esc", "back"),
            ("q", "quit"),
        ],
        Screen::Confirm => &[("y", "confirm"), ("n/q", "cancel")],
        Screen::Execute => &[("ctrl-c", "stop after current call")],
        Screen::Summary => &[("esc", "back to apps"), ("q", "quit")],
    };

    let mut spans = Vec::new();
    if state.screen == Screen::Confirm {
        let count = state.selection.len();
        let action = state
            .pending_action
            .map(|a| a.label())
            .unwrap_or("Apply");
        spans.push(Span::styled(
            format!(" {action} {count} app(s) for every user? "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        ));
    }
    for (key, desc) in keys {
        spans.push(Span::styled(
            format!(" [{key}]"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!("{desc} "),
            Style::default().fg(DIM),
        ));
    }
    Paragraph::new(Line::from(spans))
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let width = area.width.min(60);
    let height = area.height.min(16);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::raw("j/k or ↑/↓   move cursor"),
        Line::raw("g / G        jump to top / bottom"),
        Line::raw("enter        select"),
        Line::raw("space        mark / unmark app"),
        Line::raw("a / n        mark all shown / clear marks"),
        Line::raw("/            filter by name"),
        Line::raw("e d u s      show enabled/disabled/user/system"),
        Line::raw("D / E        disable / enable marked apps"),
        Line::raw("r            refresh"),
        Line::raw("esc          back"),
        Line::raw("q            quit"),
        Line::raw(""),
        Line::raw("Disabling keeps app data; nothing is uninstalled."),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" help (press ? to close) "),
        ),
        popup,
    );
}
