//! Dashboard drawing: turns a [`DashboardState`] into ratatui widgets.
//!
//! Layout, top to bottom:
//! header, summary counters, monitors table, network tabs + device
//! table, activity line, key hints. The help overlay draws on top.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Tabs},
};

use netwatch_core::{
    Activity, ActivityLevel, ChannelState, DevicesView, LiveMetrics, MonitorsView, SystemStatus,
    ViewModel, render::PLACEHOLDER,
};

use crate::theme;

/// Everything the dashboard draws, pulled from the controller.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub view: ViewModel,
    pub status: SystemStatus,
    pub activity: Activity,
    pub metrics: Arc<LiveMetrics>,
    pub live: ChannelState,
    pub auto_refresh: bool,
    pub help_visible: bool,
    /// When the dashboard session began, for the uptime readout.
    pub started_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(view: ViewModel) -> Self {
        Self {
            view,
            status: SystemStatus::Starting,
            activity: Activity::new(ActivityLevel::Info, "Starting..."),
            metrics: Arc::new(LiveMetrics::new()),
            live: ChannelState::Disconnected,
            auto_refresh: false,
            help_visible: false,
            started_at: Utc::now(),
        }
    }

    /// Position of the active tab, if any.
    pub fn active_tab(&self) -> Option<usize> {
        self.view.tabs.iter().position(|t| t.active)
    }
}

pub fn draw(frame: &mut Frame, state: &DashboardState) {
    let [header, summary, monitors, devices, activity, hints] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Min(10),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, header, state);
    draw_summary(frame, summary, &state.view);
    draw_monitors(frame, monitors, &state.view.monitors);
    draw_devices(frame, devices, &state.view);
    draw_activity(frame, activity, &state.activity);
    draw_hints(frame, hints);

    if state.help_visible {
        draw_help(frame, frame.area());
    }
}

// ── Header ───────────────────────────────────────────────────────────

fn draw_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let status_style = match state.status {
        SystemStatus::Operational => theme::status(true),
        SystemStatus::Degraded(_) => theme::status(false),
        SystemStatus::Starting => Style::default().fg(theme::ELECTRIC_YELLOW),
    };

    let mut spans = vec![
        Span::styled(" NETWATCH ", theme::title_style()),
        Span::styled(format!("● {}", state.status.label()), status_style),
        Span::styled("  last check ", theme::key_hint()),
        Span::styled(format_time(state.view.last_check), theme::table_row()),
    ];

    for (name, reading) in state.metrics.iter() {
        spans.push(Span::styled(format!("  {}", metric_label(name)), theme::key_hint()));
        spans.push(Span::styled(format!(" {:.1}%", reading.value), theme::table_row()));
    }

    let (live_text, live_style) = match state.live {
        ChannelState::Connected => ("● live", Style::default().fg(theme::SUCCESS_GREEN)),
        ChannelState::Connecting => ("◐ live", Style::default().fg(theme::ELECTRIC_YELLOW)),
        ChannelState::Disconnected => ("○ live", Style::default().fg(theme::BORDER_GRAY)),
    };
    spans.push(Span::raw("  "));
    spans.push(Span::styled(live_text, live_style));
    spans.push(Span::styled(
        if state.auto_refresh { "  auto ✓" } else { "  auto ✗" },
        theme::key_hint(),
    ));

    let now = Utc::now();
    spans.push(Span::styled(
        format!("  up {}", format_uptime(now - state.started_at)),
        theme::key_hint(),
    ));
    spans.push(Span::styled(
        format!("  {}", now.with_timezone(&Local).format("%H:%M:%S")),
        theme::table_row(),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn format_uptime(elapsed: chrono::TimeDelta) -> String {
    let secs = elapsed.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m:02}m")
    } else {
        format!("{m}m{s:02}s")
    }
}

fn metric_label(name: &str) -> &str {
    match name {
        "cpu_percent" => "cpu",
        "mem_percent" => "mem",
        other => other,
    }
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || PLACEHOLDER.to_owned(),
        |t| t.with_timezone(&Local).format("%H:%M:%S").to_string(),
    )
}

// ── Summary ──────────────────────────────────────────────────────────

fn draw_summary(frame: &mut Frame, area: Rect, view: &ViewModel) {
    let cells: [Rect; 4] = Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(area);
    let items = [
        ("MONITORS", view.summary.total.as_str(), theme::NEON_CYAN),
        ("ONLINE", view.summary.ok.as_str(), theme::SUCCESS_GREEN),
        ("FAILED", view.summary.failed.as_str(), theme::ERROR_RED),
        ("AVG LATENCY", view.summary.avg_latency.as_str(), theme::ELECTRIC_YELLOW),
    ];

    for (cell, (title, value, color)) in cells.into_iter().zip(items) {
        let block = Block::default()
            .title(format!(" {title} "))
            .title_style(theme::key_hint())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let text = Paragraph::new(Span::styled(
            value.to_owned(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .block(block);
        frame.render_widget(text, cell);
    }
}

// ── Monitors ─────────────────────────────────────────────────────────

fn draw_monitors(frame: &mut Frame, area: Rect, monitors: &MonitorsView) {
    let block = panel(" Monitors ");

    let rows = match monitors {
        MonitorsView::NotConfigured => {
            let text = Paragraph::new(Span::styled("No monitors configured", theme::key_hint()))
                .block(block);
            frame.render_widget(text, area);
            return;
        }
        MonitorsView::List(rows) => rows,
    };

    let table_rows = rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.name.clone()),
            Cell::from(row.host.clone()),
            Cell::from(row.mac.clone()),
            Cell::from(Span::styled(row.status_label(), theme::status(row.ok))),
            Cell::from(row.latency.clone().unwrap_or_default()),
        ])
        .style(theme::table_row())
    });

    let table = Table::new(table_rows, [
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(12),
        Constraint::Length(7),
        Constraint::Length(10),
    ])
    .header(Row::new(["NAME", "HOST", "MAC", "STATUS", "LATENCY"]).style(theme::table_header()))
    .block(block);

    frame.render_widget(table, area);
}

// ── Devices ──────────────────────────────────────────────────────────

fn draw_devices(frame: &mut Frame, area: Rect, view: &ViewModel) {
    let block = panel(" Devices ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [tabs_area, table_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let titles: Vec<Line> = view
        .tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let style = if tab.active {
                theme::tab_active()
            } else {
                theme::tab_inactive()
            };
            Line::from(Span::styled(
                format!("{} {} [{}]", i + 1, tab.label, tab.counter),
                style,
            ))
        })
        .collect();
    let selected = view.tabs.iter().position(|t| t.active).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .divider(Span::styled("│", theme::key_hint()))
        .select(selected);
    frame.render_widget(tabs, tabs_area);

    let table = match &view.devices {
        DevicesView::NoNetworks => {
            placeholder(frame, table_area, "No networks found");
            return;
        }
        DevicesView::Unavailable { label } => {
            placeholder(frame, table_area, &format!("Network {label} not available"));
            return;
        }
        DevicesView::Table(table) => table,
    };

    if table.pagination.is_empty() {
        placeholder(frame, table_area, "No devices on this network");
    } else {
        let rows = table.rows.iter().map(|row| {
            Row::new(vec![
                Cell::from(row.ip.clone()),
                Cell::from(row.mac.clone()),
                Cell::from(row.hostname.clone()),
                Cell::from(Span::styled(row.status_label(), theme::status(row.ok))),
            ])
            .style(theme::table_row())
        });
        let widget = Table::new(rows, [
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Fill(1),
            Constraint::Length(8),
        ])
        .header(Row::new(["IP", "MAC", "HOSTNAME", "STATUS"]).style(theme::table_header()));
        frame.render_widget(widget, table_area);
    }

    let p = &table.pagination;
    let footer = Line::from(vec![
        Span::styled(if p.has_prev { "◀ " } else { "  " }, theme::key_hint_key()),
        Span::styled(p.page_label(), theme::table_row()),
        Span::styled(if p.has_next { " ▶" } else { "  " }, theme::key_hint_key()),
        Span::styled(format!("  {}", p.range_label()), theme::key_hint()),
    ]);
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn placeholder(frame: &mut Frame, area: Rect, text: &str) {
    frame.render_widget(
        Paragraph::new(Span::styled(text.to_owned(), theme::key_hint())),
        area,
    );
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default())
}

// ── Footer ───────────────────────────────────────────────────────────

fn draw_activity(frame: &mut Frame, area: Rect, activity: &Activity) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", activity.at.with_timezone(&Local).format("%H:%M:%S")),
            theme::key_hint(),
        ),
        Span::styled(activity.message.clone(), theme::activity(activity.level)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

const KEY_HINTS: &[(&str, &str)] = &[
    ("r", "refresh"),
    ("s", "rescan"),
    ("a", "auto"),
    ("tab", "network"),
    ("←/→", "page"),
    ("?", "help"),
    ("q", "quit"),
];

fn draw_hints(frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (key, label) in KEY_HINTS {
        spans.push(Span::styled(*key, theme::key_hint_key()));
        spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let width = 48u16.min(area.width.saturating_sub(4));
    let height = 14u16.min(area.height.saturating_sub(2));
    let help_area = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));

    let entries = [
        ("r", "Refresh monitors and devices"),
        ("s", "Rescan networks"),
        ("a", "Toggle auto-refresh"),
        ("Tab / S-Tab", "Next / previous network"),
        ("1-9", "Select network"),
        ("← h / → l", "Previous / next page"),
        ("?", "Toggle this help"),
        ("q / Ctrl-C", "Quit"),
    ];
    let lines: Vec<Line> = std::iter::once(Line::from(""))
        .chain(entries.iter().map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("  {key:<12}"), theme::key_hint_key()),
                Span::styled(*desc, theme::table_row()),
            ])
        }))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), help_area);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use netwatch_core::{
        Device, MetricReading, MonitorResult, NetworkGroup, Snapshot, ViewSelection, render,
    };
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn buffer_text(state: &DashboardState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 40)).unwrap();
        terminal.draw(|f| draw(f, state)).unwrap();
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn snapshot() -> Snapshot {
        let devices = (1..=7)
            .map(|i| Device {
                ip: format!("192.168.1.{i}"),
                mac: Some(format!("aa:bb:cc:00:00:0{i}")),
                hostname: (i == 1).then(|| "router".to_owned()),
                ok: i != 3,
                network: Some("2.4G".into()),
                last_seen: None,
            })
            .collect();
        Snapshot {
            monitors: vec![
                MonitorResult {
                    name: "Gateway".into(),
                    host: "192.168.1.1".into(),
                    ok: true,
                    rtt_ms: Some(1.5),
                    mac: Some("aa:bb:cc:dd:ee:ff".into()),
                    timestamp: None,
                },
                MonitorResult {
                    name: "Google DNS".into(),
                    host: "8.8.8.8".into(),
                    ok: false,
                    rtt_ms: None,
                    mac: None,
                    timestamp: None,
                },
            ],
            networks: vec![
                NetworkGroup {
                    label: "2.4G".into(),
                    cidr: "192.168.1.0/24".into(),
                    devices,
                },
                NetworkGroup::new("5G", "192.168.2.0/24"),
            ],
            fetched_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_dashboard_shows_placeholders() {
        let state = DashboardState::new(render(None, &ViewSelection::new("2.4G"), 5));
        let text = buffer_text(&state);

        assert!(text.contains("NETWATCH"));
        assert!(text.contains("STARTING"));
        assert!(text.contains("No monitors configured"));
        assert!(text.contains("No networks found"));
        assert!(text.contains("2.4G [--/--]"));
    }

    #[test]
    fn populated_dashboard_renders_tables_and_pagination() {
        let snap = snapshot();
        let mut state = DashboardState::new(render(Some(&snap), &ViewSelection::new("2.4G"), 5));
        state.status = SystemStatus::Operational;

        let text = buffer_text(&state);

        assert!(text.contains("OPERATIONAL"));
        assert!(text.contains("Gateway"));
        assert!(text.contains("aa:bb:cc..."));
        assert!(text.contains("1.5 ms"));
        assert!(text.contains("FAIL"));
        assert!(text.contains("1 2.4G [6/7]"));
        assert!(text.contains("2 5G [0/0]"));
        assert!(text.contains("router"));
        assert!(text.contains("OFFLINE"));
        assert!(text.contains("PAGE 1/2"));
        assert!(text.contains("showing 1-5 of 7"));
        assert!(!text.contains("192.168.1.6"));
    }

    #[test]
    fn empty_network_and_metrics() {
        let snap = snapshot();
        let mut state = DashboardState::new(render(Some(&snap), &ViewSelection::new("5G"), 5));
        let mut metrics = LiveMetrics::new();
        metrics.insert("cpu_percent".into(), MetricReading {
            value: 12.5,
            at: Utc::now(),
        });
        state.metrics = Arc::new(metrics);
        state.live = ChannelState::Connected;

        let text = buffer_text(&state);

        assert!(text.contains("No devices on this network"));
        assert!(text.contains("cpu 12.5%"));
        assert!(text.contains("● live"));
    }

    #[test]
    fn help_overlay_lists_shortcuts() {
        let mut state = DashboardState::new(render(None, &ViewSelection::new("2.4G"), 5));
        state.help_visible = true;
        let text = buffer_text(&state);
        assert!(text.contains("Keyboard Shortcuts"));
        assert!(text.contains("Rescan networks"));
    }

    #[test]
    fn activity_message_is_shown() {
        let mut state = DashboardState::new(render(None, &ViewSelection::new("2.4G"), 5));
        state.activity = Activity::new(ActivityLevel::Error, "Refresh failed: network error");
        assert!(buffer_text(&state).contains("Refresh failed: network error"));
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(chrono::TimeDelta::seconds(75)), "1m15s");
        assert_eq!(format_uptime(chrono::TimeDelta::seconds(3 * 3600 + 120)), "3h02m");
        assert_eq!(format_uptime(chrono::TimeDelta::seconds(-5)), "0m00s");
    }
}
