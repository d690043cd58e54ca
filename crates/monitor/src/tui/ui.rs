//! Frame rendering for the dashboard sections.

use crate::charts::ChartRegistry;
use crate::model::{DashboardSection, DeviceStatus, PortState, ProbeStatus, Severity};
use crate::monitor::{CHART_BANDWIDTH, CHART_TRAFFIC};
use crate::realtime::ConnectionState;
use crate::tui::app::App;
use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, Gauge, GraphType, Paragraph, Row, Table, Tabs},
};

/// Draw one full frame.
pub fn draw(frame: &mut Frame, app: &App, charts: &ChartRegistry) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header + tabs
            Constraint::Min(8),    // section body
            Constraint::Length(3), // footer / banner
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);

    match app.section {
        DashboardSection::Overview => draw_overview(frame, app, chunks[1]),
        DashboardSection::Network => draw_network(frame, app, chunks[1]),
        DashboardSection::Security => draw_events(frame, app, chunks[1], " SECURITY EVENTS ", 10),
        DashboardSection::Devices => draw_devices(frame, app, chunks[1]),
        DashboardSection::Alerts => draw_events(frame, app, chunks[1], " ALERTS ", 50),
        DashboardSection::Reports => draw_reports(frame, app, chunks[1], charts),
    }

    draw_footer(frame, app, chunks[2]);
}

fn connection_style(state: ConnectionState) -> (String, Color) {
    let color = match state {
        ConnectionState::Open => Color::Green,
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Closed | ConnectionState::Failed => Color::Magenta,
    };
    (format!(" {} ", state.label()), color)
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let (feed_label, feed_color) = connection_style(app.connection);

    let titles: Vec<Line> = DashboardSection::ALL
        .iter()
        .map(|section| Line::from(section.title()))
        .collect();
    let selected = DashboardSection::ALL
        .iter()
        .position(|s| *s == app.section)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .title(" Sentinel Network Monitor ")
                .title_bottom(Line::from(Span::styled(
                    feed_label,
                    Style::default().fg(feed_color).add_modifier(Modifier::BOLD),
                )))
                .borders(Borders::ALL),
        );
    frame.render_widget(tabs, area);
}

fn draw_overview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" OVERVIEW ").borders(Borders::ALL);

    let mut lines: Vec<Line> = Vec::new();
    match &app.overview {
        Some(overview) => {
            lines.push(metric_line("Internet", &overview.internet_status));
            lines.push(metric_line(
                "Latency",
                &format!("{} ms", overview.internet_latency_ms),
            ));
            lines.push(metric_line(
                "Router CPU / RAM",
                &format!("{}% / {}%", overview.router_cpu_pct, overview.router_ram_pct),
            ));
            lines.push(metric_line(
                "Threats blocked",
                &overview.threats_blocked.to_string(),
            ));
            lines.push(metric_line("LAN devices", &overview.lan_devices.to_string()));
            lines.push(metric_line(
                "LAN traffic",
                &format!("{:.1} Mbps", overview.lan_traffic_mbps),
            ));
        }
        None => lines.push(Line::from(Span::styled(
            "  waiting for first overview load...",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    lines.push(Line::from(""));
    lines.push(metric_line(
        "Live throughput",
        &format!("{:.1} Mbps", app.traffic.throughput),
    ));
    lines.push(metric_line(
        "Known devices",
        &app.devices.len().to_string(),
    ));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn metric_line(name: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {name:<20}"), Style::default().fg(Color::Gray)),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

fn draw_network(frame: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    draw_ping_table(frame, app, halves[0]);
    draw_ports(frame, app, halves[1]);
}

fn draw_ping_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Target", "Host", "Latency", "Status"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .ping_rows
        .iter()
        .map(|(target, outcome)| {
            let latency = outcome
                .latency_ms
                .map(|ms| format!("{ms} ms"))
                .unwrap_or_else(|| "timeout".to_string());
            let (symbol, color) = match outcome.status {
                ProbeStatus::Online => ("●", Color::Green),
                ProbeStatus::Warning => ("●", Color::Yellow),
                ProbeStatus::Timeout => ("◌", Color::Red),
                ProbeStatus::Offline => ("○", Color::Red),
            };
            Row::new(vec![
                Cell::from(target.name.clone()).style(Style::default().fg(Color::Cyan)),
                Cell::from(target.host.clone()),
                Cell::from(latency),
                Cell::from(symbol).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(10),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(Block::default().title(" PING ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn draw_ports(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Port", "Service", "State"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .ports
        .iter()
        .map(|port| {
            let color = if port.unexpected() {
                Color::Yellow
            } else {
                Color::Green
            };
            let state = match port.actual {
                PortState::Open => "open",
                PortState::Closed => "closed",
            };
            Row::new(vec![
                Cell::from(port.port.to_string()),
                Cell::from(port.name.clone()),
                Cell::from(state).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().title(" PORTS ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Info => Style::default().fg(Color::Cyan),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Critical => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn draw_events(frame: &mut Frame, app: &App, area: Rect, title: &str, limit: usize) {
    let block = Block::default()
        .title(format!("{title}({}) ", app.events.len()))
        .borders(Borders::ALL);

    let mut lines: Vec<Line> = Vec::new();
    if app.events.is_empty() {
        lines.push(Line::from(Span::styled(
            "  no events recorded",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for event in app.events.iter().take(limit) {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", event.timestamp.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(event.message.clone(), severity_style(event.severity)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_devices(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Name", "IP", "MAC", "Status", "Last seen"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .devices
        .iter()
        .map(|device| {
            let (status, color) = match device.status {
                DeviceStatus::Online => ("online", Color::Green),
                DeviceStatus::Warning => ("warning", Color::Yellow),
                DeviceStatus::Offline => ("offline", Color::Red),
            };
            Row::new(vec![
                Cell::from(device.name.clone()).style(Style::default().fg(Color::Cyan)),
                Cell::from(device.ip.clone()),
                Cell::from(device.mac.clone()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(status).style(Style::default().fg(color)),
                Cell::from(format_ago(device.last_seen)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(" DEVICES ({}) ", app.devices.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(table, area);
}

fn draw_reports(frame: &mut Frame, _app: &App, area: Rect, charts: &ChartRegistry) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(area);

    draw_traffic_chart(frame, chunks[0], charts);
    draw_bandwidth_gauge(frame, chunks[1], charts);
}

fn draw_traffic_chart(frame: &mut Frame, area: Rect, charts: &ChartRegistry) {
    let Some(snapshot) = charts.snapshot(CHART_TRAFFIC) else {
        frame.render_widget(
            Block::default().title(" TRAFFIC ").borders(Borders::ALL),
            area,
        );
        return;
    };

    let points: Vec<Vec<(f64, f64)>> = snapshot
        .series
        .iter()
        .map(|(_, series)| {
            series
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v))
                .collect()
        })
        .collect();

    let max_y = points
        .iter()
        .flatten()
        .map(|(_, y)| *y)
        .fold(1.0_f64, f64::max);
    let max_x = points.first().map(|p| p.len().max(2) - 1).unwrap_or(1) as f64;

    let colors = [Color::Green, Color::Blue];
    let datasets: Vec<Dataset> = snapshot
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, ((name, _), data))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(colors[i % colors.len()]))
                .data(data)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" TRAFFIC (Mbps, last 24h) ")
                .borders(Borders::ALL),
        )
        .x_axis(Axis::default().bounds([0.0, max_x]))
        .y_axis(
            Axis::default()
                .bounds([0.0, max_y * 1.2])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", max_y * 1.2)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn draw_bandwidth_gauge(frame: &mut Frame, area: Rect, charts: &ChartRegistry) {
    let used = charts
        .snapshot(CHART_BANDWIDTH)
        .and_then(|snapshot| {
            snapshot
                .slices
                .iter()
                .find(|(name, _)| name == "Used")
                .map(|(_, value)| *value)
        })
        .unwrap_or(0.0);

    let gauge = Gauge::default()
        .block(Block::default().title(" BANDWIDTH ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((used / 100.0).clamp(0.0, 1.0))
        .label(format!("{used:.0}% used"));
    frame.render_widget(gauge, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.banner {
        Some((message, severity, _)) => Line::from(Span::styled(
            format!(" {message} "),
            severity_style(*severity).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(Span::styled(
            " [Q] Quit  [Tab] Section  [R] Refresh  [S] Scan devices  [E] Export report ",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Compact relative time, matching the device grid's "last seen" column.
fn format_ago(at: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(at);
    let secs = elapsed.num_seconds().max(0);
    if secs < 60 {
        "now".to_string()
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ago_buckets() {
        let now = Utc::now();
        assert_eq!(format_ago(now), "now");
        assert_eq!(format_ago(now - chrono::Duration::minutes(5)), "5m");
        assert_eq!(format_ago(now - chrono::Duration::hours(3)), "3h");
        let old = now - chrono::Duration::days(4);
        assert_eq!(format_ago(old), old.format("%Y-%m-%d").to_string());
    }
}
