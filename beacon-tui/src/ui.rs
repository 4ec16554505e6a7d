//! Terminal UI rendering with ratatui

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use serde_json::Value;

use beacon_core::protocol::TIMESTAMP_FORMAT;
use beacon_core::DeviceRecord;

use crate::app::{App, ConnectionState};

/// Fields shown in their own rows of the detail pane
const KNOWN_FIELDS: [&str; 5] = ["time", "lat", "lng", "isOnline", "bootTime"];

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(1),    // Devices
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    draw_title_bar(f, app, chunks[0]);
    draw_device_list(f, app, body[0]);
    draw_device_detail(f, app, body[1]);
    draw_status_bar(f, app, chunks[2]);
}

/// Draw the title bar with relay URL and connection state
fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(" beacon  {} ", app.config.client.server_url);
    let (indicator, color) = match app.connection {
        ConnectionState::Connecting => (" [Connecting]", Color::Yellow),
        ConnectionState::Live => (" [Live]", Color::Green),
        ConnectionState::Disconnected(_) => (" [Disconnected]", Color::Red),
    };

    let title_bar = Paragraph::new(Line::from(vec![
        Span::styled(title, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(indicator, Style::default().fg(color)),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    f.render_widget(title_bar, area);
}

/// Draw the device list
fn draw_device_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let online = matches!(device.field("isOnline"), Some(Value::Bool(true)));
            let marker = Span::styled(
                if online { "● " } else { "○ " },
                Style::default().fg(if online { Color::Green } else { Color::Red }),
            );

            let style = if i == app.cursor {
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![marker, Span::styled(device.device_id.clone(), style)]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::RIGHT)
            .title(format!(" Devices ({}) ", app.devices.len())),
    );

    f.render_widget(list, area);
}

/// Draw the selected device's fields
fn draw_device_detail(f: &mut Frame, app: &App, area: Rect) {
    let lines = match app.selected() {
        Some(device) => detail_lines(device),
        None => vec![Line::from(Span::styled(
            "No devices have reported yet",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let detail = Paragraph::new(lines).block(Block::default().title(" Detail "));
    f.render_widget(detail, area);
}

fn detail_lines(device: &DeviceRecord) -> Vec<Line<'static>> {
    let mut rows = vec![
        ("Device".to_string(), device.device_id.clone()),
        ("Time".to_string(), format_epoch(device.field("time"))),
        ("Latitude".to_string(), format_value(device.field("lat"))),
        ("Longitude".to_string(), format_value(device.field("lng"))),
        ("Online".to_string(), format_value(device.field("isOnline"))),
        ("Boot time".to_string(), format_epoch(device.field("bootTime"))),
        ("Last update".to_string(), device.last_update.clone()),
    ];

    // Anything else the device reported
    rows.extend(
        device
            .fields
            .iter()
            .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), format_value(Some(value)))),
    );

    let label_style = Style::default().fg(Color::DarkGray);
    rows.into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{:<12}", label), label_style),
                Span::raw(value),
            ])
        })
        .collect()
}

/// Draw the status bar
fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match app.connection {
        ConnectionState::Disconnected(ref reason) => {
            (format!("Disconnected: {}", reason), Style::default().fg(Color::Red))
        }
        _ => (
            format!("j↓ k↑ g:top G:bottom │ q:quit │ {} snapshot(s)", app.snapshots),
            Style::default().fg(Color::DarkGray),
        ),
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Render a reported value for display
fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render Unix seconds as local time; other values as-is
fn format_epoch(value: Option<&Value>) -> String {
    let secs = match value.and_then(Value::as_i64) {
        Some(secs) => secs,
        None => return format_value(value),
    };

    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&chrono::Local).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None), "-");
        assert_eq!(format_value(Some(&Value::Null)), "-");
        assert_eq!(format_value(Some(&json!("2024-01-01"))), "2024-01-01");
        assert_eq!(format_value(Some(&json!(31.5))), "31.5");
        assert_eq!(format_value(Some(&json!(true))), "true");
    }

    #[test]
    fn test_format_epoch() {
        let formatted = format_epoch(Some(&json!(1706000000)));
        assert!(chrono::NaiveDateTime::parse_from_str(&formatted, TIMESTAMP_FORMAT).is_ok());

        assert_eq!(format_epoch(Some(&json!("2024-01-01 10:00:00"))), "2024-01-01 10:00:00");
        assert_eq!(format_epoch(None), "-");
    }

    #[test]
    fn test_detail_lists_extra_fields() {
        let Value::Object(data) = json!({"deviceId": "A1", "lat": 1.0, "battery": 80}) else {
            unreachable!()
        };
        let device = DeviceRecord::from_report(data, "t".to_string()).unwrap();

        let lines = detail_lines(&device);
        // Seven fixed rows plus one extra field
        assert_eq!(lines.len(), 8);
    }
}
