//! Human-readable formatting of snapshot data.
//!
//! Everything here is pure; the CLI and any other front end share it.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::coord::Coordinate;
use crate::pass::PassWindow;
use crate::snapshot::{PassStatus, PositionStatus, Snapshot, SourceKind};

/// Format a coordinate with hemisphere letters, e.g. `51.50° N, 0.12° W`.
pub fn format_hemisphere(coordinate: Coordinate) -> String {
    let ns = if coordinate.lat() >= 0.0 { 'N' } else { 'S' };
    let ew = if coordinate.lng() >= 0.0 { 'E' } else { 'W' };
    format!(
        "{:.2}° {}, {:.2}° {}",
        coordinate.lat().abs(),
        ns,
        coordinate.lng().abs(),
        ew
    )
}

/// Signed observer coordinate at four decimals.
pub fn format_observer(coordinate: Coordinate) -> String {
    format!("{:.4}°, {:.4}°", coordinate.lat(), coordinate.lng())
}

/// Pass duration in whole minutes, rounded half up.
pub fn duration_minutes(duration_seconds: u32) -> u32 {
    duration_seconds.saturating_add(30) / 60
}

/// Rise time in `tz`, e.g. `Nov 14, 10:13 PM`.
pub fn format_rise_time_in<Tz>(rise_time: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    rise_time.with_timezone(tz).format("%b %-d, %I:%M %p").to_string()
}

/// Rise time in the local time zone.
pub fn format_rise_time(rise_time: DateTime<Utc>) -> String {
    format_rise_time_in(rise_time, &Local)
}

/// One-line description of the next pass.
pub fn describe_pass(pass: &PassWindow) -> String {
    format!(
        "{}, visible for ~{} minutes",
        format_rise_time(pass.rise_time),
        duration_minutes(pass.duration_seconds)
    )
}

/// Status text for the pass panel.
pub fn pass_line(snapshot: &Snapshot) -> String {
    match (snapshot.pass_status, &snapshot.pass) {
        (_, Some(pass)) => describe_pass(pass),
        (PassStatus::Pending, None) => "Calculating next pass...".to_string(),
        (PassStatus::NoneScheduled, None) => "No upcoming passes found".to_string(),
        (PassStatus::Unavailable, None) | (PassStatus::Scheduled, None) => {
            "Pass prediction unavailable".to_string()
        }
    }
}

/// Status text for the position panel.
pub fn position_line(snapshot: &Snapshot) -> String {
    let status = snapshot.position_status();
    let position = snapshot
        .position
        .map(|sample| format_hemisphere(sample.coordinate));

    match (status, position) {
        (PositionStatus::Awaiting, _) => "Waiting for first position...".to_string(),
        (PositionStatus::Live, Some(text)) => text,
        (PositionStatus::Degraded, Some(text)) => format!("{} (stale)", text),
        (PositionStatus::Lost, Some(text)) => format!("{} (connection lost)", text),
        (PositionStatus::Lost, None) => "Position unavailable".to_string(),
        (_, None) => "Position unavailable".to_string(),
    }
}

/// Every raised fault, one per line.
pub fn error_lines(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .errors
        .values()
        .map(|fault| {
            let label = match fault.source {
                SourceKind::Position => "position",
                SourceKind::Geocode => "place name",
                SourceKind::Pass => "pass prediction",
            };
            format!(
                "{} failed ({}x, {:?}): {}",
                label, fault.consecutive_failures, fault.severity, fault.message
            )
        })
        .collect()
}
