use chrono::{DateTime, Utc};

fn to_datetime(timestamp: u64) -> Option<DateTime<Utc>> {
    i64::try_from(timestamp).ok().and_then(DateTime::<Utc>::from_timestamp_millis)
}

/// Format timestamp according to zoom level using UTC components.
///
/// - `zoom >= 2.0` -> `HH:MM`
/// - `1.0 <= zoom < 2.0` -> `DD.MM`
/// - `zoom < 1.0` -> `MM.YYYY`
pub fn format_time_label(timestamp: u64, zoom: f64) -> String {
    let Some(date) = to_datetime(timestamp) else {
        return String::new();
    };
    if zoom >= 2.0 {
        date.format("%H:%M").to_string()
    } else if zoom >= 1.0 {
        date.format("%d.%m").to_string()
    } else {
        date.format("%m.%Y").to_string()
    }
}

/// Full date of a bar for tooltips
pub fn format_bar_time(timestamp: u64) -> String {
    to_datetime(timestamp).map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_zoom() {
        assert_eq!(format_time_label(0, 2.0), "00:00");
        assert_eq!(format_time_label(0, 1.5), "01.01");
        assert_eq!(format_time_label(0, 0.5), "01.1970");
    }

    #[test]
    fn bar_time_is_a_date() {
        // 2024-03-15T12:00:00Z
        assert_eq!(format_bar_time(1_710_504_000_000), "2024-03-15");
    }
}
