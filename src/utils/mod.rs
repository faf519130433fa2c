use chrono::{DateTime, NaiveDate, Utc};
use url::Url;

/// Calendar day of a Unix timestamp, read in UTC.
pub fn date_from_epoch(secs: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Calendar day of an ISO-8601 timestamp, read in UTC.
///
/// Offsets are applied before the date is taken, so `2021-06-30T23:30:00-02:00`
/// lands on 2021-07-01. Bare `YYYY-MM-DD` strings are accepted as-is.
pub fn date_from_iso(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    // Vimeo sometimes sends "+00:00" as "+0000"
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parses an image or player URL as returned by an API, upgrading
/// protocol-relative and plain `http` links to `https`.
pub fn parse_media_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let normalized = if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{}", rest)
    } else if let Some(rest) = raw.strip_prefix("http://") {
        format!("https://{}", rest)
    } else {
        raw.to_string()
    };
    Url::parse(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_maps_to_utc_day() {
        assert_eq!(date_from_epoch(1_640_995_200).map(format_date), Some("2022-01-01".to_string()));
        // one second before midnight UTC stays on the previous day
        assert_eq!(date_from_epoch(1_640_995_199).map(format_date), Some("2021-12-31".to_string()));
    }

    #[test]
    fn test_iso_maps_to_utc_day() {
        assert_eq!(date_from_iso("2022-01-01T00:00:00Z").map(format_date), Some("2022-01-01".to_string()));
        assert_eq!(date_from_iso("2021-06-30T23:30:00-02:00").map(format_date), Some("2021-07-01".to_string()));
        assert_eq!(date_from_iso("2021-07-01T01:00:00+0300").map(format_date), Some("2021-06-30".to_string()));
        assert_eq!(date_from_iso("2020-02-29").map(format_date), Some("2020-02-29".to_string()));
        assert_eq!(date_from_iso("yesterday"), None);
    }

    #[test]
    fn test_parse_media_url_upgrades_scheme() {
        assert_eq!(
            parse_media_url("//i0.hdslb.com/bfs/archive/a.jpg").map(|u| u.to_string()),
            Some("https://i0.hdslb.com/bfs/archive/a.jpg".to_string())
        );
        assert_eq!(
            parse_media_url("http://i1.hdslb.com/b.jpg").map(|u| u.to_string()),
            Some("https://i1.hdslb.com/b.jpg".to_string())
        );
        assert_eq!(parse_media_url(""), None);
        assert_eq!(parse_media_url("not a url"), None);
    }
}
