use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp the way genesis documents store `genesis_time`.
///
/// RFC 3339 in UTC with a `Z` suffix; sub-second digits only when present.
pub fn genesis_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// The Unix epoch, used when a launch has no configured time.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}
