//! Human-relative timestamps ("3 days ago", "in 2h").
//!
//! `now` is always passed in so that one rendering pass uses a single
//! reference instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;
const MS_PER_MONTH: f64 = 30.0 * MS_PER_DAY;
const MS_PER_YEAR: f64 = 365.0 * MS_PER_DAY;

/// A rendered `<time>` element: raw attribute as title, relative text as body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeTime {
    pub title: String,
    pub text: String,
}

/// Relative description of `date` as seen from `now`.
pub fn relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - date).num_milliseconds();
    let past = elapsed > 0;
    let elapsed = elapsed.unsigned_abs() as f64;

    let amount = if elapsed < MS_PER_MINUTE * 2.0 {
        format!("{} sec", round_half_up(elapsed / MS_PER_SECOND))
    } else if elapsed < MS_PER_HOUR * 2.0 {
        format!("{} min", round_half_up(elapsed / MS_PER_MINUTE))
    } else if elapsed < MS_PER_DAY * 2.0 {
        format!("{}h", round_half_up(elapsed / MS_PER_HOUR))
    } else if elapsed < MS_PER_MONTH * 2.0 {
        format!("{} days", round_half_up(elapsed / MS_PER_DAY))
    } else if elapsed < MS_PER_YEAR * 2.0 {
        format!("{} months", round_half_up(elapsed / MS_PER_MONTH))
    } else {
        format!("{} years", round_half_up(elapsed / MS_PER_YEAR))
    };

    if past {
        format!("{} ago", amount)
    } else {
        format!("in {}", amount)
    }
}

/// Render an RFC 3339 `datetime` attribute relative to `now`.
pub fn render_time_tag(datetime: &str, now: DateTime<Utc>) -> Result<RelativeTime, chrono::ParseError> {
    let date = DateTime::parse_from_rfc3339(datetime.trim())?.with_timezone(&Utc);
    Ok(RelativeTime {
        title: datetime.to_string(),
        text: relative_date(date, now),
    })
}

fn round_half_up(x: f64) -> u64 {
    (x + 0.5).floor() as u64
}
