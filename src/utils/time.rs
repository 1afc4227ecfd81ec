use chrono::{DateTime, Duration, Utc};

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}

pub fn seconds_until(deadline: DateTime<Utc>) -> i64 {
    (deadline - Utc::now()).num_seconds().max(0)
}
