use chrono::{DateTime, TimeZone};

/// Hours and minutes on a 12-hour clock, without padding.
pub fn render<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%l:%M").to_string().trim().to_string()
}
