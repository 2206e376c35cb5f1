//! Markup builders. Every function here is pure: same input, same bytes out. Anything
//! clock-dependent takes `now`/`today` from the caller.

pub mod applications;
pub mod dashboard;
pub mod jobs;
pub mod messages;
pub mod profile;
pub mod talent;
pub mod wallet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::{display_amount, parse_date};

pub const RUPEE: &str = "\u{20b9}";

/// Escapes the five characters that can break out of text or attribute context.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn empty_state(message: &str) -> String {
    format!(r#"<p class="empty-state">{}</p>"#, escape_html(message))
}

/// "14 Mar 2025", or "N/A" for a missing/unparseable date.
pub fn format_date(raw: Option<&str>) -> String {
    raw.and_then(parse_date)
        .map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_date_time(raw: Option<&str>) -> String {
    match raw.and_then(parse_timestamp) {
        Some(ts) => ts.format("%d %b %Y, %H:%M").to_string(),
        None => format_date(raw),
    }
}

/// Accepts RFC 3339, naive ISO timestamps (taken as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

pub fn time_ago(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(then) = raw.and_then(parse_timestamp) else {
        return "N/A".to_string();
    };
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let plural = |n: i64, unit: &str| format!("{n} {unit}{} ago", if n > 1 { "s" } else { "" });
    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = hours / 24;
    if days < 7 {
        return plural(days, "day");
    }
    let weeks = days / 7;
    if weeks < 4 {
        return plural(weeks, "week");
    }
    format_date(raw)
}

/// Whole rupees with Indian digit grouping: 150000 -> "1,50,000".
pub fn format_inr(raw: &str) -> String {
    let amount: f64 = raw.trim().parse().unwrap_or(0.0);
    let negative = amount < 0.0;
    let digits = format!("{:.0}", amount.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            parts.push(&head[end - 2..end]);
            end -= 2;
        }
        parts.push(&head[..end]);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    if negative { format!("-{grouped}") } else { grouped }
}

/// Server amount without a zero decimal tail, or `missing` when absent.
pub fn display_amount_or(raw: Option<&str>, missing: &str) -> String {
    match raw {
        Some(raw) if !raw.trim().is_empty() => display_amount(raw),
        _ => missing.to_string(),
    }
}

/// Day number and short month for the date badges on event rows.
pub fn day_month(date: Option<NaiveDate>) -> (String, String) {
    match date {
        Some(d) => (d.format("%-d").to_string(), d.format("%b").to_string()),
        None => ("--".to_string(), "TBD".to_string()),
    }
}

pub fn time_range(start: Option<&str>, end: Option<&str>) -> String {
    format!(
        "{} - {}",
        escape_html(start.unwrap_or("TBD")),
        escape_html(end.unwrap_or("TBD"))
    )
}

/// Avatar image URL for a display name.
pub fn avatar_url(name: &str) -> String {
    let mut encoded = String::new();
    for b in name.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => encoded.push(b as char),
            _ => encoded.push_str(&format!("%{b:02X}")),
        }
    }
    format!("https://ui-avatars.com/api/?name={encoded}&background=6366f1&color=fff")
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
