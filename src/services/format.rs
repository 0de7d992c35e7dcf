//! Text and time shaping shared by the response builders.

use chrono::{DateTime, SecondsFormat, Utc};

pub const MAX_TAGS: usize = 6;

/// RFC 3339 with second precision and a `Z` suffix.
pub fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-friendly age of a timestamp. Unset timestamps (epoch or earlier) render as `Recently`.
pub fn relative_timestamp(t: DateTime<Utc>) -> String {
    relative_timestamp_at(t, Utc::now())
}

pub fn relative_timestamp_at(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if t.timestamp() <= 0 {
        return "Recently".to_string();
    }

    let diff = now.signed_duration_since(t);
    let plural = |n: i64, unit: &str| {
        if n <= 1 {
            format!("1 {} ago", unit)
        } else {
            format!("{} {}s ago", n, unit)
        }
    };

    if diff.num_seconds() < 60 {
        "Just now".to_string()
    } else if diff.num_minutes() < 60 {
        plural(diff.num_minutes(), "minute")
    } else if diff.num_hours() < 24 {
        plural(diff.num_hours(), "hour")
    } else if diff.num_days() < 7 {
        plural(diff.num_days(), "day")
    } else if diff.num_days() < 30 {
        plural(diff.num_weeks(), "week")
    } else {
        t.format("%b %-d, %Y").to_string()
    }
}

/// Trim, then cut to `limit` characters with a trailing ellipsis when anything was dropped.
pub fn truncate_text(text: &str, limit: usize) -> String {
    let trimmed = text.trim();
    if limit == 0 || trimmed.chars().count() <= limit {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(limit).collect();
    let head_trimmed = head.trim();
    if head_trimmed.is_empty() {
        head
    } else {
        format!("{}…", head_trimmed)
    }
}

/// First non-empty line of the body, capped at 120 characters.
pub fn derive_title(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "Research update".to_string();
    }
    trimmed
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_text(line, 120))
        .unwrap_or_else(|| truncate_text(trimmed, 120))
}

/// Normalise user-supplied tags: strip `#`, spaces become dashes,
/// case-insensitive de-duplication, at most [`MAX_TAGS`].
pub fn sanitize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for tag in tags {
        let clean = tag
            .as_ref()
            .trim()
            .trim_start_matches('#')
            .trim()
            .replace(' ', "-");
        let clean = clean.trim_matches(|c| c == '-' || c == '_');
        if clean.is_empty() || !seen.insert(clean.to_lowercase()) {
            continue;
        }
        result.push(clean.to_string());
        if result.len() >= MAX_TAGS {
            break;
        }
    }
    result
}

/// `#word` occurrences in free text, where a word is ASCII alphanumerics, `_` or `-`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '#' {
            continue;
        }
        let mut word = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' || next == '-' {
                word.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !word.is_empty() {
            found.push(word);
        }
    }
    sanitize_tags(&found)
}

/// Concatenate keeping first occurrences (case-insensitive); `max == 0` means unbounded.
pub fn merge_unique(primary: &[String], secondary: &[String], max: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for value in primary.iter().chain(secondary) {
        let value = value.trim();
        if value.is_empty() || !seen.insert(value.to_lowercase()) {
            continue;
        }
        result.push(value.to_string());
        if max > 0 && result.len() >= max {
            break;
        }
    }
    result
}

pub fn ensure_url_scheme(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_ascii_lowercase();
    if ["http://", "https://", "data:", "//"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Upper-case the first letter of each word; `_` does not split words.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}
