use chrono::{Datelike, NaiveDate};

/// "2h 16m", or "45m" under an hour.
pub fn format_runtime(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// "1999-03-31" becomes "March 31, 1999". Unparseable input is returned as is.
pub fn format_date(date: &str) -> String {
    match parse_date(date) {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => date.trim().to_string(),
    }
}

pub fn year_from_date(date: Option<&str>) -> Option<i32> {
    date.and_then(parse_date).map(|d| d.year())
}

/// Cuts to `max_chars` characters and appends "..." when anything was cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// One decimal place; a zero rating means "not rated".
pub fn format_rating(vote_average: f64) -> String {
    if vote_average > 0.0 {
        format!("{:.1}", vote_average)
    } else {
        "N/A".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_formats() {
        assert_eq!(format_runtime(136), "2h 16m");
        assert_eq!(format_runtime(60), "1h 0m");
        assert_eq!(format_runtime(45), "45m");
    }

    #[test]
    fn dates_format_and_fall_back() {
        assert_eq!(format_date("1999-03-31"), "March 31, 1999");
        assert_eq!(format_date("2024-01-05"), "January 5, 2024");
        assert_eq!(format_date("soon"), "soon");
        assert_eq!(year_from_date(Some("2010-07-16")), Some(2010));
        assert_eq!(year_from_date(Some("")), None);
        assert_eq!(year_from_date(None), None);
    }

    #[test]
    fn truncation_is_char_aware() {
        assert_eq!(truncate_text("Short", 15), "Short");
        assert_eq!(truncate_text("Exactly fifteen", 15), "Exactly fifteen");
        assert_eq!(truncate_text("Léon: The Professional", 4), "Léon...");
    }

    #[test]
    fn ratings() {
        assert_eq!(format_rating(8.456), "8.5");
        assert_eq!(format_rating(0.0), "N/A");
    }
}
