use chrono::NaiveDate;

/// Reads a `DD/MM/YYYY` or `DD/MM/YY` statement date. Two-digit years below
/// 50 belong to the 2000s, the rest to the 1900s.
pub fn parse_statement_date(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = match parts[2].len() {
        2 => {
            let short: i32 = parts[2].parse().ok()?;
            if short < 50 {
                2000 + short
            } else {
                1900 + short
            }
        }
        4 => parts[2].parse().ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// ISO form of a statement date, or the input unchanged when it cannot be read.
pub fn normalize_date(text: &str) -> String {
    match parse_statement_date(text) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => text.to_string(),
    }
}
