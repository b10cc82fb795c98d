use std::str::FromStr;

use log::warn;
use rust_decimal::Decimal;

/// Converts a locale-formatted amount (`1.234.567,89`, `1,234.56`, `$ 12,5`)
/// into an exact decimal. Unparseable text yields zero.
pub fn normalize(text: &str) -> Decimal {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let parsed = if cleaned.is_empty() {
        None
    } else {
        Decimal::from_str(&canonicalize(&cleaned)).ok()
    };

    parsed.unwrap_or_else(|| {
        warn!("could not convert '{}' to a decimal amount", text);
        Decimal::ZERO
    })
}

fn canonicalize(cleaned: &str) -> String {
    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    match (last_comma, last_dot) {
        // both present: whichever comes last separates the decimals
        (Some(comma), Some(dot)) if comma > dot => {
            let (integer, decimals) = cleaned.split_at(comma);
            format!("{}.{}", integer.replace('.', ""), &decimals[1..])
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // a lone comma with at most two decimals; anything else is left as is
        (Some(comma), None)
            if cleaned.matches(',').count() == 1 && cleaned.len() - comma - 1 <= 2 =>
        {
            cleaned.replace(',', ".")
        }
        _ => cleaned.to_string(),
    }
}
