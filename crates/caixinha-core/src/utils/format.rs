use chrono::{Local, NaiveDate};

/// Normalize an amount typed in pt-BR style to the API's decimal format.
/// With a comma present the dots are thousands separators: "1.234,56" -> "1234.56".
/// Without a comma the input is assumed to be in API format already.
pub fn normalize_amount(raw: &str) -> String {
    let value = raw.trim();
    if value.contains(',') {
        value.replace('.', "").replacen(',', ".", 1)
    } else {
        value.to_string()
    }
}

/// Parse a decimal amount string ("14.99", "10", "-3.5") into cents.
/// More than two decimal places is rejected.
pub fn parse_cents(amount: &str) -> Option<i64> {
    let s = amount.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) || frac.len() > 2 {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    let cents = whole.checked_mul(100)?.checked_add(frac)?;
    Some(if negative { -cents } else { cents })
}

/// Format cents back to the API's decimal format
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Current month as YYYY-MM
pub fn current_month() -> String {
    Local::now().format("%Y-%m").to_string()
}

/// Today as YYYY-MM-DD
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Check a YYYY-MM month string
pub fn is_valid_month(month: &str) -> bool {
    month.len() == 7 && NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").is_ok()
}

/// Check a YYYY-MM-DD date string
pub fn is_valid_date(date: &str) -> bool {
    date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}
