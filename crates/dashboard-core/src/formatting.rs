/// Format a number with thousands separators and a fixed number of decimal
/// places.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let factor = 10_f64.powi(decimals as i32);
    let magnitude = value.abs();
    // Nudge by one ULP at the target scale so 1.005 rounds to 1.01.
    let scaled = (magnitude * factor + f64::EPSILON * magnitude * factor).round() as u64;

    let unit = factor as u64;
    let whole = scaled / unit;
    let frac = scaled % unit;

    let mut out = group_thousands(&whole.to_string());
    if decimals > 0 {
        out.push('.');
        out.push_str(&format!("{:0width$}", frac, width = decimals as usize));
    }

    if value < 0.0 && scaled > 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// Format a dollar amount with two decimals.  Adjustments print with the
/// sign before the dollar symbol.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.56), "$1,234.56");
/// assert_eq!(format_currency(-9.99), "-$9.99");
/// ```
pub fn format_currency(amount: f64) -> String {
    let body = format_number(amount.abs(), 2);
    if amount < 0.0 && body != "0.00" {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

/// Format a distance in miles, e.g. `"12.35 mi"`.
pub fn format_miles(miles: f64) -> String {
    format!("{} mi", format_number(miles, 2))
}

/// `(part / whole) * 100`, rounded to `decimal_places`; `0.0` when `whole`
/// is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let factor = 10_f64.powi(decimal_places as i32);
    ((part / whole) * 100.0 * factor).round() / factor
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(5.0, 0), "5");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1_000.0, 0), "1,000");
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_decimals() {
        assert_eq!(format_number(123.456, 2), "123.46");
        assert_eq!(format_number(0.001, 3), "0.001");
        assert_eq!(format_number(1.005, 2), "1.01");
        assert_eq!(format_number(2.5, 2), "2.50");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-12.5), "-$12.50");
    }

    #[test]
    fn test_format_miles() {
        assert_eq!(format_miles(6.0), "6.00 mi");
        assert_eq!(format_miles(1234.567), "1,234.57 mi");
    }

    #[test]
    fn test_percentage() {
        assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
        assert!((percentage(1.0, 3.0, 2) - 33.33).abs() < 1e-9);
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
    }
}
