use std::fmt;

/// Money is represented as integer cents (minor units) so sums stay exact.
/// For EUR, 1 unit = 100 cents, so €50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents with a dot separator.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    format_cents_with(cents, '.')
}

/// Format cents the way till labels and receipts show them.
/// Example: 20000 -> "200,00", 50 -> "0,50"
pub fn format_cents_comma(cents: Cents) -> String {
    format_cents_with(cents, ',')
}

fn format_cents_with(cents: Cents, separator: char) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}{}{:02}", sign, abs_cents / 100, separator, abs_cents % 100)
}

/// Parse a decimal string into cents. Both `.` and `,` are accepted as the
/// decimal separator.
/// Example: "50.00" -> 5000, "0,5" -> 50, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');
    if input.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let parts: Vec<&str> = input.split(['.', ',']).collect();
    let (units, decimals) = match parts.as_slice() {
        [units] => (*units, ""),
        [units, decimals] => (*units, *decimals),
        _ => return Err(ParseCentsError::InvalidFormat),
    };

    let units: i64 = if units.is_empty() {
        0
    } else {
        parse_digits(units)?
    };

    if !decimals.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }

    // Pad or truncate to 2 digits
    let decimal_cents = match decimals.len() {
        0 => 0,
        1 => parse_digits(decimals)? * 10,
        _ => parse_digits(&decimals[..2])?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

fn parse_digits(s: &str) -> Result<i64, ParseCentsError> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    s.parse().map_err(|_| ParseCentsError::Overflow)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Overflow => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
