//! Locale-tolerant numeric and percentage parsing for spreadsheet cells.

/// Parse a cell into a number, returning `0.0` for anything unparseable.
///
/// Accepts currency symbols and codes, whitespace group separators, leading
/// or trailing signs, accounting parentheses, scientific notation and a
/// percent sign (stripped, not divided). See [`resolve_separators`] for the `,`/`.` rules.
pub fn to_number(raw: &str) -> f64 {
    try_number(raw).unwrap_or(0.0)
}

/// Like [`to_number`] but distinguishes an unparseable cell from zero.
pub fn try_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let first_digit = s.find(|c: char| c.is_ascii_digit())?;
    let last_digit = s.rfind(|c: char| c.is_ascii_digit())?;

    // A separator directly before the first digit belongs to the number (".5").
    let mut start = first_digit;
    if s[..start].ends_with(['.', ',']) {
        start -= 1;
    }
    let prefix = &s[..start];
    let suffix = &s[last_digit + 1..];
    let (mantissa_end, exponent) = match split_exponent(&s[start..=last_digit]) {
        Some((at, exp)) => (start + at, Some(exp)),
        None => (last_digit + 1, None),
    };

    let is_minus = |c: char| c == '-' || c == '\u{2212}';
    let negative = prefix.contains(is_minus)
        || suffix.contains(is_minus)
        || (prefix.contains('(') && suffix.contains(')'));

    let body: String = s[start..mantissa_end]
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let mantissa = resolve_separators(&body);
    let value = match exponent {
        Some(exp) => format!("{}e{}", mantissa, exp).parse::<f64>().ok()?,
        None => mantissa.parse::<f64>().ok()?,
    };
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Split a trailing `[eE][+-]?digits` exponent off a number, returning its
/// byte offset and value. The mantissa must end in a digit.
fn split_exponent(number: &str) -> Option<(usize, i32)> {
    let at = number.rfind(['e', 'E'])?;
    let (mantissa, exp) = (&number[..at], &number[at + 1..]);
    if !mantissa.ends_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((at, exp.parse().ok()?))
}

/// Decide which of `,` and `.` is the decimal point in a digits-and-separators
/// string and return it in `1234.5` form.
///
/// - both present: the one appearing last is the decimal point;
/// - only `,`: two or more are thousands separators; a single comma followed
///   by exactly three digits after a digit-only prefix is a thousands
///   separator; any other single comma is a decimal point;
/// - only `.`: two or more are thousands separators, one is a decimal point.
pub fn resolve_separators(body: &str) -> String {
    let last_comma = body.rfind(',');
    let last_dot = body.rfind('.');

    match (last_comma, last_dot) {
        (Some(c), Some(d)) => {
            let (decimal, group) = if c > d { (',', '.') } else { ('.', ',') };
            body.chars()
                .filter(|ch| *ch != group)
                .map(|ch| if ch == decimal { '.' } else { ch })
                .collect()
        }
        (Some(c), None) => {
            if body.matches(',').count() >= 2 {
                return body.replace(',', "");
            }
            let (before, after) = (&body[..c], &body[c + 1..]);
            let is_group = !before.is_empty()
                && before.chars().all(|ch| ch.is_ascii_digit())
                && after.len() == 3
                && after.chars().all(|ch| ch.is_ascii_digit());
            if is_group {
                format!("{}{}", before, after)
            } else {
                format!("{}.{}", before, after)
            }
        }
        (None, Some(_)) if body.matches('.').count() >= 2 => body.replace('.', ""),
        _ => body.to_string(),
    }
}

/// Parse an impression-share style value into a 0–100 percentage.
///
/// A literal `%` means the value is already a percentage; otherwise values in
/// `0..=1` are treated as fractions. Blank cells and `--` yield `None`.
pub fn share_percent(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s.chars().all(|c| c == '-') {
        return None;
    }
    let value = try_number(s)?;
    if s.contains('%') {
        Some(value)
    } else if (0.0..=1.0).contains(&value) {
        Some(value * 100.0)
    } else {
        Some(value)
    }
}

/// Render a share value as `"NN.NN%"`.
pub fn to_percent(raw: &str) -> Option<String> {
    share_percent(raw).map(|v| format!("{:.2}%", v))
}
