use regex::Regex;
use std::sync::LazyLock;

// `\d` is Unicode-aware, so full-width and other script digits match too.
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*[-–—aA]\s*(\d+)").unwrap());
static OPEN_ENDED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*\+").unwrap());
static FIRST_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d$").unwrap());

/// Parse a free-text age field.
///
/// - `"30-40"` (also en/em dash or `a`) yields the midpoint, halves rounded to even
/// - `"50+"` yields the lower bound
/// - any other text yields its first number (`"29 años"` -> 29)
/// - text without digits yields `default`
pub fn parse_age(raw: &str, default: u32) -> u32 {
    let text = raw.trim();
    if text.is_empty() {
        return default;
    }

    let fit = |value: Option<u64>| value.and_then(|v| u32::try_from(v).ok()).unwrap_or(default);
    if let Some(caps) = RANGE_RE.captures(text) {
        return match (number(&caps[1]), number(&caps[2])) {
            (Some(low), Some(high)) => fit(Some(midpoint_half_even(low, high))),
            _ => default,
        };
    }
    if let Some(caps) = OPEN_ENDED_RE.captures(text) {
        return fit(number(&caps[1]));
    }
    fit(FIRST_NUMBER_RE.find(text).and_then(|m| number(m.as_str())))
}

/// Value of a run of decimal digits from any script. `None` on overflow.
fn number(digits: &str) -> Option<u64> {
    digits.chars().try_fold(0u64, |acc, c| {
        acc.checked_mul(10)?.checked_add(digit_value(c)?)
    })
}

/// Decimal digits are encoded in contiguous runs from zero to nine, so the
/// value of a non-ASCII digit is its distance from the start of its run.
fn digit_value(c: char) -> Option<u64> {
    if let Some(value) = c.to_digit(10) {
        return Some(value.into());
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut offset = 0;
    let mut code = u32::from(c);
    while let Some(prev) = code.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        offset += 1;
        code -= 1;
    }
    Some(offset % 10)
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DIGIT_RE.is_match(c.encode_utf8(&mut buf))
}

fn midpoint_half_even(low: u64, high: u64) -> u64 {
    let sum = low.saturating_add(high);
    let half = sum / 2;
    if sum % 2 == 0 || half % 2 == 0 {
        half
    } else {
        half + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        assert_eq!(parse_age("30", 0), 30);
        assert_eq!(parse_age(" 41 ", 0), 41);
    }

    #[test]
    fn ranges_use_the_midpoint() {
        assert_eq!(parse_age("30-40", 0), 35);
        assert_eq!(parse_age("25 – 35", 0), 30);
        assert_eq!(parse_age("20a30", 0), 25);
        // 32.5 and 33.5 round to the even neighbour
        assert_eq!(parse_age("30-35", 0), 32);
        assert_eq!(parse_age("30-37", 0), 34);
    }

    #[test]
    fn open_ended_uses_lower_bound() {
        assert_eq!(parse_age("50+", 0), 50);
        assert_eq!(parse_age("18 +", 0), 18);
    }

    #[test]
    fn first_number_in_free_text() {
        assert_eq!(parse_age("29 años", 0), 29);
        assert_eq!(parse_age("aprox 33", 0), 33);
    }

    #[test]
    fn digits_from_other_scripts() {
        assert_eq!(parse_age("３０", 0), 30);
        assert_eq!(parse_age("２５-３５", 0), 30);
        assert_eq!(parse_age("٤٥ سنة", 0), 45);
        assert_eq!(parse_age("५०+", 0), 50);
    }

    #[test]
    fn unparseable_returns_default() {
        assert_eq!(parse_age("twenty", 0), 0);
        assert_eq!(parse_age("", 7), 7);
        assert_eq!(parse_age("n/d", 12), 12);
        assert_eq!(parse_age("99999999999999999999", 0), 0);
    }
}
