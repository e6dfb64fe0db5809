//! Fixed-point conversion and display formatting for token amounts and durations.

use alloy_primitives::U256;

pub const PLACEHOLDER: &str = "—";
pub const UNLOCKED: &str = "Unlocked";

const SECS_IN_MINUTE: i64 = 60;
const SECS_IN_HOUR: i64 = 3_600;
const SECS_IN_DAY: i64 = 86_400;

/// Exact decimal rendering of a smallest-unit amount, trailing zeros dropped.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_owned()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Parses user input such as `"12.5"` or `"1,000"` into smallest units.
/// Returns `None` for anything that is not a plain non-negative decimal
/// number, for misplaced thousands separators, and for more fraction digits
/// than the token has decimals.
pub fn parse_units(input: &str, decimals: u8) -> Option<U256> {
    let input = strip_grouping(input.trim())?;
    let (whole, fraction) = split_decimal(&input)?;
    let decimals = decimals as usize;
    if fraction.len() > decimals {
        return None;
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let padding = "0".repeat(decimals - fraction.len());
    U256::from_str_radix(&format!("{}{}{}", whole, fraction, padding), 10).ok()
}

/// Removes en-US thousands separators, accepting them only between groups
/// of three digits in the whole part.
fn strip_grouping(input: &str) -> Option<String> {
    if !input.contains(',') {
        return Some(input.to_owned());
    }
    let (whole, rest) = match input.find('.') {
        Some(dot) => input.split_at(dot),
        None => (input, ""),
    };
    let mut groups = whole.split(',');
    let first = groups.next().unwrap_or_default();
    if first.is_empty() || first.len() > 3 || rest.contains(',') {
        return None;
    }
    let mut stripped = first.to_owned();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        stripped.push_str(group);
    }
    stripped.push_str(rest);
    Some(stripped)
}

/// Parsed amount that is strictly positive.
pub fn parse_positive_units(input: &str, decimals: u8) -> Option<U256> {
    parse_units(input, decimals).filter(|value| !value.is_zero())
}

/// Groups a decimal string with thousands separators and rounds it to at most
/// `max_fraction_digits`. Non-numeric, zero and negative input yield `"0"`.
pub fn format_amount(raw: &str, max_fraction_digits: usize) -> String {
    let cleaned = raw.trim().replace(',', "");
    let (whole, fraction) = match split_decimal(&cleaned) {
        Some(parts) => parts,
        None => return "0".to_owned(),
    };

    let (whole, fraction) = round_half_up(whole, fraction, max_fraction_digits);
    let fraction = fraction.trim_end_matches('0');
    let whole = whole.trim_start_matches('0');
    if whole.is_empty() && fraction.is_empty() {
        return "0".to_owned();
    }

    let grouped = group_thousands(if whole.is_empty() { "0" } else { whole });
    if fraction.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, fraction)
    }
}

/// `format_units` followed by `format_amount`.
pub fn display_amount(value: U256, decimals: u8, max_fraction_digits: usize) -> String {
    format_amount(&format_units(value, decimals), max_fraction_digits)
}

/// Penalty in percent, e.g. 1000 bps -> "10%".
pub fn penalty_percent(bps: U256) -> String {
    format!("{}%", format_amount(&format_units(bps, 2), 2))
}

/// Reward duration in days, placeholder when the contract reports nothing.
pub fn duration_days(seconds: U256) -> String {
    if seconds.is_zero() {
        return PLACEHOLDER.to_owned();
    }
    let day = U256::from(SECS_IN_DAY as u64);
    let whole = seconds / day;
    let hundredths = u64::try_from((seconds % day) * U256::from(100u8) / day).unwrap_or(0);
    format_amount(&format!("{}.{:02}", whole, hundredths), 2)
}

/// Coarsest two non-zero units: "3d 4h", "5h 12m", "42m". Sub-minute
/// remainders show as "<1m"; zero or negative as [`UNLOCKED`].
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return UNLOCKED.to_owned();
    }
    let days = seconds / SECS_IN_DAY;
    let hours = (seconds % SECS_IN_DAY) / SECS_IN_HOUR;
    let minutes = (seconds % SECS_IN_HOUR) / SECS_IN_MINUTE;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "<1m".to_owned()
    }
}

/// "0x1234…abcd"
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_owned();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

/// Clamps an on-chain integer into unix seconds.
pub fn to_unix_seconds(value: U256) -> i64 {
    u64::try_from(value)
        .ok()
        .and_then(|secs| i64::try_from(secs).ok())
        .unwrap_or(i64::MAX)
}

fn split_decimal(input: &str) -> Option<(&str, &str)> {
    if input.is_empty() || input == "." {
        return None;
    }
    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return None;
    }
    Some((whole, fraction))
}

fn round_half_up(whole: &str, fraction: &str, max_fraction_digits: usize) -> (String, String) {
    if fraction.len() <= max_fraction_digits {
        return (whole.to_owned(), fraction.to_owned());
    }
    let round_up = fraction.as_bytes()[max_fraction_digits] >= b'5';
    let mut digits: Vec<u8> = whole
        .bytes()
        .chain(fraction.bytes().take(max_fraction_digits))
        .collect();
    if round_up {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }
    let split = digits.len() - max_fraction_digits;
    let whole = String::from_utf8_lossy(&digits[..split]).into_owned();
    let fraction = String::from_utf8_lossy(&digits[split..]).into_owned();
    (whole, fraction)
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
