//! Maximum heap size resolution.

/// Turn a `max-heap` setting into an `-Xmx` value.
///
/// Values without a trailing `%` pass through. A percentage is taken of
/// `total_memory` (bytes) and rendered in the largest unit that keeps the
/// number at or below 9999: kilobytes, then megabytes, then gigabytes.
/// Invalid percentages and unknown memory yield `None` with a warning.
pub fn resolve_max_heap(setting: Option<&str>, total_memory: Option<u64>) -> Option<String> {
    let setting = setting?.trim();
    let Some(percent) = setting.strip_suffix('%') else {
        return Some(setting.to_string());
    };

    let Some((percent, scale)) = parse_percent(percent.trim()) else {
        tracing::warn!("ignoring invalid max-heap percentage `{}`", setting);
        return None;
    };

    let Some(total) = total_memory else {
        tracing::warn!("cannot apply max-heap `{}`: total system memory is unknown", setting);
        return None;
    };

    let kb = u128::from(total) * percent / (100 * scale) / 1024;
    Some(format_size(u64::try_from(kb).unwrap_or(u64::MAX)))
}

/// Parse a positive decimal as `(value, scale)`, so `12.5` is `(125, 10)`.
fn parse_percent(text: &str) -> Option<(u128, u128)> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) || fraction.len() > 9 {
        return None;
    }

    let scale = 10u128.pow(fraction.len() as u32);
    let digits = format!("{}{}", whole, fraction);
    if digits.len() > 18 {
        return None;
    }
    let value: u128 = digits.parse().ok()?;
    (value > 0).then_some((value, scale))
}

fn format_size(kb: u64) -> String {
    if kb <= 9999 {
        return format!("{}k", kb);
    }
    let mb = kb / 1000;
    if mb <= 9999 {
        return format!("{}m", mb);
    }
    format!("{}g", mb / 1000)
}
