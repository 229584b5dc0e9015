use std::time::Duration;

/// Parse `<n><unit>` terms with units `ms`, `s`, `m`, `h` and `d`. Terms can
/// be chained, as in `1h30m` or `2m500ms`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let invalid = || format!("invalid duration `{value}`, expected e.g. 500ms, 30s, 5m, 1h30m or 1d");

    if value.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let amount: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let term = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(amount)),
            "s" => Some(Duration::from_secs(amount)),
            "m" => amount.checked_mul(60).map(Duration::from_secs),
            "h" => amount.checked_mul(3600).map(Duration::from_secs),
            "d" => amount.checked_mul(86400).map(Duration::from_secs),
            _ => None,
        }
        .ok_or_else(invalid)?;
        rest = &rest[unit_len..];

        total = total.checked_add(term).ok_or_else(invalid)?;
    }

    Ok(total)
}
