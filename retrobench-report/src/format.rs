//! Number formatting for human output

/// Format a steps-per-second figure for the results table.
///
/// `>= 1000` has no decimals, `>= 100` one, anything else two. The integer
/// part is always grouped with commas.
pub fn format_fps(fps: f64) -> String {
    if !fps.is_finite() {
        return fps.to_string();
    }
    let raw = if fps >= 1000.0 {
        format!("{fps:.0}")
    } else if fps >= 100.0 {
        format!("{fps:.1}")
    } else {
        format!("{fps:.2}")
    };
    group_thousands(&raw)
}

/// Seconds as the operator typed them: always at least one decimal.
pub fn format_seconds(seconds: f64) -> String {
    if seconds.is_finite() && seconds.fract() == 0.0 {
        format!("{seconds:.1}")
    } else {
        seconds.to_string()
    }
}

fn group_thousands(number: &str) -> String {
    let (sign, rest) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_precision_by_magnitude() {
        assert_eq!(format_fps(12345.6), "12,346");
        assert_eq!(format_fps(1_234_567.0), "1,234,567");
        assert_eq!(format_fps(1000.0), "1,000");
        assert_eq!(format_fps(150.04), "150.0");
        assert_eq!(format_fps(59.94), "59.94");
        assert_eq!(format_fps(0.5), "0.50");
    }

    #[test]
    fn rounding_up_into_next_group_is_grouped() {
        assert_eq!(format_fps(999.96), "1,000.0");
    }

    #[test]
    fn seconds_keep_a_decimal() {
        assert_eq!(format_seconds(5.0), "5.0");
        assert_eq!(format_seconds(0.25), "0.25");
    }
}
