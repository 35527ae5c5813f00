use rand::Rng;

/// Draw a jitter minute from an inclusive range.
///
/// Degenerate ranges (`max < min`) collapse to `min` rather than panicking,
/// so a hand-edited config cannot take the scheduler down.
pub fn jitter_minute(min: u32, max: u32, rng: &mut impl Rng) -> u32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}

/// Render a span of minutes the way the scheduler logs it:
/// "3 hours and 25 minutes", "1 hour and 1 minute", "45 minutes".
pub fn format_span(total_minutes: u64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let unit = |n: u64, word: &str| {
        if n == 1 {
            format!("1 {word}")
        } else {
            format!("{n} {word}s")
        }
    };

    if hours == 0 {
        unit(minutes, "minute")
    } else {
        format!("{} and {}", unit(hours, "hour"), unit(minutes, "minute"))
    }
}
