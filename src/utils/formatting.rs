use std::time::Duration;

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis() as u64;
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// "2.4s elapsed, ~7.1s left" style summary for the progress header.
pub fn format_eta(elapsed: Duration, remaining: Duration) -> String {
    if remaining.is_zero() {
        format!("{} elapsed", format_duration(elapsed))
    } else {
        format!("{} elapsed, ~{} left", format_duration(elapsed), format_duration(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ranges() {
        assert_eq!(format_duration(Duration::from_millis(450)), "450ms");
        assert_eq!(format_duration(Duration::from_millis(2_400)), "2.4s");
        assert_eq!(format_duration(Duration::from_secs(95)), "1m 35s");
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(
            format_eta(Duration::from_millis(2_400), Duration::from_millis(7_100)),
            "2.4s elapsed, ~7.1s left"
        );
        assert_eq!(format_eta(Duration::from_secs(3), Duration::ZERO), "3.0s elapsed");
    }
}
