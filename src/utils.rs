//! Formatting helpers for human-readable status output. The core emits
//! structured records; everything here belongs to the presentation shell.

pub fn format_duration_ns(nanos: u64) -> String {
    if nanos < 1_000 {
        format!("{nanos}ns")
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

pub fn format_rate(events_per_second: f64) -> String {
    if events_per_second >= 1_000_000.0 {
        format!("{:.2}M/s", events_per_second / 1_000_000.0)
    } else if events_per_second >= 1_000.0 {
        format!("{:.2}k/s", events_per_second / 1_000.0)
    } else {
        format!("{events_per_second:.1}/s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_picks_the_right_unit() {
        assert_eq!(format_duration_ns(500), "500ns");
        assert_eq!(format_duration_ns(1_500), "1.50us");
        assert_eq!(format_duration_ns(1_500_000), "1.50ms");
        assert_eq!(format_duration_ns(1_500_000_000), "1.50s");
    }

    #[test]
    fn rate_picks_the_right_unit() {
        assert_eq!(format_rate(12.34), "12.3/s");
        assert_eq!(format_rate(12_340.0), "12.34k/s");
        assert_eq!(format_rate(1_234_000.0), "1.23M/s");
    }
}
