//! Human-readable formatting of stream properties

/// Units of the bit-rate ladder, base 1000
const BITRATE_UNITS: [&str; 5] = ["bps", "Kbps", "Mbps", "Gbps", "Tbps"];

/// Placeholder for a missing bit rate
pub const NOT_AVAILABLE: &str = "N/A";

/// Format a bit rate in bits per second, e.g. `1500000` as `"1.5 Mbps"`
///
/// `None` and zero both format as `"N/A"`: zero is treated as "no
/// measurement". Use [`format_measured_bitrate`] when zero is a real value.
/// Negative and non-finite inputs also format as `"N/A"`.
pub fn format_bitrate(bitrate: Option<f64>) -> String {
    match bitrate {
        Some(bps) if bps.is_finite() && bps > 0.0 => scale(bps),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Format a measured bit rate, where zero formats as `"0 bps"`
pub fn format_measured_bitrate(bitrate: u64) -> String {
    if bitrate == 0 {
        return format!("0 {}", BITRATE_UNITS[0]);
    }
    scale(bitrate as f64)
}

fn scale(bps: f64) -> String {
    let mut value = bps;
    let mut unit = 0;
    while value >= 1000.0 && unit < BITRATE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, BITRATE_UNITS[unit])
}
