//! Rendering of averaged values.

/// Mean of `sum` over `count` repeats.
pub fn mean(sum: f64, count: usize) -> f64 {
    sum / count as f64
}

/// Tabular rendering: six decimals, collapsed to an integer when the
/// six-decimal rendering is integral.
pub fn render_cell(value: f64) -> String {
    let fixed = format!("{:.6}", value);
    match fixed.strip_suffix(".000000") {
        Some("-0") => "0".to_string(),
        Some(int) => int.to_string(),
        None => fixed,
    }
}

/// Free-text rendering: six decimals with trailing zeros and a trailing
/// decimal point removed.
pub fn render_literal(value: f64) -> String {
    let fixed = format!("{:.6}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_cell_integral_collapse() {
        assert_eq!(render_cell(mean(10.0 + 20.0 + 30.0, 3)), "20");
        assert_eq!(render_cell(1534.0), "1534");
        assert_eq!(render_cell(-0.0000001), "0");
        assert_eq!(render_cell(19.9999999), "20");
    }

    #[test]
    fn test_render_cell_keeps_six_decimals() {
        assert_eq!(render_cell(mean(3.1 + 3.1 + 3.2, 3)), "3.133333");
        assert_eq!(render_cell(3.1), "3.100000");
        assert_eq!(render_cell(0.5), "0.500000");
    }

    #[test]
    fn test_render_literal_strips_zeros() {
        assert_eq!(render_literal(20.0), "20");
        assert_eq!(render_literal(3.14), "3.14");
        assert_eq!(render_literal(0.0), "0");
        assert_eq!(render_literal(100.0), "100");
        assert_eq!(render_literal(mean(0.4 + 0.42 + 0.44, 3)), "0.42");
        assert_eq!(render_literal(1.0 / 3.0), "0.333333");
    }
}
