//! Display strings for listing numbers (en-US conventions).

const SQFT_PER_ACRE: f64 = 43_560.0;

/// `1250000` -> `1,250,000`
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if value < 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// USD with no decimals: `$1,250,000`
pub fn format_price(price: f64) -> String {
    let rounded = price.round() as i64;
    if rounded < 0 {
        format!("-${}", group_thousands(-rounded))
    } else {
        format!("${}", group_thousands(rounded))
    }
}

/// `2,350`, or `N/A` when absent or zero
pub fn format_sqft(sqft: Option<f64>) -> String {
    match sqft {
        Some(s) if s != 0.0 => group_thousands(s.round() as i64),
        _ => "N/A".to_string(),
    }
}

/// Acres win when present; large square footage is converted to acres.
pub fn format_lot_size(acres: Option<f64>, sqft: Option<f64>) -> String {
    if let Some(acres) = acres.filter(|a| *a > 0.0) {
        return format!("{:.2} acres", acres);
    }

    match sqft.filter(|s| *s > 0.0) {
        Some(s) if s > SQFT_PER_ACRE => format!("{:.2} acres", s / SQFT_PER_ACRE),
        Some(s) => format!("{} sq ft", group_thousands(s.round() as i64)),
        None => "N/A".to_string(),
    }
}

pub fn format_parking(garage_spaces: Option<f64>, total_spaces: Option<f64>) -> String {
    if let Some(garage) = garage_spaces.filter(|g| *g > 0.0) {
        return format!("{}-car garage", garage);
    }
    if let Some(total) = total_spaces.filter(|t| *t > 0.0) {
        return format!("{} parking spaces", total);
    }
    "Parking available".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_250_000), "1,250,000");
        assert_eq!(group_thousands(-12_345), "-12,345");
    }

    #[test]
    fn price_rounds_to_whole_dollars() {
        assert_eq!(format_price(1_250_000.0), "$1,250,000");
        assert_eq!(format_price(499_999.6), "$500,000");
        assert_eq!(format_price(0.0), "$0");
    }

    #[test]
    fn sqft_falls_back_to_na() {
        assert_eq!(format_sqft(Some(2_350.0)), "2,350");
        assert_eq!(format_sqft(Some(0.0)), "N/A");
        assert_eq!(format_sqft(None), "N/A");
    }

    #[test]
    fn lot_size_rules() {
        assert_eq!(format_lot_size(None, Some(50_000.0)), "1.15 acres");
        assert_eq!(format_lot_size(Some(0.5), None), "0.50 acres");
        assert_eq!(format_lot_size(Some(0.5), Some(50_000.0)), "0.50 acres");
        assert_eq!(format_lot_size(Some(0.0), Some(12_000.0)), "12,000 sq ft");
        assert_eq!(format_lot_size(None, Some(43_560.0)), "43,560 sq ft");
        assert_eq!(format_lot_size(None, None), "N/A");
    }

    #[test]
    fn parking_prefers_garage() {
        assert_eq!(format_parking(Some(2.0), Some(4.0)), "2-car garage");
        assert_eq!(format_parking(Some(0.0), Some(4.0)), "4 parking spaces");
        assert_eq!(format_parking(None, None), "Parking available");
    }
}
