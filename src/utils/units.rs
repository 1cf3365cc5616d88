use crate::readers::field_decoder::parse_number;
use crate::utils::constants::{MM_PER_INCH, TRACE_AMOUNT};

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Tenths of °C (GHCN) to °F.
///
/// ```
/// use station_obs_merger::utils::units::tenths_celsius_to_fahrenheit;
///
/// assert_eq!(tenths_celsius_to_fahrenheit(-56.0), 21.92);
/// assert_eq!(tenths_celsius_to_fahrenheit(0.0), 32.0);
/// ```
pub fn tenths_celsius_to_fahrenheit(raw: f64) -> f64 {
    round2(celsius_to_fahrenheit(raw / 10.0))
}

/// Scale of a raw length value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthScale {
    Millimetres,
    TenthsOfMillimetres,
    HundredthsOfMillimetres,
}

impl LengthScale {
    fn divisor(&self) -> f64 {
        match self {
            LengthScale::Millimetres => 1.0,
            LengthScale::TenthsOfMillimetres => 10.0,
            LengthScale::HundredthsOfMillimetres => 100.0,
        }
    }
}

/// Raw length in the given scale to inches.
pub fn to_inches(raw: f64, scale: LengthScale) -> f64 {
    round2(raw / scale.divisor() / MM_PER_INCH)
}

/// Measurement class of a normals section. Normals are published in final
/// units (°F, inches) with an implied decimal, so only the scale is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalsClass {
    Temperature,
    Precipitation,
    Snow,
}

impl NormalsClass {
    fn divisor(&self) -> f64 {
        match self {
            NormalsClass::Temperature => 10.0,
            NormalsClass::Precipitation => 100.0,
            NormalsClass::Snow => 10.0,
        }
    }

    /// Precipitation and snow normals are month-to-date running totals.
    pub fn is_cumulative(&self) -> bool {
        matches!(self, NormalsClass::Precipitation | NormalsClass::Snow)
    }
}

pub fn scale_normal(raw: f64, class: NormalsClass) -> f64 {
    round2(raw / class.divisor())
}

/// Value already in display units (GSOD, climate summaries).
pub fn display_units(value: f64) -> f64 {
    round2(value)
}

/// Decode a reported climate-summary value: `M` is missing, `T` is a trace.
pub fn reported_value(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("m") {
        None
    } else if text.eq_ignore_ascii_case("t") {
        Some(TRACE_AMOUNT)
    } else {
        parse_number(text).map(|n| n.as_f64())
    }
}

/// Turns month-to-date running totals into per-day amounts.
///
/// The first value of a month passes through unchanged; later values have the
/// previous cumulative total subtracted. Create one per month.
#[derive(Debug, Default)]
pub struct MonthToDate {
    previous: Option<f64>,
}

impl MonthToDate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A total below the previous one yields a negative amount, as when a
    /// -7777 (rounds to zero) code follows a positive total.
    pub fn next(&mut self, cumulative: f64) -> f64 {
        let daily = match self.previous {
            Some(previous) => round2(cumulative - previous),
            None => cumulative,
        };
        self.previous = Some(cumulative);
        daily
    }
}
