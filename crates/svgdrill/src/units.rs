//! Unit conversion between absolute CSS units and document user units.
//!
//! A document's user unit is whatever one `viewBox` unit measures on paper.
//! `DocumentUnits` carries the scale between user units and CSS pixels (96 per
//! inch) and the unit the drawing's bare numbers are assumed to be written in.

use crate::error::ExportError;
use crate::types::Unit;
use std::str::FromStr;
use svgtypes::{Length, LengthUnit};

/// CSS pixels per unit, at 96 pixels per inch.
const CONVERSIONS: &[(&str, f64)] = &[
    ("in", 96.0),
    ("pt", 96.0 / 72.0),
    ("px", 1.0),
    ("mm", 96.0 / 25.4),
    ("cm", 96.0 / 2.54),
    ("m", 96.0 / 0.0254),
    ("km", 96.0 / 0.0000254),
    ("Q", 96.0 / 25.4 / 4.0),
    ("pc", 16.0),
    ("yd", 3456.0),
    ("ft", 1152.0),
];

/// Relative tolerance when matching a width/viewBox ratio against a unit.
const UNIT_MATCH_TOLERANCE: f64 = 1e-3;

/// Pixels per one `unit`. An empty unit means pixels.
pub fn px_per_unit(unit: &str) -> Option<f64> {
    if unit.is_empty() {
        return Some(1.0);
    }
    CONVERSIONS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, factor)| *factor)
}

/// Split an SVG length such as `-1.5e2mm` into its number and unit name.
///
/// A bare number has an empty unit name. Relative units (`em`, `ex`, `%`)
/// have no absolute size and yield `None`, as does text that is not a length.
pub fn parse_length(text: &str) -> Option<(f64, &'static str)> {
    let length = Length::from_str(text.trim()).ok()?;
    let unit = match length.unit {
        LengthUnit::None => "",
        LengthUnit::Px => "px",
        LengthUnit::In => "in",
        LengthUnit::Cm => "cm",
        LengthUnit::Mm => "mm",
        LengthUnit::Pt => "pt",
        LengthUnit::Pc => "pc",
        _ => return None,
    };
    Some((length.number, unit))
}

/// Unit-conversion capability for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUnits {
    /// Unit bare numbers in the drawing are expressed in.
    unit: String,
    /// CSS pixels per user unit.
    scale: f64,
}

impl Default for DocumentUnits {
    fn default() -> Self {
        Self {
            unit: "px".to_string(),
            scale: 1.0,
        }
    }
}

impl DocumentUnits {
    pub fn new(unit: impl Into<String>, scale: f64) -> Self {
        Self {
            unit: unit.into(),
            scale,
        }
    }

    /// Derive the document unit and scale from the root `width` and `viewBox`.
    ///
    /// Without a usable viewBox the drawing is taken to be in pixels at scale 1.
    pub fn from_root(width: Option<&str>, viewbox: Option<[f64; 4]>) -> Self {
        let Some(view_width) = viewbox.map(|vb| vb[2]).filter(|w| *w > 0.0) else {
            return Self::default();
        };
        let Some(width_px) = width.and_then(length_to_px) else {
            return Self::default();
        };

        let scale = width_px / view_width;
        let unit = CONVERSIONS
            .iter()
            .find(|(_, factor)| (scale - factor).abs() <= factor * UNIT_MATCH_TOLERANCE)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "px".to_string());

        Self { unit, scale }
    }

    /// The unit bare attribute values are assumed to be in.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Convert `value` expressed in `unit` to user units.
    pub fn to_user_units(&self, value: f64, unit: &str) -> Result<f64, ExportError> {
        let factor =
            px_per_unit(unit).ok_or_else(|| ExportError::invalid_option("unit", unit))?;
        Ok(value * factor / self.scale)
    }

    /// Convert a user-unit value to an output unit.
    pub fn from_user_units(&self, value: f64, unit: Unit) -> f64 {
        value * self.scale / unit.px_per_unit()
    }

    /// Parse a length attribute into user units. A bare number is taken to be
    /// in `default_unit`.
    pub fn parse_user_units(&self, text: &str, default_unit: &str) -> Option<f64> {
        let (value, suffix) = parse_length(text)?;
        let unit = if suffix.is_empty() { default_unit } else { suffix };
        self.to_user_units(value, unit).ok()
    }
}

/// Absolute length in CSS pixels, or `None` for percentages and unknown units.
fn length_to_px(text: &str) -> Option<f64> {
    let (value, suffix) = parse_length(text)?;
    px_per_unit(suffix).map(|factor| value * factor)
}
