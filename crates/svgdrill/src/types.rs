use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Linear unit of the exported coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "mm")]
    Millimeters,
}

impl Unit {
    /// Suffix used in file names and unit conversion.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Inches => "in",
            Unit::Millimeters => "mm",
        }
    }

    /// Decimal places used when rendering a value in this unit.
    pub fn decimals(&self) -> usize {
        match self {
            Unit::Inches => 4,
            Unit::Millimeters => 2,
        }
    }

    /// CSS pixels per one unit.
    pub fn px_per_unit(&self) -> f64 {
        match self {
            Unit::Inches => 96.0,
            Unit::Millimeters => 96.0 / 25.4,
        }
    }

    /// G-code units word.
    pub fn g_code(&self) -> &'static str {
        match self {
            Unit::Inches => "G20",
            Unit::Millimeters => "G21",
        }
    }

    /// Render a value with this unit's display precision.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals(), value)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in" => Ok(Unit::Inches),
            "mm" => Ok(Unit::Millimeters),
            other => Err(ExportError::invalid_option("unit", other)),
        }
    }
}

/// Part of the drawing searched for circles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Document,
    Layer,
    Selection,
}

impl FromStr for Scope {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "document" => Ok(Scope::Document),
            "layer" => Ok(Scope::Layer),
            "selection" => Ok(Scope::Selection),
            other => Err(ExportError::invalid_option("scope", other)),
        }
    }
}

/// A circle resolved to absolute coordinates in the output unit.
///
/// All three values are already rendered with the unit's precision; the
/// diameter string doubles as the grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHole {
    pub diameter: String,
    pub x: String,
    pub y: String,
    /// `id` attribute of the source element, when it has one.
    pub source_id: Option<String>,
}

impl ResolvedHole {
    /// Coordinate word pair as used in drill programs, e.g. `X1.0000 Y2.0000`.
    pub fn coordinate_words(&self) -> String {
        format!("X{} Y{}", self.x, self.y)
    }
}

/// Canned drilling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrillCycle {
    /// G81, single continuous plunge.
    Straight,
    /// G83, pecking to clear chips.
    Peck,
}

impl DrillCycle {
    pub fn g_code(&self) -> &'static str {
        match self {
            DrillCycle::Straight => "G81",
            DrillCycle::Peck => "G83",
        }
    }
}

/// One drilling step applied to every diameter of a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillOperation {
    /// Name shown in the cycle comment: "Spot", "Drill" or "Peck".
    pub name: String,
    pub spot: bool,
    /// Peck increment; `None` drills in one plunge.
    pub peck: Option<f64>,
    pub cycle: DrillCycle,
    pub z_end: f64,
    /// Fixed tool for spot passes. Main operations take their tool from the
    /// running tool counter instead.
    pub tool: Option<u32>,
}

/// A drill program as a list of lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GCode {
    /// Commands and comments, without line endings.
    pub lines: Vec<String>,
}

impl GCode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append a multi-line block one line at a time.
    pub fn push_block(&mut self, block: &str) {
        self.lines.extend(block.lines().map(str::to_string));
    }

    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// A rendered file that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Path for one diameter's file: `<base>_<diameter><unit><ext>`.
///
/// `default_ext` (with its dot) is used when `base` has no extension.
pub fn per_diameter_path(base: &Path, diameter: &str, unit: Unit, default_ext: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| default_ext.to_string());
    base.with_file_name(format!("{stem}_{diameter}{unit}{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_precision_follows_unit() {
        assert_eq!(Unit::Millimeters.format(10.0), "10.00");
        assert_eq!(Unit::Inches.format(0.19685 * 2.0), "0.3937");
    }

    #[test]
    fn test_unit_and_scope_parse_option_strings() {
        assert_eq!("mm".parse::<Unit>().unwrap(), Unit::Millimeters);
        assert_eq!("in".parse::<Unit>().unwrap(), Unit::Inches);
        assert!("cm".parse::<Unit>().is_err());
        assert_eq!("layer".parse::<Scope>().unwrap(), Scope::Layer);
        assert!(matches!(
            "page".parse::<Scope>(),
            Err(ExportError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_unit_serializes_as_short_name() {
        let json = serde_json::to_string(&Unit::Millimeters).expect("serialize");
        assert_eq!(json, "\"mm\"");
    }

    #[test]
    fn test_per_diameter_paths_insert_suffix_before_extension() {
        assert_eq!(
            per_diameter_path(Path::new("out/holes.csv"), "10.00", Unit::Millimeters, ".csv"),
            PathBuf::from("out/holes_10.00mm.csv")
        );
        assert_eq!(
            per_diameter_path(Path::new("holes"), "0.1250", Unit::Inches, ".csv"),
            PathBuf::from("holes_0.1250in.csv")
        );
    }

    #[test]
    fn test_gcode_blocks_split_into_lines() {
        let mut gcode = GCode::new();
        gcode.push("G90");
        gcode.push_block("\nM8\nM3\n");
        assert_eq!(gcode.lines, vec!["G90", "", "M8", "M3"]);
        assert_eq!(gcode.to_text(), "G90\n\nM8\nM3\n");
    }
}
