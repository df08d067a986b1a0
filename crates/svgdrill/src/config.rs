use crate::document::marker::MarkerStyle;
use crate::error::ExportError;
use crate::types::{Scope, Unit};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parameters of the generated drill cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeParams {
    /// Tool number of the main drilling operation (first diameter).
    pub tool: u32,
    /// Give each successive diameter the next tool number.
    pub increment_tools: bool,
    pub rpm: u32,
    pub z_feed: f64,
    /// Clearance (fast traverse) height.
    pub z_clear: f64,
    /// Height the drill cycle starts from.
    pub z_start: f64,
    /// Final drill depth, usually negative.
    pub z_end: f64,
    /// Peck increment; zero drills each hole in one plunge.
    pub peck: f64,
    /// Spot drill tool; zero disables spot drilling.
    pub spot_tool: u32,
    /// Spot drill depth; zero disables spot drilling.
    pub spot_z_end: f64,
}

impl Default for GcodeParams {
    fn default() -> Self {
        Self {
            tool: 1,
            increment_tools: false,
            rpm: 1,
            z_feed: 1.0,
            z_clear: 1.0,
            z_start: 1.0,
            z_end: 1.0,
            peck: 0.0,
            spot_tool: 0,
            spot_z_end: 0.0,
        }
    }
}

/// Everything one export run needs to know, fixed before the drawing is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output file, or the template name when writing one file per diameter.
    pub output: PathBuf,
    pub unit: Unit,
    /// Measure Y from the bottom edge of the page instead of the top.
    pub flip_y: bool,
    pub scope: Scope,
    /// Write one file per diameter.
    pub separate_files: bool,
    /// Element ids making up the selection for [`Scope::Selection`].
    pub selection: Vec<String>,
    /// Layer id or label overriding the document's active layer.
    pub layer: Option<String>,
    /// Where to write a copy of the drawing with matched circles recoloured.
    pub mark_output: Option<PathBuf>,
    pub marker: MarkerStyle,
    /// Log every resolved circle.
    pub debug: bool,
    pub gcode: GcodeParams,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::new(),
            unit: Unit::Inches,
            flip_y: false,
            scope: Scope::Document,
            separate_files: false,
            selection: Vec::new(),
            layer: None,
            mark_output: None,
            marker: MarkerStyle::default(),
            debug: false,
            gcode: GcodeParams::default(),
        }
    }
}

impl ExportConfig {
    /// Load a configuration from the provided path. Missing files yield the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        let config: ExportConfig =
            serde_json::from_slice(&data).with_context(|| format!("deserialize config {}", path.display()))?;
        Ok(config)
    }

    /// Persist the configuration to the provided path, ensuring the directory exists.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config directory {}", parent.display()))?;
        }

        let data = serde_json::to_vec_pretty(self).context("serialize config to JSON bytes")?;
        fs::write(path, data).with_context(|| format!("write config {}", path.display()))
    }

    /// Resolve the default config path (`~/.svgdrill/config.json`).
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
        Ok(home.join(".svgdrill").join("config.json"))
    }

    /// Build the run configuration from command-line options.
    ///
    /// Defaults, then the config file, then the options themselves. The file
    /// is the one named by `--config`, which must exist, or else `fallback`
    /// when that file is present.
    pub fn from_options(options: &[(String, String)], fallback: Option<&Path>) -> Result<Self> {
        let explicit = options
            .iter()
            .rev()
            .find(|(key, _)| key == "config")
            .map(|(_, value)| PathBuf::from(value));

        let mut config = match (explicit, fallback) {
            (Some(path), _) => {
                if !path.exists() {
                    bail!("config file {} not found", path.display());
                }
                Self::load_from_path(&path)?
            }
            (None, Some(path)) => Self::load_from_path(path)?,
            (None, None) => Self::default(),
        };

        for (key, value) in options.iter().filter(|(key, _)| key != "config") {
            config.apply_option(key, value)?;
        }
        Ok(config)
    }

    /// Apply one `--key=value` option as passed on the command line.
    ///
    /// Option names follow the drawing-extension convention, so boolean
    /// options are on only for the literal value `true`.
    pub fn apply_option(&mut self, key: &str, value: &str) -> Result<(), ExportError> {
        match key {
            "output" | "csvfile" | "filename" => self.output = PathBuf::from(value),
            "unit" => self.unit = value.parse()?,
            "flipy" => self.flip_y = is_true(value),
            "scope" => self.scope = value.parse()?,
            "separatedrills" => self.separate_files = is_true(value),
            "id" => self.selection.push(value.to_string()),
            "layer" => self.layer = Some(value.to_string()),
            "mark" => self.mark_output = Some(PathBuf::from(value)),
            "markcolor" => self.marker.color = value.to_string(),
            "markwidth" => self.marker.stroke_width = parse_number(key, value)?,
            "debug" => self.debug = is_true(value),
            "incrementtools" => self.gcode.increment_tools = is_true(value),
            "toolno" => self.gcode.tool = parse_number(key, value)?,
            "rpm" => self.gcode.rpm = parse_number(key, value)?,
            "zfeed" => self.gcode.z_feed = parse_number(key, value)?,
            "zclear" => self.gcode.z_clear = parse_number(key, value)?,
            "zstart" => self.gcode.z_start = parse_number(key, value)?,
            "zend" => self.gcode.z_end = parse_number(key, value)?,
            "peck" => self.gcode.peck = parse_number(key, value)?,
            "spottoolno" => self.gcode.spot_tool = parse_number(key, value)?,
            "spotzend" => self.gcode.spot_z_end = parse_number(key, value)?,
            _ => return Err(ExportError::invalid_option(key, value)),
        }
        Ok(())
    }
}

/// Split `--key=value` arguments into pairs. A bare `--flag` means `true`.
pub fn split_options<S: AsRef<str>>(args: &[S]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            let Some(option) = arg.strip_prefix("--") else {
                bail!("unexpected argument '{arg}'");
            };
            Ok(match option.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (option.to_string(), "true".to_string()),
            })
        })
        .collect()
}

fn is_true(value: &str) -> bool {
    value == "true"
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ExportError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExportError::invalid_option(key, value))
}
