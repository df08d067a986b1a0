use crate::config::{ExportConfig, GcodeParams};
use crate::error::ExportError;
use crate::grouper::DiameterGroups;
use crate::types::{
    per_diameter_path, DrillCycle, DrillOperation, GCode, OutputFile, ResolvedHole, Unit,
};

/// Extension used for per-diameter programs when the output name has none.
pub const DEFAULT_PROGRAM_EXTENSION: &str = ".ngc";

/// Everything one tool-setup block needs.
#[derive(Debug, Clone)]
pub struct DrillStart<'a> {
    pub tool: u32,
    pub rpm: u32,
    pub z_clear: f64,
    pub z_start: f64,
    pub z_feed: f64,
    pub operation: &'a DrillOperation,
    /// The hole the spindle travels to before plunging.
    pub first_hole: &'a ResolvedHole,
}

/// Program preamble: plane, distance mode, blending, units, work offset.
pub fn header(unit: Unit) -> String {
    format!(
        "
G17 G90  (XY Plane, Absolute Distance Mode)
G64 P0.0050 Q0.0000 (Path Blending)
{} (Units: G20=inches, G21=mm)
G54 (Set Work Offset)

G30 (Go to preset G30 location)

",
        unit.g_code()
    )
}

/// Tool change, spindle and coolant start, then the canned cycle definition.
/// The coordinate lines that follow are drilled by the cycle.
pub fn drill_start(block: &DrillStart<'_>) -> String {
    let op = block.operation;
    let peck = op
        .peck
        .map(|q| format!(" Q{}", fmt4(q)))
        .unwrap_or_default();
    format!(
        "
(--- Tool Setup ---)
G30 Z{z_clear} (Go in Z only to preset G30 location)
G30 (Go to preset G30 location)
T{tool} M6  (Change Tool)
G43 H{tool} Z{z_clear}  (apply tool length offset and move up)

S{rpm} M3 (Set Spindle RPM, Spindle ON, fwd)
M8 (Flood Coolant ON)

(--- Drill Setup ---)
G90 G98              (Absolute distance, return to initial plane)

G0 {first}        (Go to first hole before plunging)
G0 Z{z_start}        (Go to and establish drill start position, height)

(--- Start {name} Cycle ---)
{cycle} Z{z_end} R{z_clear}{peck} F{z_feed}  (define and begin drill)

",
        z_clear = fmt4(block.z_clear),
        tool = block.tool,
        rpm = block.rpm,
        first = block.first_hole.coordinate_words(),
        z_start = fmt4(block.z_start),
        name = op.name,
        cycle = op.cycle.g_code(),
        z_end = fmt4(op.z_end),
        z_feed = fmt4(block.z_feed),
    )
}

/// Cancel the cycle, stop coolant and spindle, retract.
pub fn drill_end(z_clear: f64) -> String {
    format!(
        "
(--- End Drill Cycle ---)
G80 (Cancel Canned Drill Cycle)
M9 (All Coolant Off)
M5 (Spindle OFF)

G0 Z{} (Move to Clearance Height)
",
        fmt4(z_clear)
    )
}

pub fn footer() -> String {
    "\nM30 (End of Program)\n".to_string()
}

fn fmt4(value: f64) -> String {
    format!("{value:.4}")
}

/// Check the Z heights before anything is written.
pub fn validate(params: &GcodeParams) -> Result<(), ExportError> {
    if params.z_clear <= params.z_start {
        return Err(ExportError::ClearanceNotAboveStart {
            z_clear: params.z_clear,
            z_start: params.z_start,
        });
    }
    if params.z_start <= params.z_end {
        return Err(ExportError::EndNotBelowStart {
            z_start: params.z_start,
            z_end: params.z_end,
        });
    }
    Ok(())
}

/// The drilling steps of a run: an optional spot pass, then the main pass.
pub fn operations(params: &GcodeParams) -> Vec<DrillOperation> {
    let main = if params.peck != 0.0 {
        DrillOperation {
            name: "Peck".to_string(),
            spot: false,
            peck: Some(params.peck),
            cycle: DrillCycle::Peck,
            z_end: params.z_end,
            tool: None,
        }
    } else {
        DrillOperation {
            name: "Drill".to_string(),
            spot: false,
            peck: None,
            cycle: DrillCycle::Straight,
            z_end: params.z_end,
            tool: None,
        }
    };

    let mut ops = Vec::with_capacity(2);
    if let Some(spot_tool) = spot_tool(params) {
        ops.push(DrillOperation {
            name: "Spot".to_string(),
            spot: true,
            peck: None,
            cycle: DrillCycle::Straight,
            z_end: params.spot_z_end,
            tool: Some(spot_tool),
        });
    }
    ops.push(main);
    ops
}

/// Spot drilling needs both a tool and a depth.
fn spot_tool(params: &GcodeParams) -> Option<u32> {
    (params.spot_tool != 0 && params.spot_z_end != 0.0).then_some(params.spot_tool)
}

/// Main tool for the `index`-th diameter.
fn main_tool(params: &GcodeParams, index: usize) -> u32 {
    if params.increment_tools {
        params.tool + index as u32
    } else {
        params.tool
    }
}

/// Render the drill program(s) without touching the filesystem.
pub fn render(
    groups: &DiameterGroups,
    config: &ExportConfig,
) -> Result<Vec<OutputFile>, ExportError> {
    let params = &config.gcode;
    validate(params)?;
    if groups.is_empty() {
        return Err(ExportError::NoCircles);
    }

    let ops = operations(params);
    tracing::debug!(
        operations = ops.len(),
        diameters = groups.len(),
        separate = config.separate_files,
        "rendering drill program"
    );

    if config.separate_files {
        Ok(render_separate(groups, config, &ops))
    } else {
        Ok(vec![render_combined(groups, config, &ops)])
    }
}

/// One self-contained program per diameter.
fn render_separate(
    groups: &DiameterGroups,
    config: &ExportConfig,
    ops: &[DrillOperation],
) -> Vec<OutputFile> {
    let params = &config.gcode;
    let unit = config.unit;
    let base = config.output.with_extension("");

    groups
        .iter()
        .enumerate()
        .map(|(index, (diameter, holes))| {
            let tool = main_tool(params, index);
            let mut gcode = GCode::new();
            gcode.push(format!(
                "(--- {} - {diameter}{unit} - Tool # {tool} ---)",
                base.display()
            ));
            if let Some(spot) = spot_tool(params) {
                gcode.push(format!("(Tool {spot}  - Center/Spot drill)"));
            }
            gcode.push_block(&header(unit));

            for op in ops {
                let op_tool = op.tool.unwrap_or(tool);
                if op.spot {
                    gcode.push(format!("(Tool {op_tool}  - Spot Drill)"));
                } else {
                    gcode.push(format!("(Tool {op_tool}  - {diameter}{unit})"));
                }
                gcode.push_block(&drill_start(&DrillStart {
                    tool: op_tool,
                    rpm: params.rpm,
                    z_clear: params.z_clear,
                    z_start: params.z_start,
                    z_feed: params.z_feed,
                    operation: op,
                    first_hole: &holes[0],
                }));
                push_holes(&mut gcode, holes);
                gcode.push_block(&drill_end(params.z_clear));
            }
            gcode.push_block(&footer());

            OutputFile {
                path: per_diameter_path(&config.output, diameter, unit, DEFAULT_PROGRAM_EXTENSION),
                contents: gcode.to_text(),
            }
        })
        .collect()
}

/// All diameters in one program, operations outer and diameters inner, so the
/// spot pass visits every hole before any hole is drilled.
fn render_combined(
    groups: &DiameterGroups,
    config: &ExportConfig,
    ops: &[DrillOperation],
) -> OutputFile {
    let params = &config.gcode;
    let unit = config.unit;

    let mut gcode = GCode::new();
    gcode.push(format!("(--- {} - All Drills ---)", config.output.display()));
    if let Some(spot) = spot_tool(params) {
        gcode.push(format!("(--- Tool {spot}  - Center/Spot drill ---)"));
    }
    for (index, diameter) in groups.diameters().enumerate() {
        gcode.push(format!(
            "(--- Tool {}  - {diameter}{unit} ---)",
            main_tool(params, index)
        ));
    }
    gcode.push_block(&header(unit));

    for op in ops {
        // The spot tool is set up once and then visits every diameter.
        let mut spot_started = false;
        for (index, (diameter, holes)) in groups.iter().enumerate() {
            let tool = op.tool.unwrap_or_else(|| main_tool(params, index));
            let needs_setup = !op.spot || !spot_started;
            if needs_setup {
                if op.spot {
                    gcode.push(format!("(Tool {tool}  - Spot Drill)"));
                    spot_started = true;
                } else {
                    gcode.push(format!("(Tool {tool}  - {diameter}{unit})"));
                }
                gcode.push_block(&drill_start(&DrillStart {
                    tool,
                    rpm: params.rpm,
                    z_clear: params.z_clear,
                    z_start: params.z_start,
                    z_feed: params.z_feed,
                    operation: op,
                    first_hole: &holes[0],
                }));
            }
            push_holes(&mut gcode, holes);
            if !op.spot {
                gcode.push_block(&drill_end(params.z_clear));
            }
        }
        if op.spot {
            gcode.push_block(&drill_end(params.z_clear));
        }
    }
    gcode.push_block(&footer());

    OutputFile {
        path: config.output.clone(),
        contents: gcode.to_text(),
    }
}

fn push_holes(gcode: &mut GCode, holes: &[ResolvedHole]) {
    for hole in holes {
        gcode.push(hole.coordinate_words());
    }
}
