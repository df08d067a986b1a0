use std::fs;
use std::path::{Path, PathBuf};
use svgdrill::*;

fn fixture(name: &str) -> SvgDocument {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name);
    SvgDocument::load(&path).expect("Failed to load fixture")
}

fn shop_params() -> GcodeParams {
    GcodeParams {
        tool: 3,
        rpm: 1200,
        z_feed: 5.0,
        z_clear: 0.5,
        z_start: 0.1,
        z_end: -0.25,
        ..GcodeParams::default()
    }
}

fn gcode_config(output: PathBuf) -> ExportConfig {
    ExportConfig {
        output,
        unit: Unit::Inches,
        gcode: shop_params(),
        ..ExportConfig::default()
    }
}

#[test]
fn test_combined_program_drills_each_diameter() {
    let dir = tempfile::tempdir().unwrap();
    let config = gcode_config(dir.path().join("drills.ngc"));

    let written = export_gcode(&fixture("mm_holes.svg"), &config).expect("export");
    assert_eq!(written, vec![dir.path().join("drills.ngc")]);

    let program = fs::read_to_string(&written[0]).unwrap();
    let lines: Vec<&str> = program.lines().collect();
    assert!(lines[0].ends_with("drills.ngc - All Drills ---)"));
    assert_eq!(lines[1], "(--- Tool 3  - 0.3937in ---)");
    assert_eq!(lines[2], "(--- Tool 3  - 0.1181in ---)");
    assert!(lines.contains(&"G20 (Units: G20=inches, G21=mm)"));
    assert_eq!(lines.iter().filter(|l| l.starts_with("T3 M6")).count(), 2);
    assert_eq!(
        lines
            .iter()
            .filter(|l| l.starts_with("G81 Z-0.2500 R0.5000 F5.0000"))
            .count(),
        2
    );
    assert!(lines.contains(&"S1200 M3 (Set Spindle RPM, Spindle ON, fwd)"));
    assert!(lines.contains(&"X1.5748 Y0.7874"));
    assert_eq!(lines.last(), Some(&"M30 (End of Program)"));
}

#[test]
fn test_combined_program_spots_before_drilling() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = gcode_config(dir.path().join("drills.ngc"));
    config.gcode.spot_tool = 9;
    config.gcode.spot_z_end = -0.05;
    config.gcode.increment_tools = true;

    let written = export_gcode(&fixture("mm_holes.svg"), &config).expect("export");
    let program = fs::read_to_string(&written[0]).unwrap();

    assert!(program.contains("(--- Tool 9  - Center/Spot drill ---)"));
    assert!(program.contains("(--- Tool 4  - 0.1181in ---)"));

    let spot = program.find("T9 M6").expect("spot tool change");
    let first_drill = program.find("T3 M6").expect("first drill");
    let second_drill = program.find("T4 M6").expect("second drill");
    assert!(spot < first_drill && first_drill < second_drill);
    assert_eq!(program.matches("T9 M6").count(), 1);
    assert!(program.contains("G81 Z-0.0500 R0.5000 F5.0000"));
}

#[test]
fn test_separate_programs_with_pecking() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = gcode_config(dir.path().join("drills"));
    config.separate_files = true;
    config.gcode.increment_tools = true;
    config.gcode.peck = 0.05;

    let written = export_gcode(&fixture("mm_holes.svg"), &config).expect("export");
    assert_eq!(
        written,
        vec![
            dir.path().join("drills_0.3937in.ngc"),
            dir.path().join("drills_0.1181in.ngc"),
        ]
    );

    let first = fs::read_to_string(&written[0]).unwrap();
    assert!(first.contains("T3 M6"));
    assert!(first.contains("G83 Z-0.2500 R0.5000 Q0.0500 F5.0000"));
    assert!(first.contains("(--- Start Peck Cycle ---)"));
    assert_eq!(first.lines().filter(|l| l.starts_with('X')).count(), 3);

    let second = fs::read_to_string(&written[1]).unwrap();
    assert!(second.contains("T4 M6"));
    assert!(!second.contains("T3 M6"));
    assert!(second.contains("X1.9685 Y1.9685"));
}

#[test]
fn test_invalid_heights_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = gcode_config(dir.path().join("drills.ngc"));
    config.gcode.z_end = 0.2;

    let err = export_gcode(&fixture("mm_holes.svg"), &config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExportError>(),
        Some(ExportError::EndNotBelowStart { .. })
    ));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_height_check_runs_before_circle_search() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = gcode_config(dir.path().join("drills.ngc"));
    config.gcode.z_clear = 0.0;

    let err = export_gcode(&fixture("no_circles.svg"), &config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExportError>(),
        Some(ExportError::ClearanceNotAboveStart { .. })
    ));
}

#[test]
fn test_default_heights_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        output: dir.path().join("drills.ngc"),
        ..ExportConfig::default()
    };
    assert!(export_gcode(&fixture("mm_holes.svg"), &config).is_err());
}
