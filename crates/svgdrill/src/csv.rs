use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::grouper::DiameterGroups;
use crate::types::{per_diameter_path, OutputFile};

const ROW_END: &str = "\r\n";

/// Render the coordinate list(s) without touching the filesystem.
///
/// Combined output is one `Diameter,X,Y` table; separate output is one `X,Y`
/// table per diameter, the diameter moving into the file name.
pub fn render(
    groups: &DiameterGroups,
    config: &ExportConfig,
) -> Result<Vec<OutputFile>, ExportError> {
    if groups.is_empty() {
        return Err(ExportError::NoCircles);
    }

    if config.separate_files {
        let files = groups
            .iter()
            .map(|(diameter, holes)| {
                let mut contents = row(&["X", "Y"]);
                for hole in holes {
                    contents.push_str(&row(&[hole.x.as_str(), hole.y.as_str()]));
                }
                OutputFile {
                    path: per_diameter_path(&config.output, diameter, config.unit, ".csv"),
                    contents,
                }
            })
            .collect();
        return Ok(files);
    }

    let mut contents = row(&["Diameter", "X", "Y"]);
    for (diameter, holes) in groups.iter() {
        for hole in holes {
            contents.push_str(&row(&[diameter, hole.x.as_str(), hole.y.as_str()]));
        }
    }
    Ok(vec![OutputFile {
        path: config.output.clone(),
        contents,
    }])
}

fn row(fields: &[&str]) -> String {
    let mut line = fields.join(",");
    line.push_str(ROW_END);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResolvedHole, Unit};
    use std::path::PathBuf;

    fn hole(diameter: &str, x: &str, y: &str) -> ResolvedHole {
        ResolvedHole {
            diameter: diameter.into(),
            x: x.into(),
            y: y.into(),
            source_id: None,
        }
    }

    fn sample() -> DiameterGroups {
        vec![
            hole("10.00", "10.00", "20.00"),
            hole("3.00", "1.00", "1.00"),
            hole("10.00", "30.00", "40.00"),
        ]
        .into_iter()
        .collect()
    }

    fn config(separate: bool) -> ExportConfig {
        ExportConfig {
            output: PathBuf::from("holes.csv"),
            unit: Unit::Millimeters,
            separate_files: separate,
            ..ExportConfig::default()
        }
    }

    #[test]
    fn test_combined_lists_every_hole_under_one_header() {
        let files = render(&sample(), &config(false)).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, PathBuf::from("holes.csv"));
        let lines: Vec<&str> = files[0].contents.lines().collect();
        assert_eq!(
            lines,
            vec!["Diameter,X,Y", "10.00,10.00,20.00", "10.00,30.00,40.00", "3.00,1.00,1.00"]
        );
        assert!(files[0].contents.ends_with("\r\n"));
    }

    #[test]
    fn test_separate_writes_one_file_per_diameter() {
        let files = render(&sample(), &config(true)).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, PathBuf::from("holes_10.00mm.csv"));
        assert_eq!(files[0].contents, "X,Y\r\n10.00,20.00\r\n30.00,40.00\r\n");
        assert_eq!(files[1].path, PathBuf::from("holes_3.00mm.csv"));
        assert_eq!(files[1].contents.lines().count(), 2);
    }

    #[test]
    fn test_no_circles_renders_nothing() {
        assert_eq!(
            render(&DiameterGroups::new(), &config(false)),
            Err(ExportError::NoCircles)
        );
    }
}
