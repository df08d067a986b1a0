mod config;
pub mod csv;
pub mod document;
mod error;
pub mod gcode;
mod grouper;
mod resolver;
mod types;
pub mod units;
pub mod walker;

pub use config::*;
pub use document::marker::MarkerStyle;
pub use document::{DrawingTree, NodeId, SvgDocument};
pub use error::ExportError;
pub use grouper::DiameterGroups;
pub use resolver::{resolve_circle, ResolveContext};
pub use types::*;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Which file format an export run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Gcode,
}

/// Circles found in the configured scope, resolved and grouped by diameter.
///
/// Also returns the matched elements so they can be marked in the drawing.
pub fn collect_holes(
    document: &SvgDocument,
    config: &ExportConfig,
) -> (DiameterGroups, Vec<NodeId>) {
    let roots = walker::scope_roots(document, config);
    let circles = walker::collect_circles(document, &roots);
    let ctx = ResolveContext {
        units: document.units(),
        height: document.height(),
        unit: config.unit,
        flip_y: config.flip_y,
    };

    let groups = circles
        .iter()
        .map(|node| resolve_circle(document, *node, &ctx))
        .collect::<DiameterGroups>();
    tracing::info!(
        circles = circles.len(),
        diameters = groups.len(),
        scope = ?config.scope,
        "collected circles"
    );
    (groups, circles)
}

/// High-level function: drawing → holes → output files.
///
/// Every file is rendered before the first one is written, so a
/// configuration error or an empty scope leaves the filesystem untouched.
pub fn export(
    document: &SvgDocument,
    config: &ExportConfig,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    let (groups, circles) = collect_holes(document, config);
    let files = match format {
        ExportFormat::Csv => csv::render(&groups, config)?,
        ExportFormat::Gcode => gcode::render(&groups, config)?,
    };
    write_outputs(&files)?;

    if let Some(mark_path) = &config.mark_output {
        let marked =
            crate::document::mark_circles(document.source(), &circles, &config.marker)?;
        fs::write(mark_path, marked)
            .with_context(|| format!("write marked drawing {}", mark_path.display()))?;
        tracing::info!(path = %mark_path.display(), "wrote marked drawing");
    }

    Ok(files.into_iter().map(|file| file.path).collect())
}

pub fn export_csv(document: &SvgDocument, config: &ExportConfig) -> Result<Vec<PathBuf>> {
    export(document, config, ExportFormat::Csv)
}

pub fn export_gcode(document: &SvgDocument, config: &ExportConfig) -> Result<Vec<PathBuf>> {
    export(document, config, ExportFormat::Gcode)
}

/// Write rendered files, creating parent directories as needed.
pub fn write_outputs(files: &[OutputFile]) -> Result<()> {
    for file in files {
        if let Some(parent) = file.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output directory {}", parent.display()))?;
        }
        fs::write(&file.path, &file.contents)
            .with_context(|| format!("write {}", file.path.display()))?;
        tracing::info!(path = %file.path.display(), bytes = file.contents.len(), "wrote output");
    }
    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` directives override the level.
pub fn init_logging(debug: bool) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter)
        .try_init()
        .context("install log subscriber")?;
    Ok(())
}
