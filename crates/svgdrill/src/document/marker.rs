//! Writes a copy of a drawing with the exported circles recoloured, so the
//! selection can be checked visually before machining.

use super::NodeId;
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_MARK_COLOR: &str = "#ff0000";
pub const DEFAULT_MARK_STROKE_WIDTH: f64 = 1.0;

/// Stroke applied to every matched circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: String,
    pub stroke_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_MARK_COLOR.to_string(),
            stroke_width: DEFAULT_MARK_STROKE_WIDTH,
        }
    }
}

/// Re-emit `source` with the stroke of each element in `circles` replaced.
///
/// Elements are matched by document-order index, the same numbering
/// `SvgDocument` assigns, so `source` must be the text the ids came from.
pub fn mark_circles(source: &str, circles: &[NodeId], style: &MarkerStyle) -> Result<String> {
    let targets: HashSet<usize> = circles.iter().map(NodeId::index).collect();
    let mut reader = Reader::from_str(source);
    let mut writer = Writer::new(Vec::new());
    let mut ordinal = 0usize;

    loop {
        let event = reader.read_event().context("read SVG while marking circles")?;
        let event = match event {
            Event::Eof => break,
            Event::Start(start) => {
                let marked = restyle_if_target(&start, ordinal, &targets, style)?;
                ordinal += 1;
                Event::Start(marked.unwrap_or(start))
            }
            Event::Empty(start) => {
                let marked = restyle_if_target(&start, ordinal, &targets, style)?;
                ordinal += 1;
                Event::Empty(marked.unwrap_or(start))
            }
            other => other,
        };
        writer
            .write_event(event)
            .context("write marked SVG")?;
    }

    String::from_utf8(writer.into_inner()).context("marked SVG is not UTF-8")
}

fn restyle_if_target(
    start: &BytesStart<'_>,
    ordinal: usize,
    targets: &HashSet<usize>,
    style: &MarkerStyle,
) -> Result<Option<BytesStart<'static>>> {
    if !targets.contains(&ordinal) {
        return Ok(None);
    }

    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut marked = BytesStart::new(name);
    let mut existing_style = String::new();
    for attr in start.attributes() {
        let attr = attr.context("read circle attribute")?;
        if attr.key.as_ref() == b"style" {
            existing_style = attr.unescape_value()?.into_owned();
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        marked.push_attribute((key.as_str(), value.as_str()));
    }

    let restyled = merge_stroke(&existing_style, style);
    marked.push_attribute(("style", restyled.as_str()));
    Ok(Some(marked))
}

/// Replace `stroke` and `stroke-width` in an inline style, keeping the rest.
fn merge_stroke(existing: &str, style: &MarkerStyle) -> String {
    let mut declarations: Vec<&str> = existing
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let property = decl.split(':').next().unwrap_or_default().trim();
            property != "stroke" && property != "stroke-width"
        })
        .collect();
    let stroke = format!("stroke:{}", style.color);
    let width = format!("stroke-width:{}", style.stroke_width);
    declarations.push(&stroke);
    declarations.push(&width);
    declarations.join(";")
}
