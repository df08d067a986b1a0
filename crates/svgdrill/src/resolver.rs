use crate::document::{DrawingTree, NodeId};
use crate::types::{ResolvedHole, Unit};
use crate::units::DocumentUnits;
use kurbo::Point;

/// Document facts and output choices shared by every circle of a run.
#[derive(Debug, Clone)]
pub struct ResolveContext<'a> {
    pub units: &'a DocumentUnits,
    /// Document height in user units, used by `flip_y`.
    pub height: f64,
    pub unit: Unit,
    pub flip_y: bool,
}

/// Resolve one circle to an absolute, formatted hole.
///
/// The centre goes through the composed transform; the radius does not, so a
/// scaled group leaves its circles' diameters unchanged. Missing or
/// unreadable `cx`, `cy` and `r` count as zero.
pub fn resolve_circle<T: DrawingTree>(
    tree: &T,
    node: NodeId,
    ctx: &ResolveContext<'_>,
) -> ResolvedHole {
    let cx = length_attribute(tree, node, "cx", ctx.units);
    let cy = length_attribute(tree, node, "cy", ctx.units);
    let r = length_attribute(tree, node, "r", ctx.units);

    let mut center = tree.composed_transform(node) * Point::new(cx, cy);
    if ctx.flip_y {
        center.y = ctx.height - center.y;
    }

    let hole = ResolvedHole {
        diameter: ctx.unit.format(ctx.units.from_user_units(r, ctx.unit) * 2.0),
        x: ctx.unit.format(ctx.units.from_user_units(center.x, ctx.unit)),
        y: ctx.unit.format(ctx.units.from_user_units(center.y, ctx.unit)),
        source_id: tree.attribute(node, "id").map(str::to_string),
    };
    tracing::debug!(
        element = node.index(),
        id = ?hole.source_id,
        diameter = %hole.diameter,
        x = %hole.x,
        y = %hole.y,
        "resolved circle"
    );
    hole
}

/// A length attribute in user units. Bare numbers are in the document unit.
fn length_attribute<T: DrawingTree>(
    tree: &T,
    node: NodeId,
    name: &str,
    units: &DocumentUnits,
) -> f64 {
    let Some(text) = tree.attribute(node, name) else {
        return 0.0;
    };
    units
        .parse_user_units(text, units.unit())
        .unwrap_or_else(|| {
            tracing::debug!(element = node.index(), attribute = name, value = text, "unreadable length, using 0");
            0.0
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SvgDocument;

    fn mm_document(body: &str) -> SvgDocument {
        let text = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100mm" height="80mm" viewBox="0 0 100 80">{body}</svg>"#
        );
        SvgDocument::parse(&text).expect("parse")
    }

    fn resolve(doc: &SvgDocument, id: &str, unit: Unit, flip_y: bool) -> ResolvedHole {
        let ctx = ResolveContext {
            units: doc.units(),
            height: doc.height(),
            unit,
            flip_y,
        };
        resolve_circle(doc, doc.find_by_id(id).expect("circle"), &ctx)
    }

    #[test]
    fn test_identity_transform_in_millimetres() {
        let doc = mm_document(r#"<circle id="c" cx="10" cy="20" r="5"/>"#);
        let hole = resolve(&doc, "c", Unit::Millimeters, false);
        assert_eq!((hole.diameter.as_str(), hole.x.as_str(), hole.y.as_str()), ("10.00", "10.00", "20.00"));
        assert_eq!(hole.source_id.as_deref(), Some("c"));
    }

    #[test]
    fn test_identity_transform_in_inches() {
        let doc = mm_document(r#"<circle id="c" cx="10" cy="20" r="5"/>"#);
        let hole = resolve(&doc, "c", Unit::Inches, false);
        assert_eq!(hole.diameter, "0.3937");
        assert_eq!(hole.x, "0.3937");
        assert_eq!(hole.y, "0.7874");
    }

    #[test]
    fn test_flip_applies_after_transform() {
        let doc = mm_document(r#"<g transform="translate(0,30)"><circle id="c" cx="10" cy="20" r="5"/></g>"#);
        let hole = resolve(&doc, "c", Unit::Millimeters, true);
        // 80 - (20 + 30), not (80 - 20) + 30
        assert_eq!(hole.y, "30.00");
        assert_eq!(hole.x, "10.00");
    }

    #[test]
    fn test_transform_moves_center_but_not_radius() {
        let doc = mm_document(r#"<g transform="scale(2)"><circle id="c" cx="10" cy="20" r="5"/></g>"#);
        let hole = resolve(&doc, "c", Unit::Millimeters, false);
        assert_eq!(hole.x, "20.00");
        assert_eq!(hole.y, "40.00");
        assert_eq!(hole.diameter, "10.00");
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let doc = mm_document(r#"<circle id="c" cx="3"/>"#);
        let hole = resolve(&doc, "c", Unit::Millimeters, false);
        assert_eq!(hole.diameter, "0.00");
        assert_eq!(hole.x, "3.00");
        assert_eq!(hole.y, "0.00");
    }

    #[test]
    fn test_explicit_attribute_units_are_honoured() {
        let doc = mm_document(r#"<circle id="c" cx="1in" cy="0" r="0.5cm"/>"#);
        let hole = resolve(&doc, "c", Unit::Millimeters, false);
        assert_eq!(hole.x, "25.40");
        assert_eq!(hole.diameter, "10.00");
    }
}
