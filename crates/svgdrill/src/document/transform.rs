use kurbo::Affine;
use std::str::FromStr;

/// Parse an SVG `transform` attribute into a single affine matrix.
///
/// Transforms in the list apply right to left, so `translate(10) scale(2)`
/// scales first. An empty attribute is the identity.
pub fn parse_transform(text: &str) -> Result<Affine, svgtypes::Error> {
    if text.trim().is_empty() {
        return Ok(Affine::IDENTITY);
    }
    let t = svgtypes::Transform::from_str(text)?;
    Ok(Affine::new([t.a, t.b, t.c, t.d, t.e, t.f]))
}
