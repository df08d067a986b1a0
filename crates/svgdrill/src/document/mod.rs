use crate::error::ExportError;
use crate::units::DocumentUnits;
use anyhow::{Context, Result};
use kurbo::Affine;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub mod marker;
pub mod transform;

pub use marker::mark_circles;
pub use transform::parse_transform;

/// Index of an element in an [`SvgDocument`]. Indices follow document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Read-only access to a drawing's element tree.
///
/// The walker and resolver only ever see a drawing through this trait.
pub trait DrawingTree {
    /// The outermost element.
    fn root(&self) -> NodeId;

    /// Child elements in document order.
    fn children(&self, node: NodeId) -> &[NodeId];

    /// True only for `<circle>` primitives.
    fn is_circle(&self, node: NodeId) -> bool;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Composition of the `transform` attributes of `node` and all its
    /// ancestors, outermost first.
    fn composed_transform(&self, node: NodeId) -> Affine;
}

/// One element of a parsed drawing.
#[derive(Debug, Clone)]
pub struct SvgNode {
    /// Local element name without namespace prefix, e.g. `circle`.
    pub name: String,
    /// Attributes keyed by their qualified name, e.g. `inkscape:label`.
    pub attributes: Vec<(String, String)>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SvgNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An SVG drawing held in memory as an element arena.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    nodes: Vec<SvgNode>,
    units: DocumentUnits,
    height: f64,
    source: String,
}

impl SvgDocument {
    /// Read and parse an SVG file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read SVG {}", path.display()))?;
        let document = Self::parse(&text)
            .with_context(|| format!("Failed to parse SVG {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            elements = document.nodes.len(),
            unit = document.units.unit(),
            "loaded drawing"
        );
        Ok(document)
    }

    /// Parse SVG source text.
    pub fn parse(text: &str) -> Result<Self, ExportError> {
        let nodes = parse_nodes(text)?;
        let root = nodes
            .first()
            .ok_or_else(|| ExportError::Document("document has no elements".to_string()))?;
        if root.name != "svg" {
            return Err(ExportError::Document(format!(
                "root element is <{}>, expected <svg>",
                root.name
            )));
        }

        let viewbox = root.attribute("viewBox").and_then(parse_viewbox);
        let units = DocumentUnits::from_root(root.attribute("width"), viewbox);
        let height = root
            .attribute("height")
            .and_then(|h| units.parse_user_units(h, "px"))
            .or_else(|| viewbox.map(|vb| vb[3]))
            .unwrap_or(0.0);

        Ok(Self {
            nodes,
            units,
            height,
            source: text.to_string(),
        })
    }

    pub fn units(&self) -> &DocumentUnits {
        &self.units
    }

    /// Document height in user units.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The text the document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self, id: NodeId) -> &SvgNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First element carrying `id="..."`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.attribute("id") == Some(id))
            .map(NodeId)
    }

    /// True for `<g inkscape:groupmode="layer">`.
    pub fn is_layer(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.name == "g" && node.attribute("inkscape:groupmode") == Some("layer")
    }

    /// Look a layer up by id, falling back to its `inkscape:label`.
    pub fn find_layer(&self, key: &str) -> Option<NodeId> {
        self.layers()
            .find(|id| self.node(*id).attribute("id") == Some(key))
            .or_else(|| {
                self.layers()
                    .find(|id| self.node(*id).attribute("inkscape:label") == Some(key))
            })
    }

    fn layers(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(move |id| self.is_layer(*id))
    }

    /// The group Inkscape last had active, from `sodipodi:namedview`.
    ///
    /// This is a layer, or a plain group the user had entered.
    pub fn current_layer(&self) -> Option<NodeId> {
        let current = self
            .nodes
            .iter()
            .find(|node| node.name == "namedview")
            .and_then(|node| node.attribute("inkscape:current-layer"))?;
        self.find_by_id(current)
            .filter(|id| self.node(*id).name == "g")
    }
}

impl DrawingTree for SvgDocument {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    fn is_circle(&self, node: NodeId) -> bool {
        self.node(node).name == "circle"
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attribute(name)
    }

    fn composed_transform(&self, node: NodeId) -> Affine {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            chain.push(id);
            current = self.node(id).parent;
        }

        chain
            .into_iter()
            .rev()
            .fold(Affine::IDENTITY, |acc, id| {
                let Some(text) = self.node(id).attribute("transform") else {
                    return acc;
                };
                match parse_transform(text) {
                    Ok(t) => acc * t,
                    Err(err) => {
                        tracing::warn!(element = id.index(), %err, "ignoring transform");
                        acc
                    }
                }
            })
    }
}

fn parse_nodes(text: &str) -> Result<Vec<SvgNode>, ExportError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut nodes: Vec<SvgNode> = Vec::new();
    let mut open: Vec<NodeId> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|err| {
            ExportError::Document(format!(
                "error at position {}: {err}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(start) => {
                let id = push_node(&mut nodes, &open, &start)?;
                open.push(id);
            }
            Event::Empty(start) => {
                push_node(&mut nodes, &open, &start)?;
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(nodes)
}

fn push_node(
    nodes: &mut Vec<SvgNode>,
    open: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId, ExportError> {
    let parent = open.last().copied();
    if parent.is_none() && !nodes.is_empty() {
        return Err(ExportError::Document(
            "more than one root element".to_string(),
        ));
    }

    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| ExportError::Document(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ExportError::Document(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    let id = NodeId(nodes.len());
    nodes.push(SvgNode {
        name,
        attributes,
        parent,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent.0].children.push(id);
    }
    Ok(id)
}

fn parse_viewbox(text: &str) -> Option<[f64; 4]> {
    let vb = svgtypes::ViewBox::from_str(text).ok()?;
    Some([vb.x, vb.y, vb.w, vb.h])
}
