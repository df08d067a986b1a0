use crate::config::ExportConfig;
use crate::document::{DrawingTree, NodeId, SvgDocument};
use crate::types::Scope;

/// Elements the circle search starts from for the configured scope.
///
/// `Layer` with no resolvable layer and `Selection` with nothing selected both
/// produce no roots; the caller then reports that no circles were found.
pub fn scope_roots(document: &SvgDocument, config: &ExportConfig) -> Vec<NodeId> {
    match config.scope {
        Scope::Document => vec![document.root()],
        Scope::Layer => {
            let layer = match &config.layer {
                Some(key) => document.find_layer(key),
                None => document.current_layer(),
            };
            if layer.is_none() {
                tracing::warn!(layer = ?config.layer, "no active layer");
            }
            layer.into_iter().collect()
        }
        Scope::Selection => config
            .selection
            .iter()
            .filter_map(|id| {
                let node = document.find_by_id(id);
                if node.is_none() {
                    tracing::warn!(id = %id, "selected element not found");
                }
                node
            })
            .collect(),
    }
}

/// Collect every circle reachable from `roots`, depth-first and pre-order.
///
/// Each root is walked on its own, so a circle under two selected elements is
/// reported twice, once per root.
pub fn collect_circles<T: DrawingTree>(tree: &T, roots: &[NodeId]) -> Vec<NodeId> {
    let mut circles = Vec::new();
    let mut stack = Vec::new();

    for &root in roots {
        stack.push(root);
        while let Some(node) = stack.pop() {
            if tree.is_circle(node) {
                circles.push(node);
            }
            stack.extend(tree.children(node).iter().rev().copied());
        }
    }

    circles
}
