use std::collections::HashMap;

use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::geometry::resolve_geometry;
use crate::rewrite::build_label_node;

/// Attribute draw.io stamps on every shape. It survives conversion as the
/// text element's id so external references keep working.
pub const CELL_ID_ATTR: &str = "data-cell-id";
/// Prefix of synthetic ids assigned when no ancestor carries a cell id.
pub const FALLBACK_ID_PREFIX: &str = "element_";

const FOREIGN_OBJECT: &str = "foreignObject";

/// One successfully converted label.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedLabel {
    pub id: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Non-fatal findings. These are always reported but never block the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No ancestor carried a cell id; external references keyed to the
    /// original shape will not resolve against the synthetic id.
    FallbackId { text: String, id: String },
    /// An anchor coordinate came out exactly zero, usually a label box with
    /// neither margin nor padding in its styles.
    ZeroAnchor { text: String, x: f32, y: f32 },
    /// The container has no parent in the tree and was left untouched.
    Orphaned { text: String },
}

/// A single container that could not be converted. The rest of the batch is
/// unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerError {
    pub text: String,
    pub message: String,
}

/// Outcome of one conversion pass over a document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionResult {
    pub labels: Vec<ConvertedLabel>,
    pub removed_empty: usize,
    pub warnings: Vec<Warning>,
    pub errors: Vec<ContainerError>,
}

impl ConversionResult {
    pub fn converted(&self) -> usize {
        self.labels.len()
    }
}

/// Walks from `start` upward (inclusive) to the nearest element carrying a
/// cell id. The walk strictly decreases depth, so the root terminates it.
fn find_cell_id(
    doc: &Document,
    parents: &HashMap<NodeId, NodeId>,
    start: NodeId,
) -> Option<String> {
    let mut current = Some(start);
    while let Some(id) = current {
        if let Some(cell_id) = doc.get(id).attr(CELL_ID_ATTR) {
            return Some(cell_id.to_string());
        }
        current = parents.get(&id).copied();
    }
    None
}

/// Replaces every foreignObject label in the document with a native text
/// element, in place. Containers with no visible text are removed instead.
/// A failure on one container is recorded and skipped; it never aborts the
/// pass.
pub fn convert_document(doc: &mut Document) -> ConversionResult {
    let mut result = ConversionResult::default();
    let mut parents = doc.parent_index();

    // Snapshot before mutating so replacements made during the pass cannot
    // re-trigger processing.
    let containers: Vec<NodeId> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|&id| doc.get(id).local_name() == FOREIGN_OBJECT)
        .collect();

    for container in containers {
        let text = doc.text_content(container).trim().to_string();

        if text.is_empty() {
            if let Some(&parent) = parents.get(&container) {
                doc.remove_child(parent, container);
                result.removed_empty += 1;
            }
            continue;
        }

        let id = match find_cell_id(doc, &parents, container) {
            Some(id) => id,
            None => {
                let id = format!("{}{}", FALLBACK_ID_PREFIX, result.labels.len());
                result.warnings.push(Warning::FallbackId {
                    text: text.clone(),
                    id: id.clone(),
                });
                id
            }
        };

        let style = resolve_geometry(doc, container);
        if style.x == 0.0 || style.y == 0.0 {
            result.warnings.push(Warning::ZeroAnchor {
                text: text.clone(),
                x: style.x,
                y: style.y,
            });
        }

        let Some(&parent) = parents.get(&container) else {
            result.warnings.push(Warning::Orphaned { text });
            continue;
        };

        let replacement = build_label_node(doc, &id, &style, &text);
        match doc.replace_child(parent, container, replacement) {
            Ok(()) => {
                // Keep the index consistent for later containers.
                parents.insert(replacement, parent);
                result.labels.push(ConvertedLabel {
                    id,
                    text,
                    x: style.x,
                    y: style.y,
                });
            }
            Err(message) => result.errors.push(ContainerError { text, message }),
        }
    }

    result
}
