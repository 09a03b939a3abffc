//! Subtree copy with reference relocation.
//!
//! Copying runs in two phases over a fresh [`RelocationTable`]:
//!
//! 1. **clone** — walk the source subtree in ascending-tag pre-order,
//!    create the matching labels under the destination (the copy root takes
//!    the next free tag, descendants keep their source tags), bind every
//!    source→target label pair, then attach an empty twin for each source
//!    attribute and bind the attribute pair.
//! 2. **relocate** — `paste` each source payload into its twin; relational
//!    kinds rewrite their stored labels against the now-complete table, so a
//!    copied subtree's internal references point at the new copies.
//!
//! References leading *out* of the copied subtree cannot resolve; they keep
//! their prior value and come back as warnings in the [`CopyOutcome`].
//! The same machinery serves same-document and cross-document copies: the
//! source subtree is snapshotted into a portable form first, then grafted.

use std::collections::HashMap;

use log::debug;

use crate::attributes::{backup_copy, Attribute, AttributeId};
use crate::document::Document;
use crate::error::Result;
use crate::guid::Guid;
use crate::label::Label;
use crate::relocation::{RelocationTable, RelocationWarning};

/// Result of a subtree copy.
#[derive(Debug)]
pub struct CopyOutcome {
    /// The root label of the freshly created copy.
    pub root: Label,
    /// Unresolved references left pointing at their source values.
    pub warnings: Vec<RelocationWarning>,
}

/// One source node in portable form: structure plus payload copies.
struct ClonedNode {
    source: Label,
    tag: u32,
    /// Index of the parent within the cloned list; `None` for the subtree
    /// root (its parent lies outside the copied set).
    parent: Option<usize>,
    attributes: Vec<(Guid, Box<dyn Attribute>)>,
}

fn snapshot_subtree(doc: &Document, root: Label) -> Result<Vec<ClonedNode>> {
    let labels = doc.subtree(root)?;
    let mut index_of: HashMap<Label, usize> = HashMap::new();
    let mut cloned = Vec::with_capacity(labels.len());
    for label in labels {
        let parent = doc
            .father(label)?
            .and_then(|parent| index_of.get(&parent).copied());
        let mut attributes = Vec::new();
        for (guid, attr) in &doc.nodes[label.index()].attributes {
            attributes.push((*guid, backup_copy(attr.as_ref())?));
        }
        index_of.insert(label, cloned.len());
        cloned.push(ClonedNode {
            source: label,
            tag: doc.tag(label)?,
            parent,
            attributes,
        });
    }
    Ok(cloned)
}

fn graft(target: &mut Document, cloned: &[ClonedNode], dst_parent: Label) -> Result<CopyOutcome> {
    let mut table = RelocationTable::new();

    // Phase 1: structure and twins, registering every identity pair.
    let mut new_labels: Vec<Label> = Vec::with_capacity(cloned.len());
    for node in cloned {
        let new_label = match node.parent {
            None => target.new_child(dst_parent)?,
            Some(parent_index) => target.child_with_tag(new_labels[parent_index], node.tag)?,
        };
        table.bind_label(node.source, new_label);
        new_labels.push(new_label);
    }
    for (i, node) in cloned.iter().enumerate() {
        for (guid, payload) in &node.attributes {
            target.attach(new_labels[i], payload.new_empty())?;
            table.bind_attribute(
                AttributeId {
                    label: node.source,
                    guid: *guid,
                },
                AttributeId {
                    label: new_labels[i],
                    guid: *guid,
                },
            );
        }
    }

    // Phase 2: paste against the complete table.
    for (i, node) in cloned.iter().enumerate() {
        for (guid, payload) in &node.attributes {
            if let Some(twin) = target.nodes[new_labels[i].index()].attributes.get_mut(guid) {
                payload.paste(twin.as_mut(), &mut table)?;
            }
        }
    }

    let warnings = table.take_warnings();
    debug!(
        "copied {} labels ({} unresolved references)",
        cloned.len(),
        warnings.len()
    );
    Ok(CopyOutcome {
        root: new_labels[0],
        warnings,
    })
}

impl Document {
    /// Copy the subtree rooted at `src` under `dst_parent` in this document.
    ///
    /// The copy root becomes a new child of `dst_parent` with the next free
    /// tag; descendants keep their tags. Requires an open transaction — the
    /// copied attributes are undoable as creations.
    pub fn copy_subtree(&mut self, src: Label, dst_parent: Label) -> Result<CopyOutcome> {
        let cloned = snapshot_subtree(self, src)?;
        graft(self, &cloned, dst_parent)
    }

    /// Copy the subtree rooted at `src` into another document.
    ///
    /// References pointing outside the copied subtree cannot resolve across
    /// documents; they keep their source value and are reported as warnings.
    pub fn copy_to(
        &self,
        src: Label,
        target: &mut Document,
        dst_parent: Label,
    ) -> Result<CopyOutcome> {
        let cloned = snapshot_subtree(self, src)?;
        graft(target, &cloned, dst_parent)
    }
}
