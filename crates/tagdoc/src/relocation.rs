//! Relocation tables.
//!
//! A [`RelocationTable`] maps label and attribute identities from a source
//! context to a target context. One table is built fresh for each subtree
//! copy and for each undo/redo restoration pass, then discarded: phase one
//! registers every source→target pair, phase two lets each attribute rewrite
//! its stored references against the now-complete table.
//!
//! An unresolved reference is never a crash: the attribute keeps its prior
//! (possibly stale) value, the table records a [`RelocationWarning`], and the
//! copy/restore caller receives the warnings in its outcome.

use std::collections::HashMap;
use std::fmt;

use log::warn;

use crate::attributes::AttributeId;
use crate::guid::Guid;
use crate::label::Label;

/// Warning-level condition raised during a relocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationWarning {
    /// A relational attribute referenced `source`, which has no binding in
    /// this pass. The reference was left as it was.
    UnresolvedReference { source: Label },

    /// A restoration step targeted an attribute whose owning label has been
    /// removed since the step was recorded. The step entry was skipped.
    DeadTarget { label: Label, guid: Guid },
}

impl fmt::Display for RelocationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocationWarning::UnresolvedReference { source } => {
                write!(f, "unresolved reference to label #{}", source.0)
            }
            RelocationWarning::DeadTarget { label, guid } => {
                write!(f, "restore target label #{} ({guid}) is removed", label.0)
            }
        }
    }
}

/// Source→target identity mapping for one copy or restoration pass.
#[derive(Debug, Default)]
pub struct RelocationTable {
    labels: HashMap<Label, Label>,
    attributes: HashMap<AttributeId, AttributeId>,
    warnings: Vec<RelocationWarning>,
}

impl RelocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a label binding. Re-binding the same source overwrites: during
    /// a multi-pass copy a label's own copy is registered before its
    /// attributes' copies, and the last write wins.
    pub fn bind_label(&mut self, source: Label, target: Label) {
        self.labels.insert(source, target);
    }

    pub fn bind_attribute(&mut self, source: AttributeId, target: AttributeId) {
        self.attributes.insert(source, target);
    }

    /// Absence means "not part of this relocation", a normal result.
    pub fn resolve_label(&self, source: Label) -> Option<Label> {
        self.labels.get(&source).copied()
    }

    pub fn resolve_attribute(&self, source: AttributeId) -> Option<AttributeId> {
        self.attributes.get(&source).copied()
    }

    /// Resolve `source`, or keep it unchanged and record a warning.
    ///
    /// This is the rewrite primitive for relational kinds: a reference that
    /// cannot be resolved stays in its prior state rather than dangling
    /// silently or crashing.
    pub fn resolve_label_or_keep(&mut self, source: Label) -> Label {
        match self.labels.get(&source) {
            Some(target) => *target,
            None => {
                warn!("relocation: unresolved reference to label #{}", source.0);
                self.warnings
                    .push(RelocationWarning::UnresolvedReference { source });
                source
            }
        }
    }

    pub(crate) fn push_warning(&mut self, warning: RelocationWarning) {
        warn!("relocation: {warning}");
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Drain the accumulated warnings; the table is discarded after.
    pub fn take_warnings(&mut self) -> Vec<RelocationWarning> {
        std::mem::take(&mut self.warnings)
    }
}
