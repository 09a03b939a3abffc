//! # The Document
//!
//! A [`Document`] is a tree of addressable nodes ("labels"), each optionally
//! carrying typed attributes, with transactional modification on top.
//!
//! ## Ownership model
//!
//! The document owns every node in a single arena; [`Label`] handles are
//! indices into it. Ownership runs strictly downward (parents own children,
//! labels own attributes) while the upward links — a node's parent, an
//! attribute's owner — are non-owning indices, so there is never a strong
//! ownership cycle. Removed nodes become tombstones: the handle stays valid
//! to hold, and every operation on it reports *invalid label*.
//!
//! ## Mutation protocol
//!
//! All mutation requires an open transaction; reads are allowed at any time
//! and observe the in-flight state. The mutation paths are:
//!
//! - [`set`](Document::set) / [`set_with`](Document::set_with) — the
//!   find-or-create singleton protocol: one attribute per (label, GUID),
//!   calling twice returns the identical instance.
//! - [`modify`](Document::modify) — the gate for payload changes; it takes
//!   the first-touch snapshot before handing out `&mut T`.
//! - [`attach`](Document::attach) / [`remove_attribute`](Document::remove_attribute)
//!   — explicit attach of a configured instance (duplicates rejected) and
//!   explicit detach.
//! - [`new_child`](Document::new_child) / [`remove_label`](Document::remove_label)
//!   — tree edits. Removal recursively destroys the subtree and all
//!   attributes in it.
//!
//! ## History
//!
//! `commit` turns the transaction's touched set into one undo step; `undo`
//! and `redo` replay steps, routing restored attributes through a
//! [`RelocationTable`] so their references stay mutually consistent. Both
//! report rather than fail when there is nothing to do.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::attributes::{backup_copy, Attribute, AttributeId, TypedAttribute};
use crate::error::{Result, TagdocError};
use crate::guid::{self, Guid};
use crate::label::Label;
use crate::relocation::{RelocationTable, RelocationWarning};
use crate::transaction::{Snapshot, Step, TransactionManager};

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) tag: u32,
    pub(crate) parent: Option<Label>,
    /// Children keyed by tag; BTreeMap iteration gives the ascending-tag
    /// order that tree comparison and copy traversal rely on.
    pub(crate) children: BTreeMap<u32, Label>,
    /// At most one attribute per kind GUID.
    pub(crate) attributes: BTreeMap<Guid, Box<dyn Attribute>>,
    pub(crate) alive: bool,
}

/// Result of an `undo`/`redo` call.
#[derive(Debug)]
pub struct RestoreOutcome {
    /// False when the corresponding stack was empty (a reported no-op).
    pub applied: bool,
    /// Unresolved-reference and dead-target conditions met while restoring.
    pub warnings: Vec<RelocationWarning>,
}

/// The root label plus the transaction machinery; owns the whole tree.
#[derive(Debug)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) txn: TransactionManager,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding only its root label (entry `"0"`).
    pub fn new() -> Self {
        let root = Node {
            tag: 0,
            parent: None,
            children: BTreeMap::new(),
            attributes: BTreeMap::new(),
            alive: true,
        };
        Document {
            nodes: vec![root],
            txn: TransactionManager::default(),
        }
    }

    pub fn root(&self) -> Label {
        Label(0)
    }

    pub fn is_alive(&self, label: Label) -> bool {
        self.nodes
            .get(label.index())
            .map(|node| node.alive)
            .unwrap_or(false)
    }

    fn node(&self, label: Label) -> Result<&Node> {
        let node = self
            .nodes
            .get(label.index())
            .ok_or_else(|| TagdocError::InvalidLabel(format!("#{} (unknown)", label.0)))?;
        if !node.alive {
            return Err(TagdocError::InvalidLabel(format!(
                "{} (removed)",
                self.entry_lossy(label)
            )));
        }
        Ok(node)
    }

    fn ensure_alive(&self, label: Label) -> Result<()> {
        self.node(label).map(|_| ())
    }

    /// Entry path without a liveness check, for error messages and dumps.
    fn entry_lossy(&self, label: Label) -> String {
        if self.nodes.get(label.index()).is_none() {
            return format!("#{}", label.0);
        }
        let mut tags = Vec::new();
        let mut cursor = Some(label);
        while let Some(current) = cursor {
            let node = &self.nodes[current.index()];
            tags.push(node.tag.to_string());
            cursor = node.parent;
        }
        tags.reverse();
        tags.join(":")
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Colon-separated tag path from the root, e.g. `"0:1:3"`.
    pub fn entry(&self, label: Label) -> Result<String> {
        self.ensure_alive(label)?;
        Ok(self.entry_lossy(label))
    }

    /// The parent label; `None` only for the root.
    pub fn father(&self, label: Label) -> Result<Option<Label>> {
        Ok(self.node(label)?.parent)
    }

    /// Distance from the root; the root itself has depth 0.
    pub fn depth(&self, label: Label) -> Result<usize> {
        self.ensure_alive(label)?;
        let mut depth = 0;
        let mut cursor = self.nodes[label.index()].parent;
        while let Some(current) = cursor {
            depth += 1;
            cursor = self.nodes[current.index()].parent;
        }
        Ok(depth)
    }

    pub fn tag(&self, label: Label) -> Result<u32> {
        Ok(self.node(label)?.tag)
    }

    /// Children in ascending tag order.
    pub fn children(&self, label: Label) -> Result<Vec<Label>> {
        Ok(self.node(label)?.children.values().copied().collect())
    }

    /// Lookup by exact tag. Absence is a normal `None`, not an error.
    pub fn find_child(&self, parent: Label, tag: u32) -> Result<Option<Label>> {
        Ok(self.node(parent)?.children.get(&tag).copied())
    }

    /// The subtree rooted at `root`, pre-order, children ascending by tag.
    pub fn subtree(&self, root: Label) -> Result<Vec<Label>> {
        self.ensure_alive(root)?;
        let mut out = Vec::new();
        self.collect_subtree(root, &mut out);
        Ok(out)
    }

    fn collect_subtree(&self, label: Label, out: &mut Vec<Label>) {
        out.push(label);
        for &child in self.nodes[label.index()].children.values() {
            self.collect_subtree(child, out);
        }
    }

    // ------------------------------------------------------------------
    // Tree edits
    // ------------------------------------------------------------------

    /// Allocate a child with the next unused tag under `parent`.
    pub fn new_child(&mut self, parent: Label) -> Result<Label> {
        self.ensure_alive(parent)?;
        self.txn.ensure_open()?;
        let next_tag = self.nodes[parent.index()]
            .children
            .keys()
            .next_back()
            .map(|tag| tag + 1)
            .unwrap_or(1);
        self.create_child(parent, next_tag)
    }

    /// Find-or-create a child with an explicit tag. Tag 0 is reserved for
    /// the root.
    pub fn child_with_tag(&mut self, parent: Label, tag: u32) -> Result<Label> {
        if tag == 0 {
            return Err(TagdocError::InvalidTag(tag));
        }
        if let Some(existing) = self.find_child(parent, tag)? {
            return Ok(existing);
        }
        self.txn.ensure_open()?;
        self.create_child(parent, tag)
    }

    fn create_child(&mut self, parent: Label, tag: u32) -> Result<Label> {
        let label = Label(self.nodes.len() as u32);
        self.nodes.push(Node {
            tag,
            parent: Some(parent),
            children: BTreeMap::new(),
            attributes: BTreeMap::new(),
            alive: true,
        });
        self.nodes[parent.index()].children.insert(tag, label);
        Ok(label)
    }

    /// Recursively detach and destroy `label`, its descendants, and every
    /// attribute in the subtree. Destroyed payloads are snapshotted so an
    /// open transaction can still abort cleanly.
    pub fn remove_label(&mut self, label: Label) -> Result<()> {
        self.ensure_alive(label)?;
        if label == self.root() {
            return Err(TagdocError::RootRemoval);
        }
        self.txn.ensure_open()?;

        let doomed = self.subtree(label)?;
        for &current in &doomed {
            let guids: Vec<Guid> = self.nodes[current.index()].attributes.keys().copied().collect();
            for guid in guids {
                let id = AttributeId {
                    label: current,
                    guid,
                };
                if self.txn.is_touched(&id) {
                    continue;
                }
                let snapshot = match self.nodes[current.index()].attributes.get(&guid) {
                    Some(attr) => Snapshot::Present(backup_copy(attr.as_ref())?),
                    None => continue,
                };
                self.txn.record(id, snapshot)?;
            }
            let node = &mut self.nodes[current.index()];
            node.attributes.clear();
            node.children.clear();
            node.alive = false;
        }

        if let Some(parent) = self.nodes[label.index()].parent {
            let tag = self.nodes[label.index()].tag;
            self.nodes[parent.index()].children.remove(&tag);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Find-or-create the `T` attribute on `label`.
    ///
    /// The construction protocol for every kind: if the label already holds
    /// an attribute with `T`'s GUID, that instance is returned; otherwise a
    /// default instance is attached. Idempotent — two calls return the
    /// identical instance, not a duplicate.
    pub fn set<T: TypedAttribute>(&mut self, label: Label) -> Result<&T> {
        self.ensure_alive(label)?;
        self.txn.ensure_open()?;
        guid::register_kind(T::ID, T::NAME);

        if !self.nodes[label.index()].attributes.contains_key(&T::ID) {
            let id = AttributeId {
                label,
                guid: T::ID,
            };
            self.txn.record(id, Snapshot::Absent)?;
            self.nodes[label.index()]
                .attributes
                .insert(T::ID, Box::new(T::default()));
        }
        // A miss here means two kinds share one GUID.
        self.get::<T>(label)
            .ok_or(TagdocError::KindMismatch { guid: T::ID })
    }

    /// [`set`](Document::set), then apply `value` to the singleton.
    ///
    /// Repeat calls re-apply to the same instance and never create a second
    /// attribute. Applying counts as a mutation: the pre-application payload
    /// is snapshotted on first touch.
    pub fn set_with<T: TypedAttribute>(&mut self, label: Label, value: T) -> Result<&T> {
        self.ensure_alive(label)?;
        self.txn.ensure_open()?;
        guid::register_kind(T::ID, T::NAME);

        let id = AttributeId {
            label,
            guid: T::ID,
        };
        match self.nodes[label.index()].attributes.get(&T::ID) {
            None => {
                self.txn.record(id, Snapshot::Absent)?;
                self.nodes[label.index()]
                    .attributes
                    .insert(T::ID, Box::new(T::default()));
            }
            Some(attr) => {
                if !self.txn.is_touched(&id) {
                    let snapshot = Snapshot::Present(backup_copy(attr.as_ref())?);
                    self.txn.record(id, snapshot)?;
                }
            }
        }
        if let Some(attr) = self.nodes[label.index()].attributes.get_mut(&T::ID) {
            attr.restore(&value)?;
        }
        self.get::<T>(label)
            .ok_or(TagdocError::KindMismatch { guid: T::ID })
    }

    /// Read access; dead labels and missing attributes are both `None`.
    pub fn get<T: TypedAttribute>(&self, label: Label) -> Option<&T> {
        self.nodes
            .get(label.index())
            .filter(|node| node.alive)
            .and_then(|node| node.attributes.get(&T::ID))
            .and_then(|attr| attr.as_any().downcast_ref::<T>())
    }

    /// Untyped read access by kind GUID.
    pub fn find_attribute(&self, label: Label, guid: Guid) -> Option<&dyn Attribute> {
        self.nodes
            .get(label.index())
            .filter(|node| node.alive)
            .and_then(|node| node.attributes.get(&guid))
            .map(|attr| attr.as_ref())
    }

    pub fn has_attribute(&self, label: Label, guid: Guid) -> bool {
        self.find_attribute(label, guid).is_some()
    }

    /// The payload mutation gate: snapshot on first touch, then run `f` on
    /// the live `&mut T`.
    pub fn modify<T: TypedAttribute, R>(
        &mut self,
        label: Label,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        self.ensure_alive(label)?;
        self.txn.ensure_open()?;

        let id = AttributeId {
            label,
            guid: T::ID,
        };
        let snapshot = match self.nodes[label.index()].attributes.get(&T::ID) {
            None => {
                return Err(TagdocError::AttributeNotFound {
                    guid: T::ID,
                    entry: self.entry_lossy(label),
                })
            }
            Some(attr) => {
                if self.txn.is_touched(&id) {
                    None
                } else {
                    Some(Snapshot::Present(backup_copy(attr.as_ref())?))
                }
            }
        };
        if let Some(snapshot) = snapshot {
            self.txn.record(id, snapshot)?;
        }

        let attr = self.nodes[label.index()]
            .attributes
            .get_mut(&T::ID)
            .and_then(|attr| attr.as_any_mut().downcast_mut::<T>())
            .ok_or(TagdocError::KindMismatch { guid: T::ID })?;
        Ok(f(attr))
    }

    /// Attach an already-configured instance. Unlike [`set`](Document::set),
    /// a second attribute of the same kind is rejected, never overwritten.
    pub fn attach(&mut self, label: Label, attr: Box<dyn Attribute>) -> Result<()> {
        self.ensure_alive(label)?;
        self.txn.ensure_open()?;
        let guid = attr.id();
        if self.nodes[label.index()].attributes.contains_key(&guid) {
            return Err(TagdocError::DuplicateAttribute {
                guid,
                entry: self.entry_lossy(label),
            });
        }
        self.txn.record(AttributeId { label, guid }, Snapshot::Absent)?;
        self.nodes[label.index()].attributes.insert(guid, attr);
        Ok(())
    }

    /// Detach and destroy the attribute of kind `guid` on `label`.
    pub fn remove_attribute(&mut self, label: Label, guid: Guid) -> Result<()> {
        self.ensure_alive(label)?;
        self.txn.ensure_open()?;
        let id = AttributeId { label, guid };
        match self.nodes[label.index()].attributes.remove(&guid) {
            Some(attr) => {
                if !self.txn.is_touched(&id) {
                    // The detached box itself is the pre-removal snapshot.
                    self.txn.record(id, Snapshot::Present(attr))?;
                }
                Ok(())
            }
            None => Err(TagdocError::AttributeNotFound {
                guid,
                entry: self.entry_lossy(label),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Begin capturing modifications. Nested transactions are an error.
    pub fn open_transaction(&mut self) -> Result<()> {
        self.txn.open()
    }

    pub fn transaction_is_open(&self) -> bool {
        self.txn.is_open()
    }

    /// Make the open transaction permanent and undoable. Prior redo history
    /// is invalidated.
    pub fn commit(&mut self) -> Result<()> {
        self.txn.commit()
    }

    /// Discard the open transaction, restoring every touched attribute to
    /// its pre-open payload.
    pub fn abort(&mut self) -> Result<Vec<RelocationWarning>> {
        let step = self.txn.take_open()?;
        let (_inverse, warnings) = self.apply_step(step);
        Ok(warnings)
    }

    /// Revert the most recent committed step. `applied: false` when the undo
    /// stack is empty.
    pub fn undo(&mut self) -> Result<RestoreOutcome> {
        self.txn.ensure_idle()?;
        match self.txn.pop_undo() {
            None => {
                debug!("undo: stack is empty");
                Ok(RestoreOutcome {
                    applied: false,
                    warnings: Vec::new(),
                })
            }
            Some(step) => {
                let (inverse, warnings) = self.apply_step(step);
                self.txn.push_redo(inverse);
                Ok(RestoreOutcome {
                    applied: true,
                    warnings,
                })
            }
        }
    }

    /// Symmetric inverse of [`undo`](Document::undo).
    pub fn redo(&mut self) -> Result<RestoreOutcome> {
        self.txn.ensure_idle()?;
        match self.txn.pop_redo() {
            None => {
                debug!("redo: stack is empty");
                Ok(RestoreOutcome {
                    applied: false,
                    warnings: Vec::new(),
                })
            }
            Some(step) => {
                let (inverse, warnings) = self.apply_step(step);
                self.txn.push_undo(inverse);
                Ok(RestoreOutcome {
                    applied: true,
                    warnings,
                })
            }
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.txn.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.txn.redo_depth()
    }

    /// Apply a step's snapshots to the live attributes and return the
    /// inverse step plus any warnings.
    ///
    /// Restoration routes through a relocation table keyed by label
    /// identity: every live label is bound to itself, restored attributes
    /// get a relocate pass, and references to since-removed labels surface
    /// as warnings while keeping their prior value.
    fn apply_step(&mut self, step: Step) -> (Step, Vec<RelocationWarning>) {
        let mut table = RelocationTable::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if node.alive {
                let live = Label(index as u32);
                table.bind_label(live, live);
            }
        }

        let mut inverse = Step::new();
        let mut restored: Vec<AttributeId> = Vec::new();
        for (id, snapshot) in step {
            if !self.is_alive(id.label) {
                table.push_warning(RelocationWarning::DeadTarget {
                    label: id.label,
                    guid: id.guid,
                });
                continue;
            }
            table.bind_attribute(id, id);
            let node = &mut self.nodes[id.label.index()];
            let displaced = match snapshot {
                Snapshot::Present(payload) => {
                    restored.push(id);
                    node.attributes.insert(id.guid, payload)
                }
                Snapshot::Absent => node.attributes.remove(&id.guid),
            };
            inverse.insert(
                id,
                match displaced {
                    Some(payload) => Snapshot::Present(payload),
                    None => Snapshot::Absent,
                },
            );
        }

        for id in restored {
            if let Some(attr) = self.nodes[id.label.index()].attributes.get_mut(&id.guid) {
                attr.relocate(&mut table);
            }
        }
        (inverse, table.take_warnings())
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Render `label`'s entry and attributes through each kind's `dump`.
    pub fn dump(&self, label: Label, sink: &mut dyn fmt::Write) -> Result<()> {
        let entry = self.entry(label)?;
        writeln!(sink, "label {entry}")?;
        for (kind_guid, attr) in &self.node(label)?.attributes {
            let name = guid::kind_name(*kind_guid).unwrap_or("<unregistered>");
            write!(sink, "  [{name}] ")?;
            attr.dump(sink)?;
            writeln!(sink)?;
        }
        Ok(())
    }

    pub fn dump_string(&self, label: Label) -> Result<String> {
        let mut out = String::new();
        self.dump(label, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Integer, Name};

    fn open(doc: &mut Document) {
        doc.open_transaction().unwrap();
    }

    #[test]
    fn set_twice_returns_the_identical_instance() {
        let mut doc = Document::new();
        open(&mut doc);
        let child = doc.new_child(doc.root()).unwrap();

        let first = doc.set::<Name>(child).unwrap() as *const Name;
        let second = doc.set::<Name>(child).unwrap() as *const Name;
        assert_eq!(first, second, "set must be a find-or-create singleton");
    }

    #[test]
    fn set_with_reapplies_to_the_singleton() {
        let mut doc = Document::new();
        open(&mut doc);
        let child = doc.new_child(doc.root()).unwrap();

        doc.set_with(child, Integer(1)).unwrap();
        let first = doc.get::<Integer>(child).unwrap() as *const Integer;
        doc.set_with(child, Integer(2)).unwrap();
        let second = doc.get::<Integer>(child).unwrap() as *const Integer;

        assert_eq!(first, second);
        assert_eq!(doc.get::<Integer>(child).unwrap().0, 2);
    }

    #[test]
    fn attach_rejects_duplicate_kind() {
        let mut doc = Document::new();
        open(&mut doc);
        let child = doc.new_child(doc.root()).unwrap();
        doc.set_with(child, Name("first".into())).unwrap();

        let err = doc
            .attach(child, Box::new(Name("second".into())))
            .unwrap_err();
        assert!(matches!(err, TagdocError::DuplicateAttribute { .. }));
        assert_eq!(doc.get::<Name>(child).unwrap().0, "first");
    }

    #[test]
    fn mutation_outside_transaction_is_rejected() {
        let mut doc = Document::new();
        let root = doc.root();
        assert!(matches!(
            doc.new_child(root),
            Err(TagdocError::NoOpenTransaction)
        ));
        assert!(matches!(
            doc.set::<Name>(root),
            Err(TagdocError::NoOpenTransaction)
        ));
    }

    #[test]
    fn modify_requires_an_existing_attribute() {
        let mut doc = Document::new();
        open(&mut doc);
        let child = doc.new_child(doc.root()).unwrap();
        let err = doc.modify::<Integer, _>(child, |i| i.0 += 1).unwrap_err();
        assert!(matches!(err, TagdocError::AttributeNotFound { .. }));
    }

    #[test]
    fn entries_and_depths() {
        let mut doc = Document::new();
        open(&mut doc);
        let a = doc.new_child(doc.root()).unwrap();
        let b = doc.child_with_tag(a, 3).unwrap();

        assert_eq!(doc.entry(doc.root()).unwrap(), "0");
        assert_eq!(doc.entry(a).unwrap(), "0:1");
        assert_eq!(doc.entry(b).unwrap(), "0:1:3");
        assert_eq!(doc.depth(doc.root()).unwrap(), 0);
        assert_eq!(doc.depth(b).unwrap(), 2);
        assert_eq!(doc.father(b).unwrap(), Some(a));
        assert_eq!(doc.father(doc.root()).unwrap(), None);
    }

    #[test]
    fn dump_renders_entry_and_attributes() {
        let mut doc = Document::new();
        open(&mut doc);
        let child = doc.new_child(doc.root()).unwrap();
        doc.set_with(child, Name("anchor".into())).unwrap();

        let out = doc.dump_string(child).unwrap();
        assert!(out.starts_with("label 0:1\n"));
        assert!(out.contains("[Name] Name \"anchor\""));
    }
}
