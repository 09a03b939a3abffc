//! Transaction state and undo/redo history.
//!
//! One manager per document, with the state machine **Idle → Open → Idle**.
//! While a transaction is open, the document records a structural snapshot of
//! each attribute's pre-mutation payload the *first* time it is touched;
//! later touches of the same attribute in the same transaction are free.
//! Commit turns the touched set into one undo step; abort plays it back
//! immediately. Cost is proportional to the attributes actually touched,
//! never to the size of the tree.
//!
//! The manager owns state and history; applying snapshots to live attributes
//! is the document's job (it owns the arena), see
//! [`Document`](crate::Document).

use std::collections::BTreeMap;

use log::debug;

use crate::attributes::{Attribute, AttributeId};
use crate::error::{Result, TagdocError};

/// Pre-touch state of one attribute.
#[derive(Debug)]
pub(crate) enum Snapshot {
    /// The attribute did not exist before the touch; reverting removes it.
    Absent,
    /// The attribute existed with this payload (a same-kind structural copy).
    Present(Box<dyn Attribute>),
}

/// One committed transaction's worth of pre-states, keyed by attribute
/// identity. Applying a step to the document yields its inverse, which is
/// what lands on the opposite stack.
pub(crate) type Step = BTreeMap<AttributeId, Snapshot>;

#[derive(Debug, Default)]
pub(crate) struct TransactionManager {
    open: Option<Step>,
    undo_stack: Vec<Step>,
    redo_stack: Vec<Step>,
}

impl TransactionManager {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TagdocError::NoOpenTransaction)
        }
    }

    pub fn ensure_idle(&self) -> Result<()> {
        if self.is_open() {
            Err(TagdocError::TransactionAlreadyOpen)
        } else {
            Ok(())
        }
    }

    pub fn open(&mut self) -> Result<()> {
        self.ensure_idle()?;
        debug!("transaction opened");
        self.open = Some(Step::new());
        Ok(())
    }

    pub fn is_touched(&self, id: &AttributeId) -> bool {
        self.open
            .as_ref()
            .map(|step| step.contains_key(id))
            .unwrap_or(false)
    }

    /// Record the pre-touch snapshot for `id`. First touch wins: only the
    /// state before the transaction matters for undo.
    pub fn record(&mut self, id: AttributeId, snapshot: Snapshot) -> Result<()> {
        let step = self.open.as_mut().ok_or(TagdocError::NoOpenTransaction)?;
        step.entry(id).or_insert(snapshot);
        Ok(())
    }

    /// Commit: touched pre-states become the newest undo step, redo history
    /// is invalidated, state returns to Idle. An empty transaction leaves no
    /// step behind.
    pub fn commit(&mut self) -> Result<()> {
        let step = self.open.take().ok_or(TagdocError::NoOpenTransaction)?;
        debug!("transaction committed ({} attributes touched)", step.len());
        if !step.is_empty() {
            self.undo_stack.push(step);
            self.redo_stack.clear();
        }
        Ok(())
    }

    /// Hand the open touched set back for immediate rollback; Idle after.
    pub fn take_open(&mut self) -> Result<Step> {
        let step = self.open.take().ok_or(TagdocError::NoOpenTransaction)?;
        debug!("transaction aborted ({} attributes touched)", step.len());
        Ok(step)
    }

    pub fn pop_undo(&mut self) -> Option<Step> {
        self.undo_stack.pop()
    }

    pub fn pop_redo(&mut self) -> Option<Step> {
        self.redo_stack.pop()
    }

    pub fn push_undo(&mut self, step: Step) {
        self.undo_stack.push(step);
    }

    pub fn push_redo(&mut self, step: Step) {
        self.redo_stack.push(step);
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}
