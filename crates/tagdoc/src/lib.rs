//! # tagdoc
//!
//! A hierarchical, attribute-based document model: a tree of addressable
//! nodes ([`Label`]s), each optionally carrying typed, uniquely-identified
//! data records ([`Attribute`]s), with transactional modification
//! (undo/redo) and a relocation mechanism that keeps cross-references valid
//! when subtrees are copied or restored. Database-like guarantees —
//! identity, uniqueness, consistent references, atomic rollback — over an
//! in-memory mutable graph, without a database engine underneath.
//!
//! ## Data flow
//!
//! Client code asks a label for "the attribute of kind `T`, create if
//! absent" ([`Document::set`]); the document returns the singleton instance
//! per (label, GUID). Mutation through [`Document::modify`] triggers
//! transaction snapshotting; a later copy or undo/redo pass uses a
//! [`RelocationTable`] to rewrite any label references the attributes hold.
//!
//! ## Quick example
//!
//! ```
//! use tagdoc::{Document, Frame, Placement};
//!
//! let mut doc = Document::new();
//! doc.open_transaction()?;
//! let part = doc.new_child(doc.root())?;
//! Placement::set_with_frame(&mut doc, part, Frame::default())?;
//! doc.commit()?;
//!
//! doc.open_transaction()?;
//! let mut tilted = Frame::default();
//! tilted.direction = [0.0, 1.0, 0.0];
//! Placement::set_with_frame(&mut doc, part, tilted)?;
//! doc.commit()?;
//!
//! doc.undo()?;
//! assert_eq!(Placement::frame(&doc, part).unwrap().direction, [0.0, 0.0, 1.0]);
//! # Ok::<(), tagdoc::TagdocError>(())
//! ```
//!
//! ## Concurrency
//!
//! Single-threaded, synchronous API: one logical actor per document at a
//! time. Callers needing concurrent access serialize externally — one
//! document per worker, or a lock around transaction boundaries.

pub mod attributes;
pub mod copy;
pub mod document;
pub mod error;
pub mod guid;
pub mod label;
pub mod relocation;
mod transaction;

pub use attributes::{
    Attribute, AttributeId, Frame, Integer, Name, NamedPoint, Placement, RealArray, Reference,
    TypedAttribute,
};
pub use copy::CopyOutcome;
pub use document::{Document, RestoreOutcome};
pub use error::{Result, TagdocError};
pub use guid::Guid;
pub use label::Label;
pub use relocation::{RelocationTable, RelocationWarning};
