//! # Attribute System
//!
//! Attributes are typed data records attached to labels, keyed by a kind
//! [`Guid`]. The system is deliberately open: geometry, data-exchange and
//! visualization collaborators define their own kinds by implementing
//! [`Attribute`], and the document core handles them uniformly — it never
//! needs to know a kind's payload.
//!
//! ## The capability contract
//!
//! Every kind provides:
//!
//! - `id()` — its kind GUID, fixed for the attribute's lifetime
//! - `new_empty()` — a default-constructed twin, used when copying/restoring
//! - `restore(from)` — overwrite this payload from a same-kind snapshot
//! - `paste(into, table)` — populate a twin, rewriting label references
//!   through the [`RelocationTable`]
//! - `relocate(table)` — rewrite stored label references in place; only
//!   relational kinds override the no-op default
//! - `dump(sink)` — human-readable rendering for diagnostics
//!
//! ## Built-in kinds
//!
//! | Kind | Payload | Relational |
//! |------|---------|------------|
//! | [`Name`] | `String` | no |
//! | [`Integer`] | `i64` | no |
//! | [`RealArray`] | `Vec<f64>` | no |
//! | [`Reference`] | `Option<Label>` | yes |
//! | [`NamedPoint`] | `[f64; 3]` | no |
//! | [`Placement`] | marker + companions | no |

use std::any::Any;
use std::fmt;

use crate::error::Result;
use crate::guid::Guid;
use crate::label::Label;
use crate::relocation::RelocationTable;

pub mod kinds;
pub mod placement;

pub use kinds::{Integer, Name, NamedPoint, RealArray, Reference};
pub use placement::{Frame, Placement};

/// Identity of one attribute: the owning label plus the kind GUID.
///
/// The owner back-reference of an attribute is this key, never a stored
/// pointer — labels own attributes, not the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeId {
    pub label: Label,
    pub guid: Guid,
}

/// The polymorphic attribute contract.
///
/// Object-safe so the document can store `Box<dyn Attribute>` without caring
/// about payloads. Concrete kinds additionally implement [`TypedAttribute`]
/// for the statically-typed access paths.
pub trait Attribute: Any + fmt::Debug {
    /// Kind GUID. Constant for the attribute's lifetime.
    fn id(&self) -> Guid;

    /// A default-constructed instance of the same kind.
    fn new_empty(&self) -> Box<dyn Attribute>;

    /// Overwrite this payload from `from`, which must be of the same kind.
    fn restore(&mut self, from: &dyn Attribute) -> Result<()>;

    /// Populate `into` (a same-kind twin) from this instance, rewriting any
    /// label references through `table`.
    fn paste(&self, into: &mut dyn Attribute, table: &mut RelocationTable) -> Result<()>;

    /// Rewrite stored label references through `table`. Kinds without
    /// references keep the no-op default.
    fn relocate(&mut self, table: &mut RelocationTable) {
        let _ = table;
    }

    /// Append a human-readable rendering for diagnostics.
    fn dump(&self, sink: &mut dyn fmt::Write) -> fmt::Result;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Statically-known attribute kinds: a GUID constant, a diagnostic name,
/// and a default payload for find-or-create.
pub trait TypedAttribute: Attribute + Default + Sized {
    const ID: Guid;
    const NAME: &'static str;
}

/// Structural snapshot of an attribute: a same-kind twin holding a copy of
/// the payload. This is what transactions store per touched attribute.
pub(crate) fn backup_copy(attr: &dyn Attribute) -> Result<Box<dyn Attribute>> {
    let mut twin = attr.new_empty();
    twin.restore(attr)?;
    Ok(twin)
}

/// Downcast helper shared by the kind implementations.
pub(crate) fn downcast<T: TypedAttribute>(from: &dyn Attribute) -> Result<&T> {
    from.as_any()
        .downcast_ref::<T>()
        .ok_or(crate::error::TagdocError::KindMismatch { guid: T::ID })
}
