//! Built-in attribute kinds.
//!
//! Payloads are public tuple fields so collaborators can construct configured
//! instances for [`Document::set_with`](crate::Document::set_with). Reads go
//! through [`Document::get`](crate::Document::get); payload mutation goes
//! through [`Document::modify`](crate::Document::modify) so the transaction
//! manager sees every change.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::uuid;

use crate::attributes::{downcast, Attribute, TypedAttribute};
use crate::error::Result;
use crate::guid::Guid;
use crate::label::Label;
use crate::relocation::RelocationTable;

/// Free-form diagnostic name for a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

impl Attribute for Name {
    fn id(&self) -> Guid {
        Self::ID
    }

    fn new_empty(&self) -> Box<dyn Attribute> {
        Box::new(Name::default())
    }

    fn restore(&mut self, from: &dyn Attribute) -> Result<()> {
        self.0 = downcast::<Name>(from)?.0.clone();
        Ok(())
    }

    fn paste(&self, into: &mut dyn Attribute, _table: &mut RelocationTable) -> Result<()> {
        into.restore(self)
    }

    fn dump(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        write!(sink, "Name \"{}\"", self.0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedAttribute for Name {
    const ID: Guid = Guid::from_uuid(uuid!("2a96b608-ec8b-11d0-bee7-080009dc3333"));
    const NAME: &'static str = "Name";
}

/// A single signed integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integer(pub i64);

impl Attribute for Integer {
    fn id(&self) -> Guid {
        Self::ID
    }

    fn new_empty(&self) -> Box<dyn Attribute> {
        Box::new(Integer::default())
    }

    fn restore(&mut self, from: &dyn Attribute) -> Result<()> {
        self.0 = downcast::<Integer>(from)?.0;
        Ok(())
    }

    fn paste(&self, into: &mut dyn Attribute, _table: &mut RelocationTable) -> Result<()> {
        into.restore(self)
    }

    fn dump(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        write!(sink, "Integer {}", self.0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedAttribute for Integer {
    const ID: Guid = Guid::from_uuid(uuid!("2a96b60a-ec8b-11d0-bee7-080009dc3333"));
    const NAME: &'static str = "Integer";
}

/// A flat array of reals. The placement companion stores nine of them:
/// direction(1..3), x-direction(1..3), y-direction(1..3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealArray(pub Vec<f64>);

impl RealArray {
    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

impl Attribute for RealArray {
    fn id(&self) -> Guid {
        Self::ID
    }

    fn new_empty(&self) -> Box<dyn Attribute> {
        Box::new(RealArray::default())
    }

    fn restore(&mut self, from: &dyn Attribute) -> Result<()> {
        self.0 = downcast::<RealArray>(from)?.0.clone();
        Ok(())
    }

    fn paste(&self, into: &mut dyn Attribute, _table: &mut RelocationTable) -> Result<()> {
        into.restore(self)
    }

    fn dump(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        write!(sink, "RealArray [{}]", self.0.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedAttribute for RealArray {
    const ID: Guid = Guid::from_uuid(uuid!("2a96b60e-ec8b-11d0-bee7-080009dc3333"));
    const NAME: &'static str = "RealArray";
}

/// The relational kind: a reference to another label.
///
/// `paste` rewrites the stored label through the relocation table, so a
/// copied subtree's internal references point at the new copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference(pub Option<Label>);

impl Attribute for Reference {
    fn id(&self) -> Guid {
        Self::ID
    }

    fn new_empty(&self) -> Box<dyn Attribute> {
        Box::new(Reference::default())
    }

    fn restore(&mut self, from: &dyn Attribute) -> Result<()> {
        self.0 = downcast::<Reference>(from)?.0;
        Ok(())
    }

    fn paste(&self, into: &mut dyn Attribute, table: &mut RelocationTable) -> Result<()> {
        into.restore(self)?;
        into.relocate(table);
        Ok(())
    }

    fn relocate(&mut self, table: &mut RelocationTable) {
        if let Some(target) = self.0 {
            self.0 = Some(table.resolve_label_or_keep(target));
        }
    }

    fn dump(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        match self.0 {
            Some(target) => write!(sink, "Reference -> #{}", target.0),
            None => write!(sink, "Reference -> (unset)"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedAttribute for Reference {
    const ID: Guid = Guid::from_uuid(uuid!("2a96b616-ec8b-11d0-bee7-080009dc3333"));
    const NAME: &'static str = "Reference";
}

/// Generated-geometry companion: a point, e.g. a placement frame's origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint(pub [f64; 3]);

impl NamedPoint {
    pub fn point(&self) -> [f64; 3] {
        self.0
    }
}

impl Attribute for NamedPoint {
    fn id(&self) -> Guid {
        Self::ID
    }

    fn new_empty(&self) -> Box<dyn Attribute> {
        Box::new(NamedPoint::default())
    }

    fn restore(&mut self, from: &dyn Attribute) -> Result<()> {
        self.0 = downcast::<NamedPoint>(from)?.0;
        Ok(())
    }

    fn paste(&self, into: &mut dyn Attribute, _table: &mut RelocationTable) -> Result<()> {
        into.restore(self)
    }

    fn dump(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            sink,
            "NamedPoint ({}, {}, {})",
            self.0[0], self.0[1], self.0[2]
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedAttribute for NamedPoint {
    const ID: Guid = Guid::from_uuid(uuid!("c4ef4200-568f-11d1-8940-080009dc3333"));
    const NAME: &'static str = "NamedPoint";
}
