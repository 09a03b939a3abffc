//! Placement attributes.
//!
//! A placement marks a label as carrying a coordinate frame. The marker
//! itself has no payload; the frame data lives in companions on the same
//! label, in the fixed external layout:
//!
//! - a [`RealArray`] of nine reals — direction(1..3), x-direction(1..3),
//!   y-direction(1..3)
//! - a [`NamedPoint`] holding the generated point at the frame's origin

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::uuid;

use crate::attributes::{downcast, Attribute, TypedAttribute};
use crate::attributes::kinds::{NamedPoint, RealArray};
use crate::document::Document;
use crate::error::Result;
use crate::guid::Guid;
use crate::label::Label;
use crate::relocation::RelocationTable;

/// A right-handed coordinate frame: three direction vectors and an origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub direction: [f64; 3],
    pub x_direction: [f64; 3],
    pub y_direction: [f64; 3],
    pub origin: [f64; 3],
}

impl Default for Frame {
    /// The standard frame: Z up, X and Y the world axes, origin at zero.
    fn default() -> Self {
        Frame {
            direction: [0.0, 0.0, 1.0],
            x_direction: [1.0, 0.0, 0.0],
            y_direction: [0.0, 1.0, 0.0],
            origin: [0.0; 3],
        }
    }
}

/// Marker kind: "this label carries a placement".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement;

impl Attribute for Placement {
    fn id(&self) -> Guid {
        Self::ID
    }

    fn new_empty(&self) -> Box<dyn Attribute> {
        Box::new(Placement)
    }

    fn restore(&mut self, from: &dyn Attribute) -> Result<()> {
        downcast::<Placement>(from)?;
        Ok(())
    }

    fn paste(&self, into: &mut dyn Attribute, _table: &mut RelocationTable) -> Result<()> {
        into.restore(self)
    }

    fn dump(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        write!(sink, "Placement")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedAttribute for Placement {
    const ID: Guid = Guid::from_uuid(uuid!("2a96b60b-ec8b-11d0-bee7-080009dc3333"));
    const NAME: &'static str = "Placement";
}

impl Placement {
    /// Attach the bare marker (find-or-create).
    pub fn set(doc: &mut Document, label: Label) -> Result<()> {
        doc.set::<Placement>(label)?;
        Ok(())
    }

    /// Attach the marker and write `frame` into the companions: the nine
    /// reals in their fixed order, and the generated origin point.
    /// Re-applies to the existing companions on repeat calls.
    pub fn set_with_frame(doc: &mut Document, label: Label, frame: Frame) -> Result<()> {
        doc.set::<Placement>(label)?;
        let mut values = Vec::with_capacity(9);
        values.extend_from_slice(&frame.direction);
        values.extend_from_slice(&frame.x_direction);
        values.extend_from_slice(&frame.y_direction);
        doc.set_with(label, RealArray(values))?;
        doc.set_with(label, NamedPoint(frame.origin))?;
        Ok(())
    }

    /// Read the frame back from the companions. `None` if the label has no
    /// placement or the companion array is malformed.
    pub fn frame(doc: &Document, label: Label) -> Option<Frame> {
        doc.get::<Placement>(label)?;
        let array = doc.get::<RealArray>(label)?;
        let v = array.values();
        if v.len() != 9 {
            return None;
        }
        let origin = doc
            .get::<NamedPoint>(label)
            .map(|point| point.point())
            .unwrap_or([0.0; 3]);
        Some(Frame {
            direction: [v[0], v[1], v[2]],
            x_direction: [v[3], v[4], v[5]],
            y_direction: [v[6], v[7], v[8]],
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, Label) {
        let mut doc = Document::new();
        doc.open_transaction().unwrap();
        let label = doc.new_child(doc.root()).unwrap();
        (doc, label)
    }

    #[test]
    fn companion_array_has_the_fixed_layout() {
        let (mut doc, label) = setup();
        let frame = Frame {
            direction: [0.0, 0.0, 1.0],
            x_direction: [1.0, 0.0, 0.0],
            y_direction: [0.0, 1.0, 0.0],
            origin: [2.0, 3.0, 4.0],
        };
        Placement::set_with_frame(&mut doc, label, frame).unwrap();

        let values = doc.get::<RealArray>(label).unwrap().values().to_vec();
        assert_eq!(
            values,
            vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(doc.get::<NamedPoint>(label).unwrap().point(), [2.0, 3.0, 4.0]);
    }

    #[test]
    fn frame_round_trips_through_the_companions() {
        let (mut doc, label) = setup();
        let frame = Frame {
            direction: [0.0, 1.0, 0.0],
            x_direction: [0.0, 0.0, 1.0],
            y_direction: [1.0, 0.0, 0.0],
            origin: [-1.0, 0.5, 9.0],
        };
        Placement::set_with_frame(&mut doc, label, frame).unwrap();
        assert_eq!(Placement::frame(&doc, label), Some(frame));
    }

    #[test]
    fn bare_marker_has_no_frame() {
        let (mut doc, label) = setup();
        Placement::set(&mut doc, label).unwrap();
        assert_eq!(Placement::frame(&doc, label), None);
    }

    #[test]
    fn repeat_set_reuses_the_companions() {
        let (mut doc, label) = setup();
        Placement::set_with_frame(&mut doc, label, Frame::default()).unwrap();
        let first = doc.get::<RealArray>(label).unwrap() as *const RealArray;

        let mut tilted = Frame::default();
        tilted.direction = [0.0, 1.0, 0.0];
        Placement::set_with_frame(&mut doc, label, tilted).unwrap();
        let second = doc.get::<RealArray>(label).unwrap() as *const RealArray;

        assert_eq!(first, second);
        assert_eq!(Placement::frame(&doc, label).unwrap().direction, [0.0, 1.0, 0.0]);
    }
}
