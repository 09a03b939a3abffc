//! End-to-end walk through the placement lifecycle: build, mutate under a
//! transaction, undo, and copy into a second document.

use tagdoc::{Document, Frame, Placement, RealArray, Reference};

#[test]
fn placement_lifecycle() {
    let mut doc = Document::new();

    // Build: two children under the root, tags 1 and 2.
    doc.open_transaction().unwrap();
    let first = doc.new_child(doc.root()).unwrap();
    let second = doc.new_child(doc.root()).unwrap();
    assert_eq!(doc.tag(first).unwrap(), 1);
    assert_eq!(doc.tag(second).unwrap(), 2);

    // Place a frame on the tag-1 label, plus a reference to the label that
    // defines its generated geometry.
    let frame = Frame {
        direction: [0.0, 0.0, 1.0],
        x_direction: [1.0, 0.0, 0.0],
        y_direction: [0.0, 1.0, 0.0],
        origin: [0.0; 3],
    };
    Placement::set_with_frame(&mut doc, first, frame).unwrap();
    let defining = doc.new_child(first).unwrap();
    doc.set_with(first, Reference(Some(defining))).unwrap();
    doc.commit().unwrap();

    // Read back: nine values in the fixed order.
    assert_eq!(
        doc.get::<RealArray>(first).unwrap().values(),
        &[0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
    );

    // Mutate under a transaction, commit, then undo.
    doc.open_transaction().unwrap();
    let mut tilted = frame;
    tilted.direction = [0.0, 1.0, 0.0];
    Placement::set_with_frame(&mut doc, first, tilted).unwrap();
    doc.commit().unwrap();
    assert_eq!(
        Placement::frame(&doc, first).unwrap().direction,
        [0.0, 1.0, 0.0]
    );

    let outcome = doc.undo().unwrap();
    assert!(outcome.applied);
    assert_eq!(
        Placement::frame(&doc, first).unwrap().direction,
        [0.0, 0.0, 1.0]
    );

    // Copy the tag-1 label into a fresh document.
    let mut other = Document::new();
    other.open_transaction().unwrap();
    let dst = other.root();
    let copy = doc.copy_to(first, &mut other, dst).unwrap();
    other.commit().unwrap();
    assert!(copy.warnings.is_empty());

    // The copy carries the pre-copy payload...
    assert_eq!(Placement::frame(&other, copy.root), Placement::frame(&doc, first));

    // ...and its reference points into the new subtree, not back at the
    // source document.
    let copied_defining = other
        .find_child(copy.root, doc.tag(defining).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(
        other.get::<Reference>(copy.root).unwrap().0,
        Some(copied_defining)
    );
    assert_ne!(
        other.get::<Reference>(copy.root).unwrap().0,
        Some(defining)
    );
}
