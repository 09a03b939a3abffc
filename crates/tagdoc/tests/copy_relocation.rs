use tagdoc::{Document, Label, Name, Reference, RelocationWarning, TagdocError};

/// Document with a committed subtree: `src` holding a child, a `Name`, and
/// a `Reference` to that child.
fn setup() -> (Document, Label, Label) {
    let mut doc = Document::new();
    doc.open_transaction().unwrap();
    let src = doc.new_child(doc.root()).unwrap();
    let inner = doc.new_child(src).unwrap();
    doc.set_with(src, Name("assembly".into())).unwrap();
    doc.set_with(src, Reference(Some(inner))).unwrap();
    doc.set_with(inner, Name("part".into())).unwrap();
    doc.commit().unwrap();
    (doc, src, inner)
}

#[test]
fn same_document_copy_rewrites_internal_references() {
    let (mut doc, src, inner) = setup();

    doc.open_transaction().unwrap();
    let outcome = doc.copy_subtree(src, doc.root()).unwrap();
    doc.commit().unwrap();

    assert!(outcome.warnings.is_empty());
    let copied_inner = doc
        .find_child(outcome.root, doc.tag(inner).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(
        doc.get::<Reference>(outcome.root).unwrap().0,
        Some(copied_inner),
        "the copy must reference the copied child, not the original"
    );
    // Originals are untouched.
    assert_eq!(doc.get::<Reference>(src).unwrap().0, Some(inner));
}

#[test]
fn cross_document_copy_carries_payloads_and_references() {
    let (doc, src, inner) = setup();

    let mut other = Document::new();
    other.open_transaction().unwrap();
    let dst = other.root();
    let outcome = doc.copy_to(src, &mut other, dst).unwrap();
    other.commit().unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(other.get::<Name>(outcome.root).unwrap().0, "assembly");

    let copied_inner = other
        .find_child(outcome.root, doc.tag(inner).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(other.get::<Name>(copied_inner).unwrap().0, "part");
    assert_eq!(
        other.get::<Reference>(outcome.root).unwrap().0,
        Some(copied_inner)
    );
}

#[test]
fn cross_document_copy_warns_on_external_references() {
    let mut doc = Document::new();
    doc.open_transaction().unwrap();
    let outside = doc.new_child(doc.root()).unwrap();
    let src = doc.new_child(doc.root()).unwrap();
    doc.set_with(src, Reference(Some(outside))).unwrap();
    doc.commit().unwrap();

    let mut other = Document::new();
    other.open_transaction().unwrap();
    let dst = other.root();
    let outcome = doc.copy_to(src, &mut other, dst).unwrap();

    assert_eq!(
        outcome.warnings,
        vec![RelocationWarning::UnresolvedReference { source: outside }]
    );
    // The stale value is kept rather than cleared.
    assert_eq!(
        other.get::<Reference>(outcome.root).unwrap().0,
        Some(outside)
    );
}

#[test]
fn copy_requires_an_open_transaction_on_the_target() {
    let (doc, src, _) = setup();
    let mut other = Document::new();
    let dst = other.root();
    assert!(matches!(
        doc.copy_to(src, &mut other, dst),
        Err(TagdocError::NoOpenTransaction)
    ));
}

#[test]
fn copied_attributes_are_undoable_as_creations() {
    let (mut doc, src, _) = setup();

    doc.open_transaction().unwrap();
    let outcome = doc.copy_subtree(src, doc.root()).unwrap();
    doc.commit().unwrap();

    doc.undo().unwrap();
    // The copied labels remain (tree edits are not undone), but the copied
    // attributes are detached again.
    assert!(doc.is_alive(outcome.root));
    assert!(doc.get::<Name>(outcome.root).is_none());
    assert!(doc.get::<Reference>(outcome.root).is_none());

    doc.redo().unwrap();
    assert_eq!(doc.get::<Name>(outcome.root).unwrap().0, "assembly");
}
