//! Kind identifiers and the process-wide kind registry.
//!
//! Every attribute kind is tagged by a [`Guid`]: a 128-bit identifier that is
//! constant for the life of the process and unique by convention. The registry
//! is the single source of truth for diagnostic names: kinds register lazily
//! the first time they are attached, entries are never removed, and the only
//! runtime jobs are equality comparison and name lookup for dumps.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an attribute kind.
///
/// Kinds declare their GUID as a compile-time constant, e.g.:
///
/// ```ignore
/// const ID: Guid = Guid::from_uuid(uuid!("2a96b60b-ec8b-11d0-bee7-080009dc3333"));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Guid(Uuid);

impl Guid {
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Guid(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static KIND_NAMES: Lazy<Mutex<HashMap<Guid, &'static str>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Record a kind's diagnostic name. First registration wins; re-registering
/// the same GUID is a no-op, so kinds may register on every attach.
pub fn register_kind(guid: Guid, name: &'static str) {
    let mut names = KIND_NAMES.lock().unwrap_or_else(|e| e.into_inner());
    names.entry(guid).or_insert(name);
}

/// Diagnostic name for a kind, if it has registered one.
pub fn kind_name(guid: Guid) -> Option<&'static str> {
    let names = KIND_NAMES.lock().unwrap_or_else(|e| e.into_inner());
    names.get(&guid).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    const A: Guid = Guid::from_uuid(uuid!("11111111-2222-3333-4444-555555555555"));
    const B: Guid = Guid::from_uuid(uuid!("11111111-2222-3333-4444-666666666666"));

    #[test]
    fn constants_compare_by_value() {
        let same = Guid::from_uuid(uuid!("11111111-2222-3333-4444-555555555555"));
        assert_eq!(A, same);
        assert_ne!(A, B);
    }

    #[test]
    fn registry_lookup_returns_registered_name() {
        register_kind(A, "TestKindA");
        assert_eq!(kind_name(A), Some("TestKindA"));
    }

    #[test]
    fn first_registration_wins() {
        register_kind(B, "Original");
        register_kind(B, "Usurper");
        assert_eq!(kind_name(B), Some("Original"));
    }

    #[test]
    fn unregistered_guid_has_no_name() {
        let unknown = Guid::from_uuid(uuid!("99999999-9999-9999-9999-999999999999"));
        assert_eq!(kind_name(unknown), None);
    }

    #[test]
    fn display_is_hyphenated_lowercase() {
        assert_eq!(A.to_string(), "11111111-2222-3333-4444-555555555555");
    }
}
