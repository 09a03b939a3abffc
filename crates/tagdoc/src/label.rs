//! Label handles.
//!
//! A [`Label`] is a copyable handle into a [`Document`](crate::Document)'s
//! node arena. The document owns the nodes; handles are plain indices and
//! never dangle in the memory sense — a handle to a removed label stays safe
//! to pass around, and every operation on it reports *invalid label* instead
//! of touching freed state.
//!
//! Labels are addressed externally by their *entry*: the colon-separated tag
//! path from the root, e.g. `"0:1:3"`. Entries are stable across save/restore
//! as long as the tree shape is unchanged.

use serde::{Deserialize, Serialize};

/// Handle to a node in a document's label tree.
///
/// Only meaningful together with the `Document` that issued it. Comparing or
/// hashing labels from different documents is well-defined but pointless.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Label(pub(crate) u32);

impl Label {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
