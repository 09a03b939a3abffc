use thiserror::Error;

use crate::guid::Guid;

#[derive(Error, Debug)]
pub enum TagdocError {
    /// The label handle points at a removed or unknown node.
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// A second attribute with the same kind GUID was attached to one label.
    #[error("label {entry} already holds an attribute of kind {guid}")]
    DuplicateAttribute { guid: Guid, entry: String },

    /// The label holds no attribute of the requested kind.
    #[error("label {entry} holds no attribute of kind {guid}")]
    AttributeNotFound { guid: Guid, entry: String },

    /// Restore/paste was attempted between attributes of different kinds.
    #[error("attribute kind mismatch for {guid}")]
    KindMismatch { guid: Guid },

    /// Mutation attempted while no transaction is open.
    #[error("no transaction is open")]
    NoOpenTransaction,

    /// A transaction is already open (nested transactions are not supported),
    /// or undo/redo was requested while one is in flight.
    #[error("a transaction is already open")]
    TransactionAlreadyOpen,

    /// The document root cannot be removed.
    #[error("the root label cannot be removed")]
    RootRemoval,

    /// Child tags are small positive integers; zero is reserved for the root.
    #[error("invalid child tag {0}: tags must be positive")]
    InvalidTag(u32),

    #[error("dump formatting error: {0}")]
    Dump(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, TagdocError>;
