use kw_storage::StorageError;
use std::borrow::Cow;

/// A specialized [`DatabaseError`] enum of this crate.
#[kw_derive::kw_error]
pub enum DatabaseError {
    /// Missing or contradictory builder settings.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Reading or writing the snapshot file failed.
    #[error("Snapshot storage error{}: {source}", format_context(.context))]
    Storage {
        #[source]
        source: StorageError,
        context: Option<Cow<'static, str>>,
    },

    /// The snapshot bytes do not decode into the current table layout.
    #[error("Snapshot codec error{}: {source}", format_context(.context))]
    Codec {
        #[source]
        source: postcard::Error,
        context: Option<Cow<'static, str>>,
    },

    /// The snapshot was written by an incompatible format version.
    #[error("Snapshot format error{}: {message}", format_context(.context))]
    Format { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
