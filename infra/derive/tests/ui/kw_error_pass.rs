use kw_derive::kw_error;
use std::borrow::Cow;

#[kw_error]
pub enum SnapshotError {
    #[error("Snapshot IO failure{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Snapshot is malformed{}: {reason}", format_context(.context))]
    Malformed { reason: String, context: Option<Cow<'static, str>> },

    #[error("Internal snapshot fault{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err: SnapshotError = "boom".into();
    assert!(err.attached_context().is_none());
}
