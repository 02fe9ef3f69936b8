use kw_derive::kw_error;
use std::borrow::Cow;

#[kw_error]
pub enum CatalogError {
    #[error("Catalog IO failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Class {name} not found{}", format_context(.context))]
    ClassNotFound { name: String, context: Option<Cow<'static, str>> },

    #[fault(rejected)]
    #[error("Catalog change rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal catalog fault{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_catalog() -> Result<(), std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "catalog.bin"))
}

fn find_class(name: &str) -> Result<(), CatalogError> {
    Err(CatalogError::ClassNotFound { name: name.to_owned(), context: None })
}

#[test]
fn kw_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/kw_error_pass.rs");
}

#[test]
fn source_errors_convert_with_context() {
    let err = read_catalog().context("Loading catalog").unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
    assert_eq!(err.attached_context(), Some("Loading catalog"));
    assert!(err.to_string().starts_with("Catalog IO failure (Loading catalog):"));
}

#[test]
fn context_is_attached_to_own_errors() {
    let err = find_class("Router").context("Creating object").unwrap_err();
    assert_eq!(err.to_string(), "Class Router not found (Creating object)");
}

#[test]
fn plain_strings_become_internal() {
    let err: CatalogError = String::from("index out of sync").into();
    assert!(matches!(err, CatalogError::Internal { .. }));
    assert_eq!(err.to_string(), "Internal catalog fault: index out of sync");
    assert!(err.attached_context().is_none());
}

#[test]
fn question_mark_converts_io_errors() {
    fn load() -> Result<(), CatalogError> {
        read_catalog()?;
        Ok(())
    }
    assert!(matches!(load(), Err(CatalogError::Io { context: None, .. })));
}

#[test]
fn fault_variants_get_a_constructor() {
    let err = CatalogError::rejected(format!("{} is a core class", "Router"));
    assert!(matches!(err, CatalogError::Rejected { context: None, .. }));
    let err = Err::<(), _>(err).context("deleteClass").unwrap_err();
    assert_eq!(err.to_string(), "Catalog change rejected (deleteClass): Router is a core class");
}
