use kw_database::Database;
use kw_services::{Services, init};

#[test]
fn test_init_registers_services_slice() {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let slice = init(&database, None).unwrap();
    assert_eq!(slice.name(), Services::NAME);
    assert!(slice.state::<Services>().is_some());
}

#[test]
fn test_init_needs_the_class_model() {
    assert!(init(&Database::in_memory(), None).is_err());
}
