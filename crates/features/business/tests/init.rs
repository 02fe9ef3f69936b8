use kw_business::{Business, init};
use kw_database::Database;

#[test]
fn test_init_registers_business_slice() {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let slice = init(&database, None).unwrap();
    assert_eq!(slice.name(), Business::NAME);
    assert!(slice.state::<Business>().is_some());
}
