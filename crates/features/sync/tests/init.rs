use kw_database::Database;
use kw_sync::{Synchronization, init};

#[test]
fn test_init_registers_sync_slice() {
    let database = Database::in_memory();
    let slice = init(&database).unwrap();
    assert_eq!(slice.name(), Synchronization::NAME);
    assert!(slice.state::<Synchronization>().is_some());
}
