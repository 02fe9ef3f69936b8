use kw_connections::{Connections, init};
use kw_database::Database;

#[test]
fn test_init_registers_connections_slice() {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let slice = init(&database, None).unwrap();
    assert_eq!(slice.name(), Connections::NAME);
    assert!(slice.state::<Connections>().is_some());
}
