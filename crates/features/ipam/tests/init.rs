use kw_database::Database;
use kw_domain::constants::ROOT_ID;
use kw_ipam::{Ipam, init, pools};

#[test]
fn test_init_registers_ipam_slice() {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let slice = init(&database, None).unwrap();
    assert_eq!(slice.name(), Ipam::NAME);
    assert!(slice.state::<Ipam>().is_some());

    init(&database, None).unwrap();
    assert_eq!(database.read(|t| pools::subnet_pools(t, ROOT_ID, None)).unwrap().len(), 2);
}

#[test]
fn test_init_needs_the_class_model() {
    assert!(init(&Database::in_memory(), None).is_err());
}
