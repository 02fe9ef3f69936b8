use kw_application::{Application, init};
use kw_database::Database;
use kw_domain::config::AttachmentsConfig;

#[test]
fn test_init_registers_application_slice() {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let slice = init(&database, None, &AttachmentsConfig::default()).unwrap();
    assert_eq!(slice.name(), Application::NAME);
    assert!(slice.state::<Application>().is_some());
}
