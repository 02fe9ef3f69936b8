#![cfg(feature = "server")]

use kw_database::Database;
use kw_domain::config::ApiConfig;
use kw_domain::registry::InitializedSlice;
use kw_kernel::server::{ApiState, ApiStateError};

#[kw_derive::kw_slice(name = "gauge")]
pub struct Gauge {
    answer: u8,
}

fn gauge(answer: u8) -> InitializedSlice {
    InitializedSlice::new(Gauge::new(GaugeInner { answer }))
}

#[test]
fn registered_slices_are_reachable_by_type() {
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .db(Database::in_memory())
        .register_slice(gauge(42))
        .build()
        .unwrap();

    assert_eq!(state.try_get_slice::<Gauge>().unwrap().answer, 42);
    assert_eq!(state.slice_names().collect::<Vec<_>>(), ["gauge"]);
    assert!(!state.is_persistent());
}

#[test]
fn database_is_required() {
    let err = ApiState::builder().config(ApiConfig::default()).build().unwrap_err();
    assert!(matches!(err, ApiStateError::Validation { .. }));
}

#[test]
fn a_slice_type_registers_once() {
    let err = ApiState::builder()
        .config(ApiConfig::default())
        .db(Database::in_memory())
        .register_slices([gauge(1), gauge(2)])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("gauge"));
}

#[tokio::test]
async fn storage_makes_the_state_persistent() {
    let dir = tempfile::tempdir().unwrap();
    let storage = kw_storage::Storage::builder().root(dir.path()).connect().await.unwrap();
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .db(Database::in_memory())
        .storage(storage)
        .build()
        .unwrap();
    assert!(state.is_persistent());
}
