//! Contracts and the inventory they cover, linked with `contractHas`.

use crate::catalog;
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{CLASS_GENERIC_CONTRACT, REL_CONTRACT_HAS};
use kw_domain::model::{ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;

fn contract_key(tables: &Tables, contract: &ObjectKey) -> Result<ObjectKey, InventoryError> {
    Ok(catalog::member(tables, CLASS_GENERIC_CONTRACT, &contract.class_name, &contract.id)?.key())
}

/// # Errors
/// See [`catalog::relate_all`], plus [`InventoryError::NotFound`] for unknown contracts.
pub fn relate_to_contract(
    tables: &mut Tables,
    contract: &ObjectKey,
    objects: &[ObjectKey],
) -> Result<Vec<ObjectKey>, InventoryError> {
    let contract = contract_key(tables, contract)?;
    catalog::relate_all(tables, &contract, objects, REL_CONTRACT_HAS)
}

/// Releases an object from a contract given only the contract id.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown contracts and objects the contract does not
/// cover.
pub fn release_from_contract(tables: &mut Tables, contract_id: &str, object_id: &str) -> Result<ObjectKey, InventoryError> {
    let contract = contract_key(tables, &ObjectKey::new(CLASS_GENERIC_CONTRACT, contract_id))?;
    catalog::release(tables, &contract, object_id, REL_CONTRACT_HAS)?;
    Ok(contract)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown contracts.
pub fn contract_resources(tables: &Tables, contract: &ObjectKey) -> Result<Vec<ObjectLight>, InventoryError> {
    let contract = contract_key(tables, contract)?;
    relationships::special_attribute(tables, &contract, REL_CONTRACT_HAS)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn contracts_of_object(tables: &Tables, object: &ObjectKey) -> Result<Vec<ObjectLight>, InventoryError> {
    catalog::holders_of(tables, object, CLASS_GENERIC_CONTRACT, REL_CONTRACT_HAS)
}
