//! IP addresses inside subnets, and the relationships IPAM keeps between addresses, ports,
//! subnets, VLANs, VRF instances and logical interfaces.

use crate::cidr::parse_address;
use crate::subnets::{self, block};
use kw_business::objects::{self, NewObject, Removed, Store};
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{
    ATTRIBUTE_MASK, ATTRIBUTE_NAME, CLASS_GENERIC_SUBNET, CLASS_IP_ADDRESS, CLASS_VLAN, CLASS_VRF_INSTANCE,
    REL_BELONGS_TO_VLAN, REL_BELONGS_TO_VRF, REL_HAS_IP_ADDRESS, REL_PORT_TO_INTERFACE,
};
use kw_domain::model::inventory::{BusinessObject, ParentRef};
use kw_domain::model::{Id, ObjectKey};
use kw_kernel::error::InventoryError;
use std::collections::BTreeMap;

/// Adds an address to a subnet. The `name` attribute carries the address; `mask` defaults
/// to the mask of the subnet.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown subnets.
/// * [`InventoryError::InvalidArgument`] for a missing or malformed address.
/// * [`InventoryError::OperationNotPermitted`] for addresses outside the subnet, the network
///   or broadcast address of an IPv4 subnet that has hosts besides them, and addresses
///   already taken in the subnet.
pub fn add_ip_address(
    tables: &mut Tables,
    subnet_id: &str,
    subnet_class: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    let subnet = subnets::find(tables, subnet_class, subnet_id)?;
    let cidr = block(subnet)?;
    let text = attributes
        .get(ATTRIBUTE_NAME)
        .ok_or_else(|| InventoryError::invalid("An IP address needs the address as name"))?;
    let address = parse_address(text)?;
    if !cidr.contains(address) {
        return Err(InventoryError::not_permitted(format!("{address} does not belong to {cidr}")));
    }
    if address.is_ipv4() && cidr.prefix() < 31 && (address == cidr.network() || address == cidr.broadcast()) {
        return Err(InventoryError::not_permitted(format!("{address} is not a host address of {cidr}")));
    }
    let parent = ParentRef::Special(subnet.key());
    let taken = tables
        .objects
        .children_of(&parent)
        .filter(|o| o.class_name == CLASS_IP_ADDRESS)
        .any(|o| parse_address(&o.name).is_ok_and(|other| other == address));
    if taken {
        return Err(InventoryError::not_permitted(format!("{address} is already in use in {cidr}")));
    }

    let mut attributes = attributes.clone();
    attributes.insert(ATTRIBUTE_NAME.to_owned(), address.to_string());
    attributes.entry(ATTRIBUTE_MASK.to_owned()).or_insert_with(|| cidr.mask());
    let new = NewObject {
        class_name: CLASS_IP_ADDRESS.to_owned(),
        parent_class_name: subnet.class_name.clone(),
        parent_id: subnet.id.clone(),
        attributes,
        template_id: None,
    };
    objects::create_object(tables, Store::Objects, &new, true)
}

/// Removes addresses.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown addresses, before anything is removed.
/// * [`InventoryError::OperationNotPermitted`] for related addresses when
///   `release_relationships` is not set.
pub fn remove_ips(tables: &mut Tables, ids: &[Id], release_relationships: bool) -> Result<Removed, InventoryError> {
    let keys = ids
        .iter()
        .map(|id| objects::object(tables, CLASS_IP_ADDRESS, id).map(BusinessObject::key))
        .collect::<Result<Vec<ObjectKey>, _>>()?;
    objects::delete_objects(tables, Store::Objects, &keys, release_relationships)
}

/// Which IPAM relationship, and what each end has to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// A port or device (a) holds an address (b).
    PortAddress,
    /// A VLAN (a) carries a subnet (b).
    SubnetVlan,
    /// A VRF instance (a) routes a subnet (b).
    SubnetVrf,
    /// A logical interface (a) is bound to a port (b).
    PortInterface,
}

impl Link {
    #[must_use]
    pub const fn relationship(self) -> &'static str {
        match self {
            Self::PortAddress => REL_HAS_IP_ADDRESS,
            Self::SubnetVlan => REL_BELONGS_TO_VLAN,
            Self::SubnetVrf => REL_BELONGS_TO_VRF,
            Self::PortInterface => REL_PORT_TO_INTERFACE,
        }
    }

    /// Classes the a and b ends must descend from, when fixed.
    const fn ends(self) -> (Option<&'static str>, Option<&'static str>) {
        match self {
            Self::PortAddress => (None, Some(CLASS_IP_ADDRESS)),
            Self::SubnetVlan => (Some(CLASS_VLAN), Some(CLASS_GENERIC_SUBNET)),
            Self::SubnetVrf => (Some(CLASS_VRF_INSTANCE), Some(CLASS_GENERIC_SUBNET)),
            Self::PortInterface => (None, None),
        }
    }

    fn resolve(tables: &Tables, key: &ObjectKey, required: Option<&str>) -> Result<ObjectKey, InventoryError> {
        let object = objects::object(tables, required.unwrap_or(&key.class_name), &key.id)?;
        if object.class_name != key.class_name && !tables.classes.is_subclass_of(&object.class_name, &key.class_name) {
            return Err(InventoryError::not_found(format!("Object {key} could not be found")));
        }
        Ok(object.key())
    }

    /// Relates `a` to `b`. Returns both ends as stored.
    ///
    /// # Errors
    /// * [`InventoryError::NotFound`] for unknown objects or ends of the wrong class.
    /// * [`InventoryError::OperationNotPermitted`] when the pair is already related this
    ///   way or the business rules forbid the link.
    pub fn relate(self, tables: &mut Tables, a: &ObjectKey, b: &ObjectKey) -> Result<(ObjectKey, ObjectKey), InventoryError> {
        let (a_class, b_class) = self.ends();
        let a = Self::resolve(tables, a, a_class)?;
        let b = Self::resolve(tables, b, b_class)?;
        let name = self.relationship();
        if tables.relationships.linked(&a, &b, name) {
            return Err(InventoryError::not_permitted(format!("{a} and {b} are already related through {name}")));
        }
        relationships::create(tables, &a, &b, name, false, BTreeMap::new())?;
        Ok((a, b))
    }

    /// Releases the link between `a` and the object with `b_id`.
    ///
    /// # Errors
    /// [`InventoryError::NotFound`] for unknown objects and for pairs that are not related.
    pub fn release(self, tables: &mut Tables, a: &ObjectKey, b_id: &str) -> Result<(), InventoryError> {
        let a = Self::resolve(tables, a, self.ends().0)?;
        let name = self.relationship();
        if relationships::release(tables, &a, b_id, name)? == 0 {
            return Err(InventoryError::not_found(format!("{a} is not related to {b_id} through {name}")));
        }
        Ok(())
    }
}
