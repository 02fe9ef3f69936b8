//! The class model every installation starts with.

use kw_database::Tables;
use kw_domain::constants::{
    ATTRIBUTE_BROADCAST_IP, ATTRIBUTE_CREATION_DATE, ATTRIBUTE_DESCRIPTION, ATTRIBUTE_DISPLAY_NAME, ATTRIBUTE_HOSTS,
    ATTRIBUTE_MASK, ATTRIBUTE_NAME, ATTRIBUTE_NETWORK_IP, CLASS_DUMMY_ROOT,
    CLASS_BGP_LINK, CLASS_GENERIC_ACTIVITY, CLASS_GENERIC_COMMUNICATIONS_ELEMENT, CLASS_GENERIC_CONTACT,
    CLASS_GENERIC_CONTRACT, CLASS_GENERIC_CUSTOMER, CLASS_GENERIC_LOCATION,
    CLASS_GENERIC_LOGICAL_CONNECTION, CLASS_GENERIC_LOGICAL_PORT, CLASS_GENERIC_OBJECT_LIST,
    CLASS_GENERIC_PHYSICAL_CONTAINER, CLASS_GENERIC_PHYSICAL_LINK, CLASS_GENERIC_PHYSICAL_NODE,
    CLASS_GENERIC_PORT, CLASS_GENERIC_PROJECT, CLASS_GENERIC_PROXY, CLASS_GENERIC_SDH_CONTAINER_LINK,
    CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK, CLASS_GENERIC_SDH_HIGH_ORDER_TRIBUTARY_LINK,
    CLASS_GENERIC_SDH_LOW_ORDER_CONTAINER_LINK, CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK,
    CLASS_GENERIC_SDH_TRANSPORT_LINK, CLASS_GENERIC_SDH_TRIBUTARY_LINK, CLASS_GENERIC_SERVICE,
    CLASS_GENERIC_SUBNET, CLASS_GENERIC_WAREHOUSE, CLASS_INVENTORY_OBJECT, CLASS_IP_ADDRESS,
    CLASS_MPLS_LINK, CLASS_ROOT_OBJECT, CLASS_SUBNET_IPV4, CLASS_SUBNET_IPV6, CLASS_VIRTUAL_WAREHOUSE,
    CLASS_VLAN, CLASS_VRF_INSTANCE, CLASS_WAREHOUSE,
};
use kw_domain::model::metadata::{AttributeMetadata, AttributeType, ClassMetadata};
use kw_kernel::{new_id, now_millis};

struct Seed {
    name: &'static str,
    parent: Option<&'static str>,
    is_abstract: bool,
    attributes: &'static [(&'static str, &'static str)],
    children: &'static [&'static str],
    special_children: &'static [&'static str],
}

const fn seed(name: &'static str, parent: &'static str, is_abstract: bool) -> Seed {
    Seed { name, parent: Some(parent), is_abstract, attributes: &[], children: &[], special_children: &[] }
}

const EQUIPMENT_VENDOR: &str = "EquipmentVendor";
const OPERATIONAL_STATE: &str = "OperationalState";

const CORE_MODEL: &[Seed] = &[
    Seed {
        name: CLASS_ROOT_OBJECT,
        parent: None,
        is_abstract: true,
        attributes: &[
            (ATTRIBUTE_NAME, "String"),
            (ATTRIBUTE_CREATION_DATE, "Date"),
            (ATTRIBUTE_DESCRIPTION, "String"),
        ],
        children: &[],
        special_children: &[],
    },
    Seed { children: &["Country"], ..seed(CLASS_DUMMY_ROOT, CLASS_ROOT_OBJECT, false) },
    seed(CLASS_INVENTORY_OBJECT, CLASS_ROOT_OBJECT, true),
    Seed {
        attributes: &[(ATTRIBUTE_DISPLAY_NAME, "String")],
        ..seed(CLASS_GENERIC_OBJECT_LIST, CLASS_ROOT_OBJECT, true)
    },
    seed(EQUIPMENT_VENDOR, CLASS_GENERIC_OBJECT_LIST, false),
    seed(OPERATIONAL_STATE, CLASS_GENERIC_OBJECT_LIST, false),
    Seed {
        special_children: &[
            CLASS_GENERIC_PHYSICAL_LINK,
            CLASS_GENERIC_PHYSICAL_CONTAINER,
            CLASS_GENERIC_LOGICAL_CONNECTION,
        ],
        ..seed(CLASS_GENERIC_PHYSICAL_NODE, CLASS_INVENTORY_OBJECT, true)
    },
    seed(CLASS_GENERIC_LOCATION, CLASS_GENERIC_PHYSICAL_NODE, true),
    Seed { children: &["City"], ..seed("Country", CLASS_GENERIC_LOCATION, false) },
    Seed { children: &["Building"], ..seed("City", CLASS_GENERIC_LOCATION, false) },
    Seed { children: &["Room", "Rack"], ..seed("Building", CLASS_GENERIC_LOCATION, false) },
    Seed { children: &["Rack"], ..seed("Room", CLASS_GENERIC_LOCATION, false) },
    Seed {
        children: &[CLASS_GENERIC_COMMUNICATIONS_ELEMENT],
        ..seed("Rack", CLASS_GENERIC_PHYSICAL_NODE, false)
    },
    Seed {
        attributes: &[("vendor", EQUIPMENT_VENDOR), ("serialNumber", "String")],
        children: &[CLASS_GENERIC_PORT, CLASS_GENERIC_LOGICAL_PORT],
        special_children: &[CLASS_VRF_INSTANCE, CLASS_VLAN],
        ..seed(CLASS_GENERIC_COMMUNICATIONS_ELEMENT, CLASS_GENERIC_PHYSICAL_NODE, true)
    },
    seed("Router", CLASS_GENERIC_COMMUNICATIONS_ELEMENT, false),
    seed("Switch", CLASS_GENERIC_COMMUNICATIONS_ELEMENT, false),
    Seed {
        attributes: &[("state", OPERATIONAL_STATE)],
        children: &[CLASS_GENERIC_LOGICAL_PORT],
        ..seed(CLASS_GENERIC_PORT, CLASS_INVENTORY_OBJECT, true)
    },
    seed("OpticalPort", CLASS_GENERIC_PORT, false),
    seed("ElectricalPort", CLASS_GENERIC_PORT, false),
    seed(CLASS_GENERIC_LOGICAL_PORT, CLASS_INVENTORY_OBJECT, true),
    seed("VirtualPort", CLASS_GENERIC_LOGICAL_PORT, false),
    seed(CLASS_GENERIC_PHYSICAL_LINK, CLASS_INVENTORY_OBJECT, true),
    seed("OpticalLink", CLASS_GENERIC_PHYSICAL_LINK, false),
    seed("ElectricalLink", CLASS_GENERIC_PHYSICAL_LINK, false),
    Seed {
        special_children: &[CLASS_GENERIC_PHYSICAL_LINK, CLASS_GENERIC_PHYSICAL_CONTAINER],
        ..seed(CLASS_GENERIC_PHYSICAL_CONTAINER, CLASS_INVENTORY_OBJECT, true)
    },
    seed("WireContainer", CLASS_GENERIC_PHYSICAL_CONTAINER, false),
    seed(CLASS_GENERIC_LOGICAL_CONNECTION, CLASS_INVENTORY_OBJECT, true),
    seed(CLASS_MPLS_LINK, CLASS_GENERIC_LOGICAL_CONNECTION, false),
    seed(CLASS_BGP_LINK, CLASS_GENERIC_LOGICAL_CONNECTION, false),
    seed(CLASS_GENERIC_SDH_TRANSPORT_LINK, CLASS_GENERIC_LOGICAL_CONNECTION, true),
    seed("STM1", CLASS_GENERIC_SDH_TRANSPORT_LINK, false),
    seed("STM4", CLASS_GENERIC_SDH_TRANSPORT_LINK, false),
    seed("STM16", CLASS_GENERIC_SDH_TRANSPORT_LINK, false),
    seed("STM64", CLASS_GENERIC_SDH_TRANSPORT_LINK, false),
    seed(CLASS_GENERIC_SDH_CONTAINER_LINK, CLASS_GENERIC_LOGICAL_CONNECTION, true),
    seed(CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK, CLASS_GENERIC_SDH_CONTAINER_LINK, true),
    seed("VC4", CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK, false),
    seed(CLASS_GENERIC_SDH_LOW_ORDER_CONTAINER_LINK, CLASS_GENERIC_SDH_CONTAINER_LINK, true),
    seed("VC3", CLASS_GENERIC_SDH_LOW_ORDER_CONTAINER_LINK, false),
    seed("VC12", CLASS_GENERIC_SDH_LOW_ORDER_CONTAINER_LINK, false),
    seed(CLASS_GENERIC_SDH_TRIBUTARY_LINK, CLASS_GENERIC_LOGICAL_CONNECTION, true),
    seed(CLASS_GENERIC_SDH_HIGH_ORDER_TRIBUTARY_LINK, CLASS_GENERIC_SDH_TRIBUTARY_LINK, true),
    seed("VC4TributaryLink", CLASS_GENERIC_SDH_HIGH_ORDER_TRIBUTARY_LINK, false),
    seed(CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK, CLASS_GENERIC_SDH_TRIBUTARY_LINK, true),
    seed("VC3TributaryLink", CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK, false),
    seed("VC12TributaryLink", CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK, false),
    Seed {
        attributes: &[
            (ATTRIBUTE_NETWORK_IP, "String"),
            (ATTRIBUTE_BROADCAST_IP, "String"),
            (ATTRIBUTE_HOSTS, "Integer"),
        ],
        special_children: &[CLASS_GENERIC_SUBNET, CLASS_IP_ADDRESS],
        ..seed(CLASS_GENERIC_SUBNET, CLASS_INVENTORY_OBJECT, true)
    },
    seed(CLASS_SUBNET_IPV4, CLASS_GENERIC_SUBNET, false),
    seed(CLASS_SUBNET_IPV6, CLASS_GENERIC_SUBNET, false),
    Seed { attributes: &[(ATTRIBUTE_MASK, "String")], ..seed(CLASS_IP_ADDRESS, CLASS_INVENTORY_OBJECT, false) },
    seed(CLASS_VLAN, CLASS_INVENTORY_OBJECT, false),
    seed(CLASS_VRF_INSTANCE, CLASS_INVENTORY_OBJECT, false),
    seed(CLASS_GENERIC_CUSTOMER, CLASS_INVENTORY_OBJECT, true),
    seed("CorporateCustomer", CLASS_GENERIC_CUSTOMER, false),
    seed("HomeCustomer", CLASS_GENERIC_CUSTOMER, false),
    seed(CLASS_GENERIC_SERVICE, CLASS_INVENTORY_OBJECT, true),
    seed("DataService", CLASS_GENERIC_SERVICE, false),
    Seed {
        attributes: &[("startDate", "Date"), ("expirationDate", "Date")],
        ..seed(CLASS_GENERIC_CONTRACT, CLASS_INVENTORY_OBJECT, true)
    },
    seed("SupportContract", CLASS_GENERIC_CONTRACT, false),
    Seed {
        special_children: &[CLASS_GENERIC_ACTIVITY],
        ..seed(CLASS_GENERIC_PROJECT, CLASS_INVENTORY_OBJECT, true)
    },
    seed("GeneralProject", CLASS_GENERIC_PROJECT, false),
    seed(CLASS_GENERIC_ACTIVITY, CLASS_INVENTORY_OBJECT, true),
    seed("GeneralActivity", CLASS_GENERIC_ACTIVITY, false),
    Seed {
        children: &["Rack", CLASS_GENERIC_COMMUNICATIONS_ELEMENT, CLASS_GENERIC_PORT],
        ..seed(CLASS_GENERIC_WAREHOUSE, CLASS_INVENTORY_OBJECT, true)
    },
    seed(CLASS_WAREHOUSE, CLASS_GENERIC_WAREHOUSE, false),
    seed(CLASS_VIRTUAL_WAREHOUSE, CLASS_GENERIC_WAREHOUSE, false),
    Seed {
        attributes: &[("email", "String"), ("telephone", "String"), ("company", "String")],
        ..seed(CLASS_GENERIC_CONTACT, CLASS_ROOT_OBJECT, true)
    },
    seed("TechnicalContact", CLASS_GENERIC_CONTACT, false),
    seed("CommercialContact", CLASS_GENERIC_CONTACT, false),
    seed(CLASS_GENERIC_PROXY, CLASS_ROOT_OBJECT, true),
    seed("InventoryProxy", CLASS_GENERIC_PROXY, false),
];

/// Seeds the core class model into an empty class table. Returns how many classes were
/// added; an installation that already has `RootObject` is left untouched.
pub fn seed_core_model(tables: &mut Tables) -> usize {
    if tables.classes.contains(CLASS_ROOT_OBJECT) {
        return 0;
    }
    let now = now_millis();
    for seed in CORE_MODEL {
        let attributes = seed
            .attributes
            .iter()
            .zip(0_i32..)
            .map(|(&(name, type_name), order)| AttributeMetadata {
                id: new_id(),
                name: name.to_owned(),
                display_name: name.to_owned(),
                description: String::new(),
                attribute_type: AttributeType::parse(type_name),
                administrative: false,
                visible: true,
                read_only: name == ATTRIBUTE_CREATION_DATE,
                unique: false,
                mandatory: false,
                no_copy: name == ATTRIBUTE_CREATION_DATE,
                order,
            })
            .collect();

        tables.classes.insert(ClassMetadata {
            id: new_id(),
            name: seed.name.to_owned(),
            display_name: seed.name.to_owned(),
            description: String::new(),
            parent_class_name: seed.parent.map(str::to_owned),
            is_abstract: seed.is_abstract,
            custom: false,
            countable: true,
            in_design: false,
            color: 0,
            attributes,
            possible_children: seed.children.iter().map(|&c| c.to_owned()).collect(),
            possible_special_children: seed
                .special_children
                .iter()
                .map(|&c| c.to_owned())
                .collect(),
            creation_date: now,
        });
    }
    CORE_MODEL.len()
}
