//! Names shared by the class model, the relationship store and the web service.

/// `OpenAPI` tags.
pub const SYSTEM_TAG: &str = "System";
pub const SESSION_TAG: &str = "Session";
pub const INVENTORY_TAG: &str = "Inventory";

/// Parent id addressing the containment root.
pub const ROOT_ID: &str = "-1";

// --- Core classes ---

pub const CLASS_ROOT_OBJECT: &str = "RootObject";
pub const CLASS_DUMMY_ROOT: &str = "DummyRoot";
pub const CLASS_INVENTORY_OBJECT: &str = "InventoryObject";
pub const CLASS_GENERIC_OBJECT_LIST: &str = "GenericObjectList";
pub const CLASS_GENERIC_PORT: &str = "GenericPort";
pub const CLASS_GENERIC_LOGICAL_PORT: &str = "GenericLogicalPort";
pub const CLASS_GENERIC_PHYSICAL_NODE: &str = "GenericPhysicalNode";
pub const CLASS_GENERIC_PHYSICAL_LINK: &str = "GenericPhysicalLink";
pub const CLASS_GENERIC_PHYSICAL_CONTAINER: &str = "GenericPhysicalContainer";
pub const CLASS_GENERIC_COMMUNICATIONS_ELEMENT: &str = "GenericCommunicationsElement";
pub const CLASS_GENERIC_LOCATION: &str = "GenericLocation";
pub const CLASS_GENERIC_LOGICAL_CONNECTION: &str = "GenericLogicalConnection";
pub const CLASS_MPLS_LINK: &str = "MPLSLink";
pub const CLASS_BGP_LINK: &str = "BGPLink";
pub const CLASS_GENERIC_SDH_TRANSPORT_LINK: &str = "GenericSDHTransportLink";
pub const CLASS_GENERIC_SDH_CONTAINER_LINK: &str = "GenericSDHContainerLink";
pub const CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK: &str = "GenericSDHHighOrderContainerLink";
pub const CLASS_GENERIC_SDH_LOW_ORDER_CONTAINER_LINK: &str = "GenericSDHLowOrderContainerLink";
pub const CLASS_GENERIC_SDH_TRIBUTARY_LINK: &str = "GenericSDHTributaryLink";
pub const CLASS_GENERIC_SDH_HIGH_ORDER_TRIBUTARY_LINK: &str = "GenericSDHHighOrderTributaryLink";
pub const CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK: &str = "GenericSDHLowOrderTributaryLink";
pub const CLASS_GENERIC_SUBNET: &str = "GenericSubnet";
pub const CLASS_SUBNET_IPV4: &str = "SubnetIPv4";
pub const CLASS_SUBNET_IPV6: &str = "SubnetIPv6";
pub const CLASS_IP_ADDRESS: &str = "IPAddress";
pub const CLASS_VLAN: &str = "VLAN";
pub const CLASS_VRF_INSTANCE: &str = "VRFInstance";
pub const CLASS_GENERIC_CUSTOMER: &str = "GenericCustomer";
pub const CLASS_GENERIC_SERVICE: &str = "GenericService";
pub const CLASS_GENERIC_CONTRACT: &str = "GenericContract";
pub const CLASS_GENERIC_CONTACT: &str = "GenericContact";
pub const CLASS_GENERIC_PROJECT: &str = "GenericProject";
pub const CLASS_GENERIC_ACTIVITY: &str = "GenericActivity";
pub const CLASS_GENERIC_WAREHOUSE: &str = "GenericWarehouse";
pub const CLASS_WAREHOUSE: &str = "Warehouse";
pub const CLASS_VIRTUAL_WAREHOUSE: &str = "VirtualWarehouse";
pub const CLASS_GENERIC_PROXY: &str = "GenericProxy";

/// Classes whose removal would break the service itself.
pub const CORE_CLASSES: &[&str] = &[
    CLASS_ROOT_OBJECT,
    CLASS_DUMMY_ROOT,
    CLASS_INVENTORY_OBJECT,
    CLASS_GENERIC_OBJECT_LIST,
    CLASS_GENERIC_PORT,
    CLASS_GENERIC_LOGICAL_PORT,
    CLASS_GENERIC_PHYSICAL_NODE,
    CLASS_GENERIC_PHYSICAL_LINK,
    CLASS_GENERIC_PHYSICAL_CONTAINER,
    CLASS_GENERIC_COMMUNICATIONS_ELEMENT,
    CLASS_GENERIC_LOCATION,
    CLASS_GENERIC_LOGICAL_CONNECTION,
    CLASS_MPLS_LINK,
    CLASS_BGP_LINK,
    CLASS_GENERIC_SDH_TRANSPORT_LINK,
    CLASS_GENERIC_SDH_CONTAINER_LINK,
    CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK,
    CLASS_GENERIC_SDH_LOW_ORDER_CONTAINER_LINK,
    CLASS_GENERIC_SDH_TRIBUTARY_LINK,
    CLASS_GENERIC_SDH_HIGH_ORDER_TRIBUTARY_LINK,
    CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK,
    CLASS_GENERIC_SUBNET,
    CLASS_SUBNET_IPV4,
    CLASS_SUBNET_IPV6,
    CLASS_IP_ADDRESS,
    CLASS_VLAN,
    CLASS_VRF_INSTANCE,
    CLASS_GENERIC_CUSTOMER,
    CLASS_GENERIC_SERVICE,
    CLASS_GENERIC_CONTRACT,
    CLASS_GENERIC_CONTACT,
    CLASS_GENERIC_PROJECT,
    CLASS_GENERIC_ACTIVITY,
    CLASS_GENERIC_WAREHOUSE,
    CLASS_GENERIC_PROXY,
];

// --- Attributes ---

pub const ATTRIBUTE_NAME: &str = "name";
pub const ATTRIBUTE_CREATION_DATE: &str = "creationDate";
pub const ATTRIBUTE_DESCRIPTION: &str = "description";
pub const ATTRIBUTE_DISPLAY_NAME: &str = "displayName";
pub const ATTRIBUTE_BROADCAST_IP: &str = "broadcastIp";
pub const ATTRIBUTE_NETWORK_IP: &str = "networkIp";
pub const ATTRIBUTE_HOSTS: &str = "hosts";
pub const ATTRIBUTE_MASK: &str = "mask";

// --- Special relationships ---

pub const REL_ENDPOINT_A: &str = "endpointA";
pub const REL_ENDPOINT_B: &str = "endpointB";
pub const REL_MIRROR: &str = "mirror";
pub const REL_MIRROR_MULTIPLE: &str = "mirrorMultiple";
pub const REL_MPLS_ENDPOINT_A: &str = "mplsEndpointA";
pub const REL_MPLS_ENDPOINT_B: &str = "mplsEndpointB";
/// Links an MPLS link to the communications elements holding its endpoints.
pub const REL_MPLS_LINK: &str = "mplsLink";
pub const REL_BGP_LINK_ENDPOINT_A: &str = "bgpLinkEndpointA";
pub const REL_BGP_LINK_ENDPOINT_B: &str = "bgpLinkEndpointB";
/// Links a BGP link to the communications elements of its endpoints.
pub const REL_BGP_LINK: &str = "bgpLink";
pub const REL_SDH_TL_ENDPOINT_A: &str = "sdhTLEndpointA";
pub const REL_SDH_TL_ENDPOINT_B: &str = "sdhTLEndpointB";
pub const REL_SDH_TTL_ENDPOINT_A: &str = "sdhTTLEndpointA";
pub const REL_SDH_TTL_ENDPOINT_B: &str = "sdhTTLEndpointB";
/// Communications element to the transport links leaving it.
pub const REL_SDH_TRANSPORT_LINK: &str = "sdhTransportLink";
/// Communications element to the container links ending on it.
pub const REL_SDH_CONTAINER_LINK: &str = "sdhContainerLink";
/// Transport link (or high order tributary route) to the containers riding on it.
pub const REL_SDH_TRANSPORTS: &str = "sdhTransports";
/// High order container to the low order containers inside it.
pub const REL_SDH_CONTAINS: &str = "sdhContains";
/// Container to the tributary link it delivers.
pub const REL_SDH_DELIVERS: &str = "sdhDelivers";
pub const REL_USES: &str = "uses";
pub const REL_CONTACTS: &str = "contacts";
pub const REL_CONTRACT_HAS: &str = "contractHas";
pub const REL_PROJECT_USES: &str = "projectsProjectUses";
pub const REL_WAREHOUSE_HAS: &str = "warehouseHas";
pub const REL_HAS_IP_ADDRESS: &str = "ipamHasIpAddress";
pub const REL_BELONGS_TO_VLAN: &str = "ipamBelongsToVlan";
pub const REL_BELONGS_TO_VRF: &str = "ipamBelongsToVrfInstance";
pub const REL_PORT_TO_INTERFACE: &str = "ipamportrelatedtointerface";
pub const REL_HAS_PROXY: &str = "hasProxy";

/// Relationships followed when tracing a physical path.
pub const PHYSICAL_PATH_RELATIONSHIPS: &[&str] =
    &[REL_MIRROR, REL_MIRROR_MULTIPLE, REL_ENDPOINT_A, REL_ENDPOINT_B];

// --- Pools ---

pub const POOL_CLASS: &str = "Pool";
pub const IPV4_ROOT_POOL: &str = "IPv4 Root";
pub const IPV6_ROOT_POOL: &str = "IPv6 Root";
pub const IPV4_TYPE: i32 = 4;
pub const IPV6_TYPE: i32 = 6;

/// Pool types, as reported to clients.
pub const POOL_TYPE_GENERAL_PURPOSE: i32 = 1;
pub const POOL_TYPE_MODULE_ROOT: i32 = 2;
pub const POOL_TYPE_MODULE_COMPONENT: i32 = 3;

// --- Sessions ---

pub const SESSION_TYPE_DESKTOP: i32 = 1;
pub const SESSION_TYPE_WEB_SERVICE: i32 = 2;
pub const SESSION_TYPE_WEB: i32 = 3;

pub const DEFAULT_ADMIN_GROUP: &str = "Administrators";

// --- Storage namespaces ---

pub const ATTACHMENTS_NAMESPACE: &str = "attachments";
