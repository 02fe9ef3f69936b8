//! BGP links as discovered by the routing synchronization. They are kept like any other
//! logical connection; this module only draws the map of them.

use crate::mpls::{self, LogicalLinkDetails};
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{CLASS_BGP_LINK, REL_BGP_LINK_ENDPOINT_A, REL_BGP_LINK_ENDPOINT_B};
use kw_domain::model::inventory::BusinessObject;
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use kw_metadata::values::RemoteObject;

fn details(tables: &Tables, link: &BusinessObject) -> Result<LogicalLinkDetails, InventoryError> {
    let key = link.key();
    let end = |name: &str| {
        tables.relationships.outgoing(&key, name).first().and_then(|end| relationships::light(tables, end))
    };
    let endpoint_a = end(REL_BGP_LINK_ENDPOINT_A);
    let endpoint_b = end(REL_BGP_LINK_ENDPOINT_B);
    Ok(LogicalLinkDetails {
        link: RemoteObject::from(link),
        device_a: mpls::endpoint_device(tables, endpoint_a.as_ref())?,
        device_b: mpls::endpoint_device(tables, endpoint_b.as_ref())?,
        endpoint_a,
        endpoint_b,
    })
}

/// Every BGP link the client has not mapped yet, with its endpoints and their devices,
/// by name.
///
/// # Errors
/// [`InventoryError::NotFound`] when an endpoint's containment is broken.
pub fn bgp_map(tables: &Tables, mapped: &[Id]) -> Result<Vec<LogicalLinkDetails>, InventoryError> {
    let mut links: Vec<&BusinessObject> =
        tables.objects.of_class(CLASS_BGP_LINK).filter(|link| !mapped.contains(&link.id)).collect();
    links.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    links.into_iter().map(|link| details(tables, link)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::constants::REL_BGP_LINK;
    use kw_domain::model::ObjectKey;
    use kw_domain::model::inventory::ParentRef;
    use kw_metadata::bootstrap::seed_core_model;
    use std::collections::BTreeMap;

    fn add(tables: &mut Tables, class_name: &str, id: &str, parent: ParentRef) -> ObjectKey {
        tables.objects.insert(BusinessObject {
            id: id.to_owned(),
            class_name: class_name.to_owned(),
            name: id.to_owned(),
            parent,
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        ObjectKey::new(class_name, id)
    }

    #[test]
    fn map_skips_links_already_drawn() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let edge = add(&mut tables, "Router", "edge", ParentRef::Root);
        let port = add(&mut tables, "ElectricalPort", "edge-ge0", ParentRef::Child(edge));
        let peer = add(&mut tables, "Router", "peer", ParentRef::Root);
        for id in ["as100-as200", "as100-as300"] {
            let link = add(&mut tables, CLASS_BGP_LINK, id, ParentRef::Detached);
            relationships::insert(&mut tables, link.clone(), port.clone(), REL_BGP_LINK_ENDPOINT_A, BTreeMap::new());
            relationships::insert(&mut tables, link.clone(), peer.clone(), REL_BGP_LINK_ENDPOINT_B, BTreeMap::new());
            relationships::insert(&mut tables, link, peer.clone(), REL_BGP_LINK, BTreeMap::new());
        }

        let map = bgp_map(&tables, &[]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].link.name, "as100-as200");
        assert_eq!(map[0].endpoint_a.as_ref().unwrap().id, "edge-ge0");
        assert_eq!(map[0].device_a.as_ref().unwrap().id, "edge");
        assert_eq!(map[0].device_b.as_ref().unwrap().id, "peer");

        let rest = bgp_map(&tables, &["as100-as200".to_owned()]).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].link.id, "as100-as300");
    }
}
