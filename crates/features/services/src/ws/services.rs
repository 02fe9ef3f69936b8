use super::{forget_removed, record_links};
use crate::{Services, catalog, contacts, customers, impact};
use kw_domain::constants::{CLASS_GENERIC_CUSTOMER, CLASS_GENERIC_SERVICE, REL_CONTACTS, REL_USES};
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use strum::VariantNames;

/// Customers, the services they are provided and their contacts.
#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ServicesCall {
    CreateCustomerPool {
        name: String,
        #[serde(default)]
        description: String,
    },
    GetCustomerPools {},
    DeleteCustomerPool { pool_id: Id },
    CreateCustomer {
        pool_id: Id,
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        template_id: Option<Id>,
    },
    GetCustomersInPool {
        pool_id: Id,
        #[serde(default)]
        class_name: Option<String>,
        #[serde(default)]
        limit: i64,
    },
    GetAllCustomers {
        #[serde(default)]
        limit: i64,
    },
    DeleteCustomer { class_name: String, id: Id },
    CreateServicePool {
        customer_class_name: String,
        customer_id: Id,
        name: String,
        #[serde(default)]
        description: String,
    },
    GetServicePoolsInCustomer { customer_class_name: String, customer_id: Id },
    CreateService {
        pool_id: Id,
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        template_id: Option<Id>,
    },
    GetServicesInPool {
        pool_id: Id,
        #[serde(default)]
        class_name: Option<String>,
        #[serde(default)]
        limit: i64,
    },
    GetAllServices {
        #[serde(default)]
        limit: i64,
    },
    DeleteService {
        class_name: String,
        id: Id,
        #[serde(default)]
        release_relationships: bool,
    },
    RelateObjectToService { object_class_name: String, object_id: Id, service_class_name: String, service_id: Id },
    RelateObjectsToService { objects: Vec<ObjectKey>, service_class_name: String, service_id: Id },
    ReleaseObjectFromService { service_class_name: String, service_id: Id, object_id: Id },
    GetObjectsRelatedToService { service_class_name: String, service_id: Id },
    GetServicesForObject { class_name: String, id: Id },
    CreateContact {
        class_name: String,
        #[serde(default)]
        properties: BTreeMap<String, String>,
        customer_class_name: String,
        customer_id: Id,
    },
    UpdateContact { class_name: String, id: Id, properties: BTreeMap<String, String> },
    DeleteContact { class_name: String, id: Id },
    GetContact { class_name: String, id: Id },
    SearchForContacts {
        #[serde(default)]
        search_string: String,
        #[serde(default)]
        limit: i64,
    },
    GetContactsForCustomer { customer_class_name: String, customer_id: Id },
    GetAffectedServices { resource_type: i32, resource_definition: String },
}

impl SliceCall for ServicesCall {
    type Slice = Services;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetCustomerPools {}
            | Self::GetCustomersInPool { .. }
            | Self::GetAllCustomers { .. }
            | Self::GetServicePoolsInCustomer { .. }
            | Self::GetServicesInPool { .. }
            | Self::GetAllServices { .. }
            | Self::GetObjectsRelatedToService { .. }
            | Self::GetServicesForObject { .. }
            | Self::GetContact { .. }
            | Self::SearchForContacts { .. }
            | Self::GetContactsForCustomer { .. }
            | Self::GetAffectedServices { .. } => Requirement::read(FeatureSet::SERVICES),
            _ => Requirement::write(FeatureSet::SERVICES),
        }
    }

    async fn execute(self, slice: &Services, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        let attachments = slice.attachments.as_ref();
        match self {
            Self::CreateCustomerPool { name, description } => {
                let id = db.write(|t| catalog::create_root_pool(t, CLASS_GENERIC_CUSTOMER, &name, &description))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Customer pool {name}"));
                reply(id)
            },
            Self::GetCustomerPools {} => reply(db.read(|t| catalog::root_pools(t, CLASS_GENERIC_CUSTOMER))),
            Self::DeleteCustomerPool { pool_id } => {
                let removed = db.write(|t| catalog::delete_pool(t, CLASS_GENERIC_CUSTOMER, &pool_id))?;
                forget_removed(attachments, ctx, &removed).await;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Customer pool {pool_id}"));
                reply(())
            },
            Self::CreateCustomer { pool_id, class_name, attributes, template_id } => {
                let id = db.write(|t| {
                    catalog::create_item(t, CLASS_GENERIC_CUSTOMER, &pool_id, &class_name, &attributes, template_id.as_deref())
                })?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("In pool {pool_id}"),
                );
                reply(id)
            },
            Self::GetCustomersInPool { pool_id, class_name, limit } => reply(db.read(|t| {
                catalog::items_in_pool(t, CLASS_GENERIC_CUSTOMER, &pool_id, class_name.as_deref(), limit)
            })?),
            Self::GetAllCustomers { limit } => reply(db.read(|t| catalog::all_of(t, CLASS_GENERIC_CUSTOMER, limit))),
            Self::DeleteCustomer { class_name, id } => {
                let removed = db.write(|t| customers::delete_customer(t, &class_name, &id))?;
                forget_removed(attachments, ctx, &removed).await;
                reply(())
            },
            Self::CreateServicePool { customer_class_name, customer_id, name, description } => {
                let customer = ObjectKey::new(customer_class_name, customer_id);
                let id = db.write(|t| customers::create_service_pool(t, &customer, &name, &description))?;
                ctx.record(ActivityType::CreateApplicationObject, Some(&customer), format!("Service pool {name}"));
                reply(id)
            },
            Self::GetServicePoolsInCustomer { customer_class_name, customer_id } => {
                let customer = ObjectKey::new(customer_class_name, customer_id);
                reply(db.read(|t| customers::service_pools(t, &customer))?)
            },
            Self::CreateService { pool_id, class_name, attributes, template_id } => {
                let id = db.write(|t| {
                    catalog::create_item(t, CLASS_GENERIC_SERVICE, &pool_id, &class_name, &attributes, template_id.as_deref())
                })?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("In pool {pool_id}"),
                );
                reply(id)
            },
            Self::GetServicesInPool { pool_id, class_name, limit } => reply(db.read(|t| {
                catalog::items_in_pool(t, CLASS_GENERIC_SERVICE, &pool_id, class_name.as_deref(), limit)
            })?),
            Self::GetAllServices { limit } => reply(db.read(|t| catalog::all_of(t, CLASS_GENERIC_SERVICE, limit))),
            Self::DeleteService { class_name, id, release_relationships } => {
                let removed = db.write(|t| {
                    catalog::delete_member(t, CLASS_GENERIC_SERVICE, &class_name, &id, release_relationships)
                })?;
                forget_removed(attachments, ctx, &removed).await;
                reply(())
            },
            Self::RelateObjectToService { object_class_name, object_id, service_class_name, service_id } => {
                let service = ObjectKey::new(service_class_name, service_id);
                let objects = [ObjectKey::new(object_class_name, object_id)];
                let related = db.write(|t| customers::relate_to_service(t, &service, &objects))?;
                record_links(ctx, ActivityType::CreateRelationship, &service, &related, REL_USES);
                reply(())
            },
            Self::RelateObjectsToService { objects, service_class_name, service_id } => {
                let service = ObjectKey::new(service_class_name, service_id);
                let related = db.write(|t| customers::relate_to_service(t, &service, &objects))?;
                record_links(ctx, ActivityType::CreateRelationship, &service, &related, REL_USES);
                reply(())
            },
            Self::ReleaseObjectFromService { service_class_name, service_id, object_id } => {
                let service = ObjectKey::new(service_class_name, service_id);
                db.write(|t| customers::release_from_service(t, &service, &object_id))?;
                ctx.record(ActivityType::ReleaseRelationship, Some(&service), format!("{REL_USES} -> {object_id}"));
                reply(())
            },
            Self::GetObjectsRelatedToService { service_class_name, service_id } => {
                let service = ObjectKey::new(service_class_name, service_id);
                reply(db.read(|t| customers::objects_of_service(t, &service))?)
            },
            Self::GetServicesForObject { class_name, id } => {
                let object = ObjectKey::new(class_name, id);
                reply(db.read(|t| customers::services_of_object(t, &object))?)
            },
            Self::CreateContact { class_name, properties, customer_class_name, customer_id } => {
                let customer = ObjectKey::new(customer_class_name, customer_id);
                let id = db.write(|t| contacts::create_contact(t, &class_name, &properties, &customer))?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("{REL_CONTACTS} of {customer}"),
                );
                reply(id)
            },
            Self::UpdateContact { class_name, id, properties } => {
                let changed = db.write(|t| contacts::update_contact(t, &class_name, &id, &properties))?;
                ctx.record(ActivityType::UpdateInventoryObject, Some(&ObjectKey::new(class_name, id)), changed);
                reply(())
            },
            Self::DeleteContact { class_name, id } => {
                let files = db.write(|t| contacts::delete_contact(t, &class_name, &id))?;
                kw_business::discard_attachments(attachments, &files).await;
                ctx.record(ActivityType::DeleteInventoryObject, Some(&ObjectKey::new(class_name, id)), "");
                reply(())
            },
            Self::GetContact { class_name, id } => reply(db.read(|t| contacts::contact(t, &class_name, &id))?),
            Self::SearchForContacts { search_string, limit } => {
                reply(db.read(|t| contacts::search_contacts(t, &search_string, limit)))
            },
            Self::GetContactsForCustomer { customer_class_name, customer_id } => {
                let customer = ObjectKey::new(customer_class_name, customer_id);
                reply(db.read(|t| contacts::contacts_for_customer(t, &customer))?)
            },
            Self::GetAffectedServices { resource_type, resource_definition } => {
                reply(db.read(|t| impact::affected_services(t, resource_type, &resource_definition))?)
            },
        }
    }
}
