//! Web service operations of the services slice. Each module carries its own privilege.

mod contracts;
mod projects;
mod services;
mod warehouses;

pub use contracts::ContractsCall;
pub use projects::ProjectsCall;
pub use services::ServicesCall;
pub use warehouses::WarehousesCall;

use kw_business::objects::Removed;
use kw_domain::model::ObjectKey;
use kw_domain::model::audit::ActivityType;
use kw_kernel::call::CallContext;
use kw_storage::NamespacedStorage;

/// Drops the attachment contents of removed objects and logs each removal.
async fn forget_removed(attachments: Option<&NamespacedStorage>, ctx: &CallContext, removed: &Removed) {
    kw_business::discard_attachments(attachments, &removed.files).await;
    for key in &removed.objects {
        ctx.record(ActivityType::DeleteInventoryObject, Some(key), "");
    }
}

fn record_links(ctx: &CallContext, activity: ActivityType, holder: &ObjectKey, others: &[ObjectKey], name: &str) {
    for other in others {
        ctx.record(activity, Some(holder), format!("{name} -> {other}"));
    }
}
