use kw_domain::model::sync::SyncProvider;
use kw_kernel::error::InventoryError;

/// `(id, display name)` of every provider a group may be bound to.
pub const PROVIDERS: &[(&str, &str)] = &[
    ("ReferenceSnmpSyncProvider", "Physical / Virtual Interfaces"),
    ("SnmpCiscoVlansSyncProvider", "VLANs"),
    ("BridgeDomainSyncProvider", "Bridge Domains"),
    ("MplsSyncProvider", "MPLS links and VCids"),
    ("IPAddressesSyncProvider", "IP Addresses"),
];

#[must_use]
pub fn providers() -> Vec<SyncProvider> {
    PROVIDERS
        .iter()
        .map(|(id, display_name)| SyncProvider { id: (*id).to_owned(), display_name: (*display_name).to_owned() })
        .collect()
}

/// Accepts an empty provider, meaning "not bound yet".
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for unknown providers.
pub fn check(provider: &str) -> Result<(), InventoryError> {
    if provider.is_empty() || PROVIDERS.iter().any(|(id, _)| *id == provider) {
        Ok(())
    } else {
        Err(InventoryError::invalid(format!("Unknown synchronization provider {provider}")))
    }
}
