use axum::extract::FromRef;
use fxhash::FxHashMap;
use kw_database::Database;
use kw_domain::config::ApiConfig;
use kw_domain::registry::{FeatureSlice, InitializedSlice};
use kw_event_bus::EventBus;
use kw_storage::Storage;
use std::any::TypeId;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[kw_derive::kw_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("State missing feature slice{}: {message}", format_context(.context))]
    MissingSlice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub database: Database,
    pub events: EventBus,
    /// Root of the snapshot and attachment files. `None` for a memory-only inventory.
    pub storage: Option<Storage>,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

/// Shared state of the HTTP layer: configuration, the inventory and every feature slice.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    #[must_use]
    pub fn get_slice<T: FeatureSlice>(&self) -> Option<&T> {
        self.inner.slices.get(&TypeId::of::<T>()).and_then(InitializedSlice::state::<T>)
    }

    /// # Errors
    /// [`ApiStateError::MissingSlice`] when no slice of type `T` was registered.
    pub fn try_get_slice<T: FeatureSlice>(&self) -> Result<&T, ApiStateError> {
        self.get_slice::<T>().ok_or_else(|| ApiStateError::MissingSlice {
            message: std::any::type_name::<T>().into(),
            context: None,
        })
    }

    /// Registry names of the registered slices.
    pub fn slice_names(&self) -> impl Iterator<Item = &'static str> + use<'_> {
        self.inner.slices.values().map(InitializedSlice::name)
    }

    /// Whether committed changes survive a restart.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.inner.storage.is_some()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for Database {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.database.clone()
    }
}

impl FromRef<ApiState> for EventBus {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.events.clone()
    }
}

/// Collects the parts of an [`ApiState`]. A slice type can be registered once.
#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    database: Option<Database>,
    events: Option<EventBus>,
    storage: Option<Storage>,
    slices: FxHashMap<TypeId, InitializedSlice>,
    duplicates: Vec<&'static str>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn db(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    #[must_use]
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn register_slice(mut self, slice: InitializedSlice) -> Self {
        let name = slice.name();
        if self.slices.insert(slice.id, slice).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    #[must_use]
    pub fn register_slices<I>(self, slices: I) -> Self
    where
        I: IntoIterator<Item = InitializedSlice>,
    {
        slices.into_iter().fold(self, Self::register_slice)
    }

    /// # Errors
    /// [`ApiStateError::Validation`] when the configuration or the database is missing, or
    /// when a slice was registered twice.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "ApiConfig not provided".into(),
            context: None,
        })?;
        let database = self.database.ok_or_else(|| ApiStateError::Validation {
            message: "Database not provided".into(),
            context: None,
        })?;
        if !self.duplicates.is_empty() {
            return Err(ApiStateError::Validation {
                message: format!("Slices registered twice: {}", self.duplicates.join(", ")).into(),
                context: None,
            });
        }
        let events = self.events.unwrap_or_default();

        Ok(ApiState {
            inner: Arc::new(ApiStateInner { config, database, events, storage: self.storage, slices: self.slices }),
        })
    }
}
