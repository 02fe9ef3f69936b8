#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the inventory service crates.
//! They remove the boilerplate around error enums, feature slices, API data transfer
//! objects, documented handlers and the runtime entry point.
//!
//! ## Usage
//! Every crate in the workspace pulls this crate through the workspace dependency table:
//! ```toml
//! [dependencies]
//! kw-derive.workspace = true
//! ```
//!
//! Examples below are `ignore`d because proc-macro crates cannot use their own macros.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the tuned Tokio runtime.
///
/// Turns an `async fn main` into a plain `fn main` that builds the runtime described by
/// the selected profile and blocks on the original body.
///
/// # Arguments
///
/// * `high_performance` - Server profile with larger stacks and long keep-alive.
/// * `memory_efficient` - Half the workers and smaller stacks, for tools and tests.
/// * `default` - Worker count detected from available parallelism.
/// * `workers = N` - Fixed worker count, overriding the profile and the environment.
/// * `thread_name = "..."` - Prefix of the worker thread names.
///
/// # Examples
///
/// ```rust,ignore
/// #[kw_runtime::main(high_performance)]
/// async fn main() -> anyhow::Result<()> {
/// # Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Defines a request or response model of the web service.
///
/// Accepts both structs and enums so that tagged operation enums share the same serde
/// policy as plain records.
///
/// # Injected Behaviors
///
/// * **Derives**: `Debug`, `Serialize` and `Deserialize` when missing.
/// * **`OpenAPI`**: `utoipa::ToSchema` under the `server` feature.
/// * **Serde Policy**:
///     * `rename_all = "camelCase"` unless overridden.
///     * `deny_unknown_fields` unless disabled.
///
/// # Example
///
/// ```rust,ignore
/// use kw_derive::api_model;
///
/// #[api_model]
/// pub struct CreateSessionRequest {
///     pub user_name: String,
///     pub password: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Bridges an axum handler with its `OpenAPI` description.
///
/// Takes the usual `utoipa::path` arguments (`get`, `post`, `path = "..."`,
/// `responses(...)`, `tag = "..."`) and only emits the documentation when the `server`
/// feature is enabled.
///
/// # Example
///
/// ```rust,ignore
/// use kw_derive::api_handler;
///
/// #[api_handler(
///     get,
///     path = "/health",
///     responses((status = OK, body = HealthResponse)),
///     tag = "System"
/// )]
/// pub async fn health_handler() -> Json<HealthResponse> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Defines a crate error enum wired into the workspace error conventions.
///
/// # Features
///
/// * **Automatic Derives**: `Debug` and `thiserror::Error`.
/// * **Context Support**: a companion `<Name>Ext` trait adding `.context()` to results whose
///   error converts into this enum.
/// * **Standard Conversions**: `From<Source>` for variants holding a `source` field.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant exists.
/// * **Fault Constructors**: `#[fault(name)]` on a variant holding only `message` and
///   `context` emits `fn name(message) -> Self`.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Variants that carry context declare `context: Option<Cow<'static, str>>`.
/// 3. Variants wrapping another error name the field `source` (or mark it `#[source]`).
/// 4. Tuple and unit variants are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use kw_derive::kw_error;
/// use std::borrow::Cow;
///
/// #[kw_error]
/// pub enum SnapshotError {
///     #[fault(malformed)]
///     #[error("Malformed snapshot{}: {message}", format_context(.context))]
///     Malformed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Codec failure{}: {source}", format_context(.context))]
///     Codec { source: postcard::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn decode(bytes: &[u8]) -> Result<Tables, SnapshotError> {
///     postcard::from_bytes(bytes).context("Decoding inventory snapshot")
/// }
/// ```
#[proc_macro_attribute]
pub fn kw_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Defines a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` is a cheap `Arc` handle that
/// derefs to it and implements `FeatureSlice`, so the kernel registry can store it.
///
/// # Arguments
///
/// * `name = "..."` - registry name reported by `FeatureSlice::name`. Defaults to the
///   lowercase struct name.
///
/// # Example
/// ```rust,ignore
/// #[kw_derive::kw_slice(name = "metadata")]
/// pub struct Metadata {
///     database: Database,
/// }
///
/// fn init(database: &Database) -> Metadata {
///     Metadata::new(MetadataInner { database: database.clone() })
/// }
/// ```
#[proc_macro_attribute]
pub fn kw_slice(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(attr.into(), input).into()
}
