//! Attribute inspection shared by the macros.

use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::quote;
use syn::Attribute;

pub fn has(attributes: &[Attribute], name: &str) -> bool {
    attributes.iter().any(|a| a.path().is_ident(name))
}

/// Last path segment of every trait in the item's `#[derive(..)]` lists.
pub fn derived(attributes: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();
    for attribute in attributes.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attribute.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                traits.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }
    traits
}

/// A `#[derive(..)]` with each `(name, path)` the item does not derive yet, or nothing.
pub fn missing_derives(attributes: &[Attribute], wanted: &[(&str, TokenStream)]) -> TokenStream {
    let present = derived(attributes);
    let missing: Vec<&TokenStream> =
        wanted.iter().filter(|(name, _)| !present.contains(*name)).map(|(_, path)| path).collect();
    if missing.is_empty() {
        return TokenStream::new();
    }
    quote! { #[derive(#(#missing),*)] }
}
