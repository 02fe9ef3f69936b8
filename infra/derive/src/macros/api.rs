use crate::macros::attrs;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::{Attribute, Data, DeriveInput, ItemFn, LitBool, LitStr};

/// `#[api_model(..)]` arguments. Both default to the web service wire policy.
struct ModelPolicy {
    rename_all: LitStr,
    deny_unknown_fields: bool,
}

impl ModelPolicy {
    fn parse(args: TokenStream) -> syn::Result<Self> {
        let mut rename_all: Option<LitStr> = None;
        let mut deny_unknown_fields: Option<bool> = None;
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("rename_all") {
                if rename_all.is_some() {
                    return Err(meta.error("rename_all is given twice"));
                }
                rename_all = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("deny_unknown_fields") {
                if deny_unknown_fields.is_some() {
                    return Err(meta.error("deny_unknown_fields is given twice"));
                }
                deny_unknown_fields = Some(meta.value()?.parse::<LitBool>()?.value);
            } else {
                return Err(meta.error("expected rename_all = \"..\" or deny_unknown_fields = bool"));
            }
            Ok(())
        });
        parser.parse2(args)?;
        Ok(Self {
            rename_all: rename_all.unwrap_or_else(|| LitStr::new("camelCase", Span::call_site())),
            deny_unknown_fields: deny_unknown_fields.unwrap_or(true),
        })
    }
}

/// What the item already asks of serde.
#[derive(Default)]
struct SerdeAttrs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: bool,
}

impl SerdeAttrs {
    fn read(attributes: &[Attribute]) -> syn::Result<Self> {
        let mut found = Self::default();
        for attribute in attributes.iter().filter(|a| a.path().is_ident("serde")) {
            attribute.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    found.rename_all = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("deny_unknown_fields") {
                    found.deny_unknown_fields = true;
                } else if meta.input.peek(syn::Token![=]) {
                    meta.value()?.parse::<syn::Expr>()?;
                } else if meta.input.peek(syn::token::Paren) {
                    meta.parse_nested_meta(|nested| {
                        if nested.input.peek(syn::Token![=]) {
                            nested.value()?.parse::<syn::Expr>()?;
                        }
                        Ok(())
                    })?;
                }
                Ok(())
            })?;
        }
        Ok(found)
    }
}

/// Expands `#[api_model]`: the serde derives, `ToSchema` on server builds, and the
/// camelCase, strict-field wire policy unless the item or the arguments say otherwise.
pub fn expand_api_model(args: TokenStream, input: DeriveInput) -> TokenStream {
    match api_model(args, &input) {
        Ok(attributes) => quote! {
            #attributes
            #input
        },
        Err(error) => error.to_compile_error(),
    }
}

fn api_model(args: TokenStream, input: &DeriveInput) -> syn::Result<TokenStream> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new_spanned(&input.ident, "api_model supports structs and enums only"));
    }
    let policy = ModelPolicy::parse(args)?;
    let serde = SerdeAttrs::read(&input.attrs)?;

    let derives = attrs::missing_derives(
        &input.attrs,
        &[
            ("Debug", quote!(Debug)),
            ("Serialize", quote!(::serde::Serialize)),
            ("Deserialize", quote!(::serde::Deserialize)),
        ],
    );
    let schema = if attrs::derived(&input.attrs).contains("ToSchema") {
        TokenStream::new()
    } else {
        quote! { #[cfg_attr(feature = "server", derive(::utoipa::ToSchema))] }
    };

    let rename = match &serde.rename_all {
        None => {
            let rename_all = &policy.rename_all;
            quote! { #[serde(rename_all = #rename_all)] }
        },
        Some(existing) if existing.value() == policy.rename_all.value() => TokenStream::new(),
        Some(existing) => {
            return Err(syn::Error::new_spanned(
                existing,
                "serde rename_all disagrees with api_model; drop it or pass the same rename_all",
            ));
        },
    };
    let strict = match (serde.deny_unknown_fields, policy.deny_unknown_fields) {
        (false, true) => quote! { #[serde(deny_unknown_fields)] },
        (true, false) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "serde already denies unknown fields; remove that before passing deny_unknown_fields = false",
            ));
        },
        _ => TokenStream::new(),
    };

    Ok(quote! {
        #derives
        #schema
        #rename
        #strict
    })
}

/// Expands `#[api_handler(..)]`: the arguments go to `utoipa::path` on server builds only,
/// so crates without the server feature never see `utoipa`.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;
    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[cfg_attr(feature = "server", ::utoipa::path(#args))]
        #vis #sig #block
    }
}
