use crate::macros::attrs;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Type};

/// What the generated code needs to know about one error variant.
struct ErrorVariant {
    ident: Ident,
    /// The wrapped error, as `(field, type)`.
    source: Option<(Ident, Type)>,
    context: bool,
    /// `#[fault(name)]`: emit `fn name(message) -> Self` for a variant holding only a
    /// `message` and a `context`.
    constructor: Option<Ident>,
    cfg: Vec<Attribute>,
}

impl ErrorVariant {
    fn read(variant: &mut syn::Variant) -> syn::Result<Self> {
        let constructor = take_fault_attr(&mut variant.attrs)?;
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "kw_error variants need named fields so `context` and `source` can be found",
            ));
        };

        let mut source = None;
        let mut context = false;
        let mut message = false;
        for field in &fields.named {
            let Some(name) = field.ident.clone() else { continue };
            if name == "context" {
                if !is_context_type(&field.ty) {
                    return Err(syn::Error::new_spanned(&field.ty, "`context` must be Option<Cow<'static, str>>"));
                }
                context = true;
            } else if name == "message" {
                message = true;
            }
            if name == "source" || attrs::has(&field.attrs, "source") || attrs::has(&field.attrs, "from") {
                source = Some((name, field.ty.clone()));
            }
        }

        if source.is_some() && !context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "kw_error variants wrapping a source also need `context: Option<Cow<'static, str>>`",
            ));
        }
        if let Some(constructor) = &constructor
            && !(message && context && fields.named.len() == 2)
        {
            return Err(syn::Error::new_spanned(
                constructor,
                "#[fault] needs a variant with exactly `message` and `context` fields",
            ));
        }

        let cfg = variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).cloned().collect();
        Ok(Self { ident: variant.ident.clone(), source, context, constructor, cfg })
    }
}

fn take_fault_attr(attributes: &mut Vec<Attribute>) -> syn::Result<Option<Ident>> {
    let Some(position) = attributes.iter().position(|a| a.path().is_ident("fault")) else {
        return Ok(None);
    };
    let attribute = attributes.remove(position);
    attribute.parse_args::<Ident>().map(Some)
}

/// `Option<Cow<'static, str>>`, with or without paths on either type.
fn is_context_type(ty: &Type) -> bool {
    let written = quote!(#ty).to_string().replace(' ', "");
    let unqualified = written.trim_start_matches("::").trim_start_matches("std::option::");
    unqualified.starts_with("Option<") && unqualified.ends_with("Cow<'static,str>>")
}

pub fn expand_derive(mut input: DeriveInput) -> TokenStream {
    let Data::Enum(data) = &mut input.data else {
        return quote! { compile_error!("kw_error can only be derived for enums"); };
    };
    let variants = match data.variants.iter_mut().map(ErrorVariant::read).collect::<syn::Result<Vec<_>>>() {
        Ok(variants) => variants,
        Err(error) => return error.to_compile_error(),
    };

    let name = &input.ident;
    let ext = format_ident!("{}Ext", name);
    let derives = attrs::missing_derives(&input.attrs, &[("Debug", quote!(Debug)), ("Error", quote!(::thiserror::Error))]);

    let context_ext = context_ext(name, &ext, &variants);
    let conversions = variants.iter().map(|v| source_conversion(name, &ext, v));
    let internal = internal_conversions(name, &variants);
    let accessors = accessors(name, &variants);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #context_ext
        #(#conversions)*
        #internal
        #accessors

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            match context {
                Some(context) => std::borrow::Cow::Owned(format!(" ({context})")),
                None => std::borrow::Cow::Borrowed(""),
            }
        }
    }
}

/// `<Name>Ext::context` on results already carrying this error.
fn context_ext(name: &Ident, ext: &Ident, variants: &[ErrorVariant]) -> TokenStream {
    let arms = variants.iter().filter(|v| v.context).map(|v| {
        let (cfg, ident) = (&v.cfg, &v.ident);
        quote! { #(#cfg)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
    });
    quote! {
        pub trait #ext<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for Result<T, #name> {
            #[inline]
            #[allow(unreachable_patterns)]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut error| {
                    match &mut error {
                        #(#arms)*
                        _ => {},
                    }
                    error
                })
            }
        }
    }
}

/// `From<Source>` plus `.context()` on results of the wrapped error.
fn source_conversion(name: &Ident, ext: &Ident, variant: &ErrorVariant) -> TokenStream {
    let Some((field, ty)) = &variant.source else {
        return TokenStream::new();
    };
    if variant.ident == "Internal" {
        return TokenStream::new();
    }
    let (cfg, ident) = (&variant.cfg, &variant.ident);
    quote! {
        #(#cfg)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self {
                Self::#ident { #field, context: None }
            }
        }

        #(#cfg)*
        impl<T> #ext<T> for Result<T, #ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    }
}

/// Plain strings become the `Internal` variant, when there is one.
fn internal_conversions(name: &Ident, variants: &[ErrorVariant]) -> TokenStream {
    let Some(internal) = variants.iter().find(|v| v.ident == "Internal") else {
        return TokenStream::new();
    };
    let cfg = &internal.cfg;
    quote! {
        #(#cfg)*
        impl From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal { message: std::borrow::Cow::Borrowed(message), context: None }
            }
        }

        #(#cfg)*
        impl From<String> for #name {
            #[inline]
            fn from(message: String) -> Self {
                Self::Internal { message: std::borrow::Cow::Owned(message), context: None }
            }
        }
    }
}

/// `attached_context()` and one constructor per `#[fault(..)]` variant.
fn accessors(name: &Ident, variants: &[ErrorVariant]) -> TokenStream {
    let context_arms = variants.iter().filter(|v| v.context).map(|v| {
        let (cfg, ident) = (&v.cfg, &v.ident);
        quote! { #(#cfg)* Self::#ident { context, .. } => context.as_deref(), }
    });
    let constructors = variants.iter().filter_map(|v| {
        let constructor = v.constructor.as_ref()?;
        let (cfg, ident) = (&v.cfg, &v.ident);
        let doc = format!("A [`{name}::{ident}`] without context.");
        Some(quote! {
            #(#cfg)*
            #[doc = #doc]
            pub fn #constructor(message: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                Self::#ident { message: message.into(), context: None }
            }
        })
    });

    quote! {
        #[automatically_derived]
        impl #name {
            #(#constructors)*

            /// The note attached by `.context()`, if any.
            #[must_use]
            #[allow(unreachable_patterns)]
            pub fn attached_context(&self) -> Option<&str> {
                match self {
                    #(#context_arms)*
                    _ => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> String {
        expand_derive(input).to_string()
    }

    #[test]
    fn only_enums_are_accepted() {
        assert!(expand(parse_quote! { pub struct Snapshot { message: String } }).contains("compile_error"));
    }

    #[test]
    fn a_source_needs_a_context() {
        let out = expand(parse_quote! {
            pub enum SnapshotError {
                #[error("io")]
                Io { source: std::io::Error },
            }
        });
        assert!(out.contains("also need `context"));
    }

    #[test]
    fn faults_become_constructors_and_leave_no_attribute_behind() {
        let out = expand(parse_quote! {
            pub enum InventoryError {
                #[fault(not_found)]
                #[error("not found")]
                NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
                #[error("io")]
                Io { source: std::io::Error, context: Option<std::borrow::Cow<'static, str>> },
                #[error("internal")]
                Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
            }
        });
        assert!(out.contains("pub fn not_found"));
        assert!(!out.contains("# [fault"));
        assert!(out.contains("InventoryErrorExt"));
        assert!(out.contains("impl From < std :: io :: Error > for InventoryError"));
        assert!(out.contains("'static str"));
    }

    #[test]
    fn faults_need_a_plain_message_variant() {
        let out = expand(parse_quote! {
            pub enum ClassError {
                #[fault(unknown)]
                #[error("unknown {name}")]
                Unknown { name: String, context: Option<Cow<'static, str>> },
            }
        });
        assert!(out.contains("exactly `message` and `context`"));
    }
}
