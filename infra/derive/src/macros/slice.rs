use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::{ItemStruct, LitStr, Meta};

pub fn expand_slice(args: TokenStream, input: ItemStruct) -> TokenStream {
    let wrapper_ident = &input.ident;
    let vis = &input.vis;
    let fields = &input.fields;
    let attrs = &input.attrs;

    let slice_name = match parse_slice_name(args) {
        Ok(Some(name)) => name,
        Ok(None) => LitStr::new(&wrapper_ident.to_string().to_lowercase(), wrapper_ident.span()),
        Err(err) => return err,
    };

    let inner_ident = format_ident!("{wrapper_ident}Inner");

    quote! {
        #(#attrs)*
        #[derive(Debug)]
        #vis struct #inner_ident #fields

        #[derive(Debug, Clone)]
        #vis struct #wrapper_ident {
            inner: std::sync::Arc<#inner_ident>,
        }

        impl #wrapper_ident {
            /// Registry name of this slice.
            pub const NAME: &'static str = #slice_name;

            pub fn new(inner: #inner_ident) -> Self {
                Self {
                    inner: std::sync::Arc::new(inner),
                }
            }
        }

        impl std::ops::Deref for #wrapper_ident {
            type Target = #inner_ident;
            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl ::kw_kernel::domain::registry::FeatureSlice for #wrapper_ident {
            fn name(&self) -> &'static str {
                Self::NAME
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
    }
}

fn parse_slice_name(args: TokenStream) -> Result<Option<LitStr>, TokenStream> {
    if args.is_empty() {
        return Ok(None);
    }

    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let metas = parser.parse2(args).map_err(|err| err.to_compile_error())?;

    let mut name = None;
    for meta in metas {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(meta, "Expected `name = \"...\"`")
                .to_compile_error());
        };
        if !name_value.path.is_ident("name") {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "Unsupported argument; expected `name`",
            )
            .to_compile_error());
        }
        let syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(lit), .. }) = &name_value.value
        else {
            return Err(syn::Error::new_spanned(&name_value.value, "name must be a string literal")
                .to_compile_error());
        };
        if lit.value().trim().is_empty() {
            return Err(syn::Error::new_spanned(lit, "name cannot be empty").to_compile_error());
        }
        name = Some(lit.clone());
    }

    Ok(name)
}
