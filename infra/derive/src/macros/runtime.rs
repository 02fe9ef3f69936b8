use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Error, Expr, ExprLit, ItemFn, Lit, Meta, ReturnType, Token, Type};

/// Arguments of `#[kw_runtime::main(...)]`: an optional profile followed by overrides.
#[derive(Debug, Default, PartialEq, Eq)]
struct MainArgs {
    profile: Option<String>,
    workers: Option<usize>,
    thread_name: Option<String>,
}

/// Expands the `#[kw_runtime::main]` attribute macro.
#[must_use]
pub fn expand_main(args: TokenStream, input: ItemFn) -> TokenStream {
    if input.sig.asyncness.is_none() {
        return Error::new_spanned(
            &input.sig.ident,
            "The #[kw_runtime::main] attribute can only be used on async functions",
        )
        .to_compile_error();
    }
    if !returns_result(&input.sig.output) {
        return Error::new_spanned(
            &input.sig.output,
            "The #[kw_runtime::main] attribute requires a Result return type",
        )
        .to_compile_error();
    }

    let args = match parse_args(args) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error(),
    };
    let profile = match profile_call(args.profile.as_deref()) {
        Some(call) => call,
        None => {
            return Error::new(
                proc_macro2::Span::call_site(),
                "Unknown runtime profile. Use: high_performance, memory_efficient, or default",
            )
            .to_compile_error();
        },
    };
    let workers = args.workers.map(|n| quote! { config.worker_threads = #n; });
    let thread_name = args.thread_name.map(|name| quote! { config.thread_name = #name.to_owned(); });
    let mutability = (workers.is_some() || thread_name.is_some()).then(|| quote! { mut });

    let name = &input.sig.ident;
    let body = &input.block;
    let vis = &input.vis;
    let attrs = &input.attrs;
    let output = &input.sig.output;

    quote! {
        #(#attrs)*
        #vis fn #name() #output {
            let #mutability config = #profile;
            #workers
            #thread_name
            let rt = ::kw_runtime::build_runtime_with_config(&config)?;
            rt.block_on(async { #body })
        }
    }
}

fn parse_args(args: TokenStream) -> syn::Result<MainArgs> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    let mut parsed = MainArgs::default();
    for meta in metas {
        match meta {
            Meta::Path(path) if parsed.profile.is_none() => {
                let ident = path.get_ident().ok_or_else(|| Error::new_spanned(&path, "Expected a profile name"))?;
                parsed.profile = Some(ident.to_string());
            },
            Meta::NameValue(nv) if nv.path.is_ident("workers") => {
                let Expr::Lit(ExprLit { lit: Lit::Int(n), .. }) = &nv.value else {
                    return Err(Error::new_spanned(&nv.value, "workers expects an integer"));
                };
                let n: usize = n.base10_parse()?;
                if n == 0 {
                    return Err(Error::new_spanned(&nv.value, "workers must be at least 1"));
                }
                parsed.workers = Some(n);
            },
            Meta::NameValue(nv) if nv.path.is_ident("thread_name") => {
                let Expr::Lit(ExprLit { lit: Lit::Str(name), .. }) = &nv.value else {
                    return Err(Error::new_spanned(&nv.value, "thread_name expects a string"));
                };
                parsed.thread_name = Some(name.value());
            },
            other => return Err(Error::new_spanned(other, "Expected a profile, workers = N or thread_name = \"..\"")),
        }
    }
    Ok(parsed)
}

fn profile_call(profile: Option<&str>) -> Option<TokenStream> {
    match profile.unwrap_or("default") {
        "high_performance" => Some(quote! { ::kw_runtime::RuntimeConfig::high_performance() }),
        "memory_efficient" => Some(quote! { ::kw_runtime::RuntimeConfig::memory_efficient() }),
        "default" => Some(quote! { ::kw_runtime::RuntimeConfig::default() }),
        _ => None,
    }
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(path) = &**ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|seg| seg.ident == "Result")
}
