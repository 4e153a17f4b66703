//! Procedural macros for toolforge provider definitions.

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{ItemFn, LitStr, Path, Token, parse_macro_input};

struct ProviderArgs {
    id: LitStr,
    krate: Option<Path>,
}

impl Parse for ProviderArgs {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let id: LitStr = input.parse()?;
        let mut krate = None;

        if input.parse::<Option<Token![,]>>()?.is_some() && !input.is_empty() {
            input.parse::<Token![crate]>()?;
            input.parse::<Token![=]>()?;
            krate = Some(input.parse::<Path>()?);
            input.parse::<Option<Token![,]>>()?;
        }

        if !input.is_empty() {
            return Err(input.error("expected `\"provider.id\"` optionally followed by `crate = path`"));
        }
        Ok(Self { id, krate })
    }
}

/// Registers a provider factory under the given id.
///
/// The annotated function must have the signature
/// `fn(&ProviderContext<'_>) -> ToolResult<Box<dyn Tool>>`. It is kept as
/// written and submitted to the provider inventory, where archive manifests
/// can name it:
///
/// ```ignore
/// #[toolforge_tools::provider("codec.base64")]
/// fn base64(ctx: &ProviderContext<'_>) -> ToolResult<Box<dyn Tool>> {
///     Ok(Box::new(Base64Tool::new(ctx.config())))
/// }
/// ```
///
/// When `toolforge_tools` is reached through another crate, name the path:
/// `#[provider("codec.base64", crate = toolforge::tools)]`.
#[proc_macro_attribute]
pub fn provider(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ProviderArgs);
    let function = parse_macro_input!(item as ItemFn);

    if args.id.value().trim().is_empty() {
        return syn::Error::new(args.id.span(), "provider id cannot be empty")
            .to_compile_error()
            .into();
    }

    if function.sig.inputs.len() != 1 {
        return syn::Error::new_spanned(
            &function.sig,
            "provider factories take exactly one `&ProviderContext` argument",
        )
        .to_compile_error()
        .into();
    }

    let id = &args.id;
    let name = &function.sig.ident;
    let krate = args
        .krate
        .map_or_else(|| quote!(::toolforge_tools), |path| quote!(#path));
    let expanded = quote! {
        #function

        #krate::inventory::submit! {
            #krate::ProviderRegistration::new(#id, #name)
        }
    };

    expanded.into()
}
