//! `#[method]` expansion
//!
//! The annotated function is emitted unchanged. Next to it the macro adds a
//! `<fn>_descriptor()` constructor whose parameter types are the function's
//! argument types, in order, and whose return type is the function's return
//! type with one `Result` layer peeled off.
//!
//! Input:
//! ```ignore
//! #[method(name = "textDocument/hover")]
//! async fn hover(position: Position) -> Result<Hover, Error> { ... }
//! ```
//!
//! Generated output:
//! ```ignore
//! async fn hover(position: Position) -> Result<Hover, Error> { ... }
//!
//! fn hover_descriptor() -> ::typerpc::Result<::typerpc::MethodDescriptor> {
//!     ::typerpc::MethodDescriptor::request(
//!         "textDocument/hover",
//!         ::typerpc::TypeHandle::of::<Hover>(),
//!         vec![::typerpc::TypeHandle::of::<Position>()],
//!     )
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, FnArg, GenericArgument, ItemFn, LitStr, PathArguments, ReturnType, Type,
};

/// Arguments accepted inside `#[method(...)]`
#[derive(Default)]
struct MethodArgs {
    name: Option<LitStr>,
    notification: bool,
}

pub fn method_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = MethodArgs::default();
    let arg_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            if args.name.is_some() {
                return Err(meta.error("duplicate `name` argument"));
            }
            args.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("notification") {
            args.notification = true;
            Ok(())
        } else {
            Err(meta.error("unsupported argument; expected `name = \"...\"` or `notification`"))
        }
    });
    parse_macro_input!(attr with arg_parser);

    let input_fn = parse_macro_input!(item as ItemFn);

    expand(args, input_fn)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(args: MethodArgs, input_fn: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &input_fn.sig;
    let vis = &input_fn.vis;

    let name = match &args.name {
        Some(lit) if lit.value().is_empty() => {
            return Err(syn::Error::new(lit.span(), "method name must not be empty"));
        }
        Some(lit) => lit.value(),
        None => sig.ident.to_string(),
    };

    let mut parameter_types = Vec::with_capacity(sig.inputs.len());
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[method] functions cannot take `self`",
                ));
            }
            FnArg::Typed(pat_type) => parameter_types.push(&*pat_type.ty),
        }
    }

    let descriptor_fn = format_ident!("{}_descriptor", sig.ident);
    let doc = format!(" Descriptor of the `{}` JSON-RPC method.", name);

    let body = if args.notification {
        if let ReturnType::Type(_, ty) = &sig.output {
            return Err(syn::Error::new_spanned(
                ty,
                "a notification method cannot declare a return type",
            ));
        }
        quote! {
            ::typerpc::MethodDescriptor::notification(
                #name,
                vec![#(::typerpc::TypeHandle::of::<#parameter_types>()),*],
            )
        }
    } else {
        let return_type = declared_return_type(&sig.output);
        quote! {
            ::typerpc::MethodDescriptor::request(
                #name,
                ::typerpc::TypeHandle::of::<#return_type>(),
                vec![#(::typerpc::TypeHandle::of::<#parameter_types>()),*],
            )
        }
    };

    Ok(quote! {
        #input_fn

        #[doc = #doc]
        #vis fn #descriptor_fn() -> ::typerpc::Result<::typerpc::MethodDescriptor> {
            #body
        }
    })
}

/// The value type a caller receives: `T` for `Result<T, _>`, `()` when no
/// return type is written
fn declared_return_type(output: &ReturnType) -> TokenStream2 {
    match output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => match result_ok_type(ty) {
            Some(ok) => quote! { #ok },
            None => quote! { #ty },
        },
    }
}

fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(generics) = &segment.arguments else {
        return None;
    };
    generics.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}
