use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg, GenericArgument, Ident, ItemFn, Pat, PathArguments, ReturnType, Type,
};

use crate::crate_path::labthings_runtime_path;

/// How a non-Thing, non-input parameter of an `#[action]` fn gets its value
/// at invocation time.
enum Param {
    /// The whole dependency-injected context.
    Context(Ident),
    /// Just the invocation id (spec.md 4.2).
    Id(Ident),
    /// A logging-only handle into the invocation's log.
    Logger(Ident),
    /// A blob-registration-only handle.
    Blob(Ident),
    /// Direct access to another registered Thing, resolved the same way a
    /// `Slot<T>` is (the original's `DirectThingClient`). Carries the
    /// wrapped Thing's type so the descriptor constructor can add a
    /// matching `Weak<T>` parameter.
    ThingRef(Ident, Type),
    /// An ordinary field of the generated `<Name>Input` struct.
    Input(Ident, Type),
}

/// `#[labthings_macros::action]`, applied to a free async fn of the shape
///
/// ```ignore
/// async fn increment(thing: Arc<Counter>, amount: i64, ctx: InvocationContext) -> Result<i64, ActionError>
/// ```
///
/// Splits the parameter list into the owning Thing (the first parameter,
/// typed `Arc<T>`), dependency-injected parameters recognised by type name
/// (`InvocationContext`, `InvocationId`, `InvocationLogger`, `BlobContext`,
/// `ThingRef<T>`), and the remaining parameters, which become fields of a
/// generated `<Name>Input` struct (spec.md section 4.2: "action input
/// model"). Emits the original function unchanged, the generated input
/// struct, and a `<name>_descriptor(thing: Weak<T>, ...) ->
/// ActionDescriptor<T, Input, Out>` constructor function wiring them
/// together — one extra `Weak<T>` parameter per `ThingRef<T>` dependency,
/// in declaration order, resolved by the caller the same way the owning
/// Thing's own `Weak` is.
pub fn expand(item: ItemFn) -> syn::Result<TokenStream> {
    if item.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(&item.sig, "#[action] requires an async fn"));
    }

    let mut args = item.sig.inputs.iter();
    let thing_arg = args.next().ok_or_else(|| {
        syn::Error::new_spanned(&item.sig, "#[action] fn must take the owning Thing as its first parameter, e.g. `thing: Arc<Counter>`")
    })?;
    let (thing_pat_ident, thing_ty) = match thing_arg {
        FnArg::Typed(pat_type) => (pat_ident(&pat_type.pat)?, arc_inner_type(&pat_type.ty)?),
        FnArg::Receiver(_) => {
            return Err(syn::Error::new_spanned(thing_arg, "#[action] does not support `self` receivers; take `thing: Arc<T>` instead"))
        }
    };

    let mut params: Vec<Param> = Vec::new();

    for arg in args {
        let FnArg::Typed(pat_type) = arg else {
            return Err(syn::Error::new_spanned(arg, "#[action] does not support `self` receivers"));
        };
        let ident = pat_ident(&pat_type.pat)?;
        let ty = &pat_type.ty;
        if is_named(ty, "InvocationContext") {
            params.push(Param::Context(ident));
        } else if is_named(ty, "InvocationId") {
            params.push(Param::Id(ident));
        } else if is_named(ty, "InvocationLogger") {
            params.push(Param::Logger(ident));
        } else if is_named(ty, "BlobContext") {
            params.push(Param::Blob(ident));
        } else if let Some(inner) = thing_ref_inner_type(ty) {
            params.push(Param::ThingRef(ident, inner));
        } else {
            params.push(Param::Input(ident, (**ty).clone()));
        }
    }

    let ctx_pat_ident = params
        .iter()
        .find_map(|p| match p {
            Param::Context(ident) => Some(ident.clone()),
            _ => None,
        })
        .ok_or_else(|| syn::Error::new_spanned(&item.sig, "#[action] fn must take an `InvocationContext` parameter"))?;

    let out_ty = result_ok_type(&item.sig.output)?;

    let fn_name = &item.sig.ident;
    let input_struct_name = format_ident!("{}Input", to_pascal_case(&fn_name.to_string()));
    let descriptor_fn_name = format_ident!("{}_descriptor", fn_name);
    let runtime = labthings_runtime_path();

    let input_fields: Vec<(&Ident, &Type)> = params
        .iter()
        .filter_map(|p| match p {
            Param::Input(ident, ty) => Some((ident, ty)),
            _ => None,
        })
        .collect();
    let field_names: Vec<&Ident> = input_fields.iter().map(|(ident, _)| *ident).collect();
    let field_types: Vec<&Type> = input_fields.iter().map(|(_, ty)| *ty).collect();

    let input_struct = if input_fields.is_empty() {
        quote! {
            #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
            pub struct #input_struct_name {}
        }
    } else {
        quote! {
            #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
            pub struct #input_struct_name {
                #( pub #field_names: #field_types ),*
            }
        }
    };

    let destructure = quote! { let #input_struct_name { #( #field_names ),* } = __input; };

    let thing_refs: Vec<(&Ident, &Type)> = params
        .iter()
        .filter_map(|p| match p {
            Param::ThingRef(ident, ty) => Some((ident, ty)),
            _ => None,
        })
        .collect();
    let thing_ref_idents: Vec<&Ident> = thing_refs.iter().map(|(ident, _)| *ident).collect();
    let thing_ref_types: Vec<&Type> = thing_refs.iter().map(|(_, ty)| *ty).collect();

    let thing_ref_upgrades = quote! {
        #( let #thing_ref_idents = #thing_ref_idents
            .upgrade()
            .map(#runtime::slot::ThingRef::new)
            .ok_or_else(|| #runtime::error::ActionError::Failed(
                format!("dependency Thing for '{}' was dropped", stringify!(#thing_ref_idents))
            ))?; )*
    };

    let extractions = params.iter().filter_map(|p| match p {
        Param::Id(ident) => Some(quote! { let #ident = #ctx_pat_ident.invocation_id(); }),
        Param::Logger(ident) => Some(quote! { let #ident = #ctx_pat_ident.logger(); }),
        Param::Blob(ident) => Some(quote! { let #ident = #ctx_pat_ident.blob_context(); }),
        _ => None,
    });

    let call_args = params.iter().map(|p| match p {
        Param::Context(ident) | Param::Id(ident) | Param::Logger(ident) | Param::Blob(ident) => quote! { #ident },
        Param::ThingRef(ident, _) => quote! { #ident },
        Param::Input(ident, _) => quote! { #ident },
    });

    Ok(quote! {
        #item

        #input_struct

        pub fn #descriptor_fn_name(
            #thing_pat_ident: std::sync::Weak<#thing_ty>,
            #( #thing_ref_idents: std::sync::Weak<#thing_ref_types>, )*
        ) -> #runtime::action::ActionDescriptor<#thing_ty, #input_struct_name, #out_ty> {
            #runtime::action::ActionDescriptor::new(
                stringify!(#fn_name),
                #thing_pat_ident,
                move |thing_arc, __input: #input_struct_name, #ctx_pat_ident: #runtime::action::InvocationContext| {
                    #( let #thing_ref_idents = #thing_ref_idents.clone(); )*
                    async move {
                        #destructure
                        #thing_ref_upgrades
                        #( #extractions )*
                        #fn_name(thing_arc, #( #call_args, )*).await
                    }
                },
            )
        }
    })
}

fn pat_ident(pat: &Pat) -> syn::Result<Ident> {
    match pat {
        Pat::Ident(pat_ident) => Ok(pat_ident.ident.clone()),
        other => Err(syn::Error::new_spanned(other, "#[action] parameters must be simple identifiers")),
    }
}

fn arc_inner_type(ty: &Type) -> syn::Result<Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Arc" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return Ok(inner.clone());
                    }
                }
            }
        }
    }
    Err(syn::Error::new_spanned(ty, "#[action] fn's first parameter must be `Arc<T>` for the owning Thing type"))
}

fn is_named(ty: &Type, name: &str) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == name;
        }
    }
    false
}

/// Returns `X` if `ty` is `ThingRef<X>`, the direct-thing-client dependency
/// kind.
fn thing_ref_inner_type(ty: &Type) -> Option<Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "ThingRef" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return Some(inner.clone());
                    }
                }
            }
        }
    }
    None
}

fn result_ok_type(output: &ReturnType) -> syn::Result<Type> {
    let ReturnType::Type(_, ty) = output else {
        return Err(syn::Error::new_spanned(output, "#[action] fn must return Result<Out, ActionError>"));
    };
    if let Type::Path(type_path) = ty.as_ref() {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Result" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(ok_ty)) = args.args.first() {
                        return Ok(ok_ty.clone());
                    }
                }
            }
        }
    }
    Err(syn::Error::new_spanned(ty, "#[action] fn must return Result<Out, ActionError>"))
}

fn to_pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn simple_action_generates_input_struct_and_descriptor() {
        let item: ItemFn = parse_quote! {
            async fn increment(thing: std::sync::Arc<Counter>, amount: i64, ctx: InvocationContext) -> Result<i64, ActionError> {
                Ok(amount)
            }
        };
        let expanded = expand(item).unwrap().to_string();
        assert!(expanded.contains("struct IncrementInput"));
        assert!(expanded.contains("amount"));
        assert!(expanded.contains("fn increment_descriptor"));
    }

    #[test]
    fn action_with_no_extra_params_generates_empty_input_struct() {
        let item: ItemFn = parse_quote! {
            async fn reset(thing: std::sync::Arc<Counter>, ctx: InvocationContext) -> Result<(), ActionError> {
                Ok(())
            }
        };
        let expanded = expand(item).unwrap().to_string();
        assert!(expanded.contains("struct ResetInput"));
        assert!(expanded.contains("fn reset_descriptor"));
    }

    #[test]
    fn missing_context_parameter_is_rejected() {
        let item: ItemFn = parse_quote! {
            async fn increment(thing: std::sync::Arc<Counter>, amount: i64) -> Result<i64, ActionError> {
                Ok(amount)
            }
        };
        assert!(expand(item).is_err());
    }

    #[test]
    fn invocation_id_logger_and_blob_context_are_not_input_fields() {
        let item: ItemFn = parse_quote! {
            async fn snapshot(
                thing: std::sync::Arc<Camera>,
                gain: f64,
                id: InvocationId,
                log: InvocationLogger,
                blobs: BlobContext,
                ctx: InvocationContext,
            ) -> Result<BlobRef, ActionError> {
                Ok(output)
            }
        };
        let expanded = expand(item).unwrap().to_string();
        assert!(expanded.contains("struct SnapshotInput"));
        assert!(expanded.contains("gain"));
        assert!(!expanded.contains("struct SnapshotInput { pub id"));
        assert!(expanded.contains("invocation_id"));
        assert!(expanded.contains("logger"));
        assert!(expanded.contains("blob_context"));
    }

    #[test]
    fn thing_ref_adds_a_weak_parameter_to_the_descriptor_constructor() {
        let item: ItemFn = parse_quote! {
            async fn transfer(
                thing: std::sync::Arc<Pump>,
                target: ThingRef<Reservoir>,
                ctx: InvocationContext,
            ) -> Result<(), ActionError> {
                Ok(())
            }
        };
        let expanded = expand(item).unwrap().to_string();
        assert!(expanded.contains("fn transfer_descriptor"));
        assert!(expanded.contains("target"));
        assert!(expanded.contains("Weak"));
        assert!(expanded.contains("Reservoir"));
        assert!(expanded.contains("upgrade"));
        assert!(!expanded.contains("struct TransferInput { pub target"));
    }

    #[test]
    fn sync_fn_is_rejected() {
        let item: ItemFn = parse_quote! {
            fn increment(thing: std::sync::Arc<Counter>, ctx: InvocationContext) -> Result<i64, ActionError> {
                Ok(0)
            }
        };
        assert!(expand(item).is_err());
    }

    #[test]
    fn pascal_case_handles_multi_word_names() {
        assert_eq!(to_pascal_case("set_gain_level"), "SetGainLevel");
        assert_eq!(to_pascal_case("increment"), "Increment");
    }
}
