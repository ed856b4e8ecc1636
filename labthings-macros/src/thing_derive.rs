use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

use crate::crate_path::labthings_runtime_path;

/// `#[derive(Thing)]`: a struct with a `core: ThingCore` field gets its
/// `Thing::core` implementation generated, matching spec.md section 3's
/// requirement that every Thing expose its affordance table.
pub fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input, "#[derive(Thing)] only supports structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input,
            "#[derive(Thing)] requires named fields, including a `core: ThingCore` field",
        ));
    };

    let has_core_field = fields.named.iter().any(|f| f.ident.as_ref().map(|i| i == "core").unwrap_or(false));
    if !has_core_field {
        return Err(syn::Error::new_spanned(
            fields,
            "#[derive(Thing)] requires a field named `core` of type `ThingCore`",
        ));
    }

    let runtime = labthings_runtime_path();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #runtime::thing::Thing for #name #ty_generics #where_clause {
            fn core(&self) -> &#runtime::thing::ThingCore {
                &self.core
            }
        }
    })
}
