use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemFn};

mod action_attr;
mod crate_path;
mod thing_derive;

/// Implements [`labthings_runtime::thing::Thing`] for a struct with a
/// `core: ThingCore` field.
#[proc_macro_derive(Thing)]
pub fn derive_thing(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    thing_derive::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Declares an action body and generates its input model and
/// `ActionDescriptor` constructor. See [`action_attr`] for the full
/// parameter-splitting rules.
#[proc_macro_attribute]
pub fn action(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemFn);
    action_attr::expand(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
