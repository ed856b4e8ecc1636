use proc_macro2::{Ident, Span};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;

/// Resolves the path callers should use to reach `labthings-runtime` from
/// generated code, honouring renames in the caller's `Cargo.toml` the same
/// way the teacher's own macro crate does.
pub fn labthings_runtime_path() -> proc_macro2::TokenStream {
    match crate_name("labthings-runtime") {
        Ok(FoundCrate::Itself) => quote!(crate),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::labthings_runtime),
    }
}
