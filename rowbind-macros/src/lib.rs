mod decode_field;
mod encode_entity;

use decode_field::{FieldDecoded, decode_field};
use encode_entity::{encode_descriptor, encode_reflect};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Fields, ItemStruct, parse_macro_input};

/// Derives `Entity`, `Reflect` and `Embed` for a struct with named fields.
///
/// Field attributes:
/// - `#[rowbind(orm = "name,primary,autoincrement")]`: one structural tag per
///   `key = "value"` pair, the key selects which tag a mapper reads.
/// - `#[rowbind(embed)]`: the field is another entity (also behind `Box` or `Option`)
///   whose tagged fields are reachable from this one.
#[proc_macro_derive(Entity, attributes(rowbind))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    match entity(&item) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn entity(item: &ItemStruct) -> syn::Result<proc_macro2::TokenStream> {
    let name = &item.ident;
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "Entity cannot be derived for generic structs",
        ));
    }
    if let Fields::Unnamed(fields) = &item.fields {
        return Err(syn::Error::new_spanned(
            fields,
            "Entity requires named fields, tuple structs are not supported",
        ));
    }
    let fields = item
        .fields
        .iter()
        .map(decode_field)
        .collect::<syn::Result<Vec<FieldDecoded>>>()?;
    let descriptor = encode_descriptor(name, &fields);
    let reflect = encode_reflect(name, &fields);
    Ok(quote! {
        #reflect
        impl ::rowbind::Entity for #name {
            fn descriptor() -> &'static ::rowbind::EntityDescriptor {
                #descriptor
            }
        }
        impl ::rowbind::Embed for #name {
            fn embedded_descriptor() -> &'static ::rowbind::EntityDescriptor {
                <Self as ::rowbind::Entity>::descriptor()
            }
            fn embedded(&self) -> Option<&dyn ::rowbind::Reflect> {
                Some(self)
            }
            fn embedded_mut(&mut self) -> &mut dyn ::rowbind::Reflect {
                self
            }
        }
    })
}
