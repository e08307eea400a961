use crate::decode_field::{FieldDecoded, FieldRole};
use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

pub(crate) fn encode_descriptor(name: &Ident, fields: &[FieldDecoded]) -> TokenStream {
    let type_name = name.to_string();
    let fields = fields.iter().map(|field| {
        let ident = field.ident.to_string();
        let exported = field.exported;
        let ty = &field.ty;
        let tags = field.tags.iter().map(|(k, v)| quote!((#k, #v)));
        let shape = match field.role {
            FieldRole::Leaf { nullable } => quote! {
                ::rowbind::FieldShape::Leaf {
                    zero: ::rowbind::zero_value::<#ty>,
                    nullable: #nullable,
                }
            },
            FieldRole::Embedded => quote! {
                ::rowbind::FieldShape::Embedded {
                    descriptor: <#ty as ::rowbind::Embed>::embedded_descriptor,
                }
            },
            FieldRole::Opaque => quote!(::rowbind::FieldShape::Opaque),
        };
        quote! {
            ::rowbind::FieldDescriptor {
                ident: #ident,
                exported: #exported,
                tags: &[#(#tags),*],
                shape: #shape,
            }
        }
    });
    quote! {
        static DESCRIPTOR: ::rowbind::EntityDescriptor = ::rowbind::EntityDescriptor {
            name: #type_name,
            type_id: ::std::any::TypeId::of::<#name>,
            fields: &[#(#fields),*],
        };
        &DESCRIPTOR
    }
}

pub(crate) fn encode_reflect(name: &Ident, fields: &[FieldDecoded]) -> TokenStream {
    let field_ref = fields.iter().enumerate().filter_map(|(i, field)| {
        let ident = &field.ident;
        match field.role {
            FieldRole::Leaf { .. } => Some(quote! {
                #i => Some(::rowbind::FieldRef::Leaf(&self.#ident)),
            }),
            FieldRole::Embedded => Some(quote! {
                #i => Some(::rowbind::FieldRef::Embedded(::rowbind::Embed::embedded(&self.#ident))),
            }),
            FieldRole::Opaque => None,
        }
    });
    let field_mut = fields.iter().enumerate().filter_map(|(i, field)| {
        let ident = &field.ident;
        match field.role {
            FieldRole::Leaf { .. } => Some(quote! {
                #i => Some(::rowbind::FieldMut::Leaf(&mut self.#ident)),
            }),
            FieldRole::Embedded => Some(quote! {
                #i => Some(::rowbind::FieldMut::Embedded(::rowbind::Embed::embedded_mut(&mut self.#ident))),
            }),
            FieldRole::Opaque => None,
        }
    });
    quote! {
        impl ::rowbind::Reflect for #name {
            fn field_ref(&self, index: usize) -> Option<::rowbind::FieldRef<'_>> {
                match index {
                    #(#field_ref)*
                    _ => None,
                }
            }
            fn field_mut(&mut self, index: usize) -> Option<::rowbind::FieldMut<'_>> {
                match index {
                    #(#field_mut)*
                    _ => None,
                }
            }
        }
    }
}
