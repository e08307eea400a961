use syn::{Field, Ident, LitStr, Token, Type, Visibility, spanned::Spanned};

pub(crate) enum FieldRole {
    /// Tagged scalar.
    Leaf { nullable: bool },
    /// `#[rowbind(embed)]`.
    Embedded,
    Opaque,
}

pub(crate) struct FieldDecoded {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) exported: bool,
    pub(crate) tags: Vec<(String, String)>,
    pub(crate) role: FieldRole,
}

pub(crate) fn decode_field(field: &Field) -> syn::Result<FieldDecoded> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new(
            field.span(),
            "Entity fields must be named, tuple structs are not supported",
        ));
    };
    let mut tags = Vec::<(String, String)>::new();
    let mut embed = false;
    for attr in field.attrs.iter().filter(|v| v.path().is_ident("rowbind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("embed") {
                if meta.input.peek(Token![=]) {
                    return Err(meta.error("`embed` takes no value, use it like: `#[rowbind(embed)]`"));
                }
                embed = true;
                return Ok(());
            }
            let Some(key) = meta.path.get_ident() else {
                return Err(meta.error(
                    "Expected a tag key, use it like: `#[rowbind(orm = \"column,primary\")]`",
                ));
            };
            let key = key.to_string();
            let value: LitStr = meta.value()?.parse()?;
            if tags.iter().any(|(k, _)| *k == key) {
                return Err(meta.error(format!("Tag `{key}` is declared more than once")));
            }
            tags.push((key, value.value()));
            Ok(())
        })?;
    }
    if embed && !tags.is_empty() {
        return Err(syn::Error::new(
            field.span(),
            format!("Field `{ident}` cannot be both embedded and tagged"),
        ));
    }
    let exported = match &field.vis {
        Visibility::Public(..) => true,
        // Only `pub(crate)`, narrower scopes are private to the mapper.
        Visibility::Restricted(v) => v.in_token.is_none() && v.path.is_ident("crate"),
        Visibility::Inherited => false,
    };
    let role = if !exported {
        FieldRole::Opaque
    } else if embed {
        FieldRole::Embedded
    } else if !tags.is_empty() {
        FieldRole::Leaf {
            nullable: is_option(&field.ty),
        }
    } else {
        FieldRole::Opaque
    };
    Ok(FieldDecoded {
        ident,
        ty: field.ty.clone(),
        exported,
        tags,
        role,
    })
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|v| v.ident == "Option"),
        Type::Group(group) => is_option(&group.elem),
        Type::Paren(paren) => is_option(&paren.elem),
        _ => false,
    }
}
