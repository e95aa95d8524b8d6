use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, LitStr, Type, parse_macro_input};

/// Built-in field types with a dedicated tag. Every other type is reflected
/// as opaque bytes and must implement `bytemuck::Pod`.
const BUILTIN_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "bool", "String", "Vec2",
    "Vec3", "Vec4", "Quat", "Mat4", "Color8", "Color32", "ObjectRef",
];

/// Derive the `Kind` trait, producing the kind's name and field descriptors.
///
/// The struct must also implement `Default`. Fields are registered in
/// declaration order, which is also their order on the wire.
///
/// # Attributes
///
/// - `#[reflect(name = "Shader")]` on the struct overrides the kind name
///   (and therefore its hash). Defaults to the struct identifier.
/// - `#[reflect(skip)]` on a field leaves it out of the field list.
///   Fields starting with `_` are skipped as well.
///
/// ```ignore
/// #[derive(Default, Reflect)]
/// struct Spinner {
///     speed: f32,
///     axis: Vec3,
///     target: ObjectRef<Node>,
///     #[reflect(skip)]
///     elapsed: f32,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let kind_name = match container_name(&input.attrs) {
        Ok(Some(lit)) => lit.value(),
        Ok(None) => name.to_string(),
        Err(err) => return err.to_compile_error().into(),
    };

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return syn::Error::new_spanned(&input.ident, "Reflect can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut descriptors = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        match is_skipped(&field.attrs) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(err) => return err.to_compile_error().into(),
        }

        let (member, field_name) = match &field.ident {
            Some(ident) => {
                let field_name = ident.to_string();
                if field_name.starts_with('_') {
                    continue;
                }
                (quote! { #ident }, field_name)
            }
            None => {
                let idx = syn::Index::from(i);
                (quote! { #idx }, i.to_string())
            }
        };

        let ty = &field.ty;
        let constructor = if is_builtin(ty) {
            quote! { new }
        } else {
            quote! { opaque }
        };

        descriptors.push(quote! {
            keepsake_graph::FieldDescriptor::#constructor::<Self, #ty>(
                #field_name,
                ::core::mem::offset_of!(Self, #member),
                |o| &o.#member,
                |o| &mut o.#member,
            )
        });
    }

    let expanded = quote! {
        impl #impl_generics keepsake_graph::Kind for #name #ty_generics #where_clause {
            const NAME: &'static str = #kind_name;

            fn fields() -> ::std::vec::Vec<keepsake_graph::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }
        }
    };

    expanded.into()
}

/// Reads `#[reflect(name = "...")]` from the container attributes.
fn container_name(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}

fn is_skipped(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skip = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

fn is_builtin(ty: &Type) -> bool {
    BUILTIN_TYPES.contains(&extract_last_segment(ty).as_str())
}

/// Extract the last segment name from a type path (e.g. `keepsake_core::math::Vec3` → `"Vec3"`).
fn extract_last_segment(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}
