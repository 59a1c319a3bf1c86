//! Derive macro for wirebox component descriptors
//!
//! `#[derive(Component)]` generates a `descriptor()` constructor producing
//! the component's [`ComponentDescriptor`] table entry, the build-time
//! alternative to writing descriptors by hand:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wirebox::Component;
//!
//! struct Database;
//!
//! #[derive(Component)]
//! #[component(scope = "singleton", init = "connect", teardown = "disconnect")]
//! struct Repository {
//!     #[inject]
//!     db: Arc<Database>,
//!     // Non-injected fields use Default
//!     hits: u64,
//! }
//!
//! impl Repository {
//!     fn connect(&self) {}
//!     fn disconnect(&self) {}
//! }
//!
//! // Register the generated entry through a manifest:
//! // ManifestLocator::new().entry("app.storage", Repository::descriptor)
//! ```
//!
//! `#[inject]` fields become the injection-marked constructor's parameters,
//! resolved by declared type in field order; the remaining fields use
//! `Default::default()`. The `init`/`teardown` attributes name zero-argument
//! `&self` methods to run as lifecycle hooks.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro generating a `descriptor()` table entry for a component.
///
/// # Attributes
///
/// - `#[component(scope = "...")]` - declared scope string (default
///   `"singleton"`; kept verbatim, validated at first use like any other
///   descriptor)
/// - `#[component(init = "method")]` - init hook calling `self.method()`
/// - `#[component(teardown = "method")]` - teardown hook calling
///   `self.method()`
/// - `#[inject]` - mark a field as a constructor dependency. The field type
///   must be `Arc<T>`.
#[proc_macro_derive(Component, attributes(component, inject))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let attrs = match parse_component_attrs(&input.attrs) {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };

    // Only support unit structs and structs with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Some(&fields.named),
            Fields::Unit => None,
            Fields::Unnamed(_) => {
                return syn::Error::new_spanned(
                    &input,
                    "Component cannot be derived for tuple structs",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(&input, "Component can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    // Collect dependency types and field initializers
    let mut dep_types: Vec<proc_macro2::TokenStream> = Vec::new();
    let mut dep_names: Vec<syn::Ident> = Vec::new();
    let mut field_inits: Vec<proc_macro2::TokenStream> = Vec::new();
    let mut dep_index = 0usize;

    for field in fields.into_iter().flatten() {
        let field_name = field.ident.as_ref().unwrap();
        let field_type = &field.ty;

        if has_inject_attr(&field.attrs) {
            if extract_arc_inner_type(field_type).is_none() {
                return syn::Error::new_spanned(
                    field_type,
                    "Fields marked with #[inject] must have type Arc<T>",
                )
                .to_compile_error()
                .into();
            }
            let dep_name =
                syn::Ident::new(&format!("__dep_{}", dep_index), field_name.span());
            dep_types.push(quote! { #field_type });
            dep_names.push(dep_name.clone());
            field_inits.push(quote! { #field_name: #dep_name });
            dep_index += 1;
        } else {
            field_inits.push(quote! {
                #field_name: ::std::default::Default::default()
            });
        }
    }

    // Constructor declaration: argless fallback for no dependencies, an
    // injection-marked constructor otherwise.
    let constructor = match dep_types.len() {
        0 => quote! {
            .constructor(|| Self { #(#field_inits),* })
        },
        1 => {
            let ty = &dep_types[0];
            let dep = &dep_names[0];
            quote! {
                .injected_constructor::<#ty, _>(|#dep| Self { #(#field_inits),* })
            }
        }
        _ => {
            let types = &dep_types;
            let names = &dep_names;
            quote! {
                .injected_constructor::<(#(#types),*), _>(|(#(#names),*)| Self { #(#field_inits),* })
            }
        }
    };

    let scope = attrs.scope.map(|scope| {
        quote! { .scope(#scope) }
    });

    let init_hook = attrs.init.map(|lit| {
        let method = syn::Ident::new(&lit.value(), lit.span());
        quote! {
            .init_hook(#lit, |component| {
                component.#method();
                Ok(())
            })
        }
    });

    let teardown_hook = attrs.teardown.map(|lit| {
        let method = syn::Ident::new(&lit.value(), lit.span());
        quote! {
            .teardown_hook(#lit, |component| {
                component.#method();
                Ok(())
            })
        }
    });

    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Component descriptor for registration through a locator
            /// manifest.
            pub fn descriptor() -> ::wirebox::ComponentDescriptor {
                ::wirebox::ComponentDescriptor::component::<Self>()
                    #scope
                    #constructor
                    #init_hook
                    #teardown_hook
                    .build()
            }
        }
    };

    TokenStream::from(expanded)
}

/// Parsed `#[component(...)]` struct attributes
#[derive(Default)]
struct ComponentAttrs {
    scope: Option<LitStr>,
    init: Option<LitStr>,
    teardown: Option<LitStr>,
}

fn parse_component_attrs(attrs: &[Attribute]) -> syn::Result<ComponentAttrs> {
    let mut parsed = ComponentAttrs::default();
    for attr in attrs {
        if attr.path().is_ident("component") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("scope") {
                    parsed.scope = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("init") {
                    parsed.init = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("teardown") {
                    parsed.teardown = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported component attribute"))
                }
            })?;
        }
    }
    Ok(parsed)
}

/// Whether the field carries the `#[inject]` marker
fn has_inject_attr(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("inject"))
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Arc" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}
