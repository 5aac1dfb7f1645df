use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, Type, Variant};

/// What the macro needs to know about one variant of the annotated enum.
struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<&'a Field>,
    has_context: bool,
    field_count: usize,
    cfg: Vec<&'a Attribute>,
}

impl<'a> ErrorVariant<'a> {
    fn parse(variant: &'a Variant) -> syn::Result<Self> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "cape_error variants must use named fields (`Variant { .. }`)",
            ));
        };

        let mut has_context = false;
        for field in &fields.named {
            if field.ident.as_ref().is_some_and(|ident| ident == "context") {
                if !is_context_type(&field.ty) {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "`context` must be typed `Option<Cow<'static, str>>`",
                    ));
                }
                has_context = true;
            }
        }

        let source = fields.named.iter().find(|field| is_source(field));
        if source.is_some() && !has_context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "variants wrapping a source need a `context: Option<Cow<'static, str>>` field",
            ));
        }

        Ok(Self {
            ident: &variant.ident,
            source,
            has_context,
            field_count: fields.named.len(),
            cfg: variant.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).collect(),
        })
    }

    /// `Variant { source, context }` can be built from the source alone.
    fn wraps_source_only(&self) -> bool {
        self.source.is_some() && self.has_context && self.field_count == 2
    }

    /// `Internal { message, context }` backs the string conversions.
    fn is_internal(&self) -> bool {
        self.ident == "Internal" && self.has_context && self.field_count == 2
    }
}

pub fn expand(input: &DeriveInput) -> TokenStream {
    expand_enum(input).unwrap_or_else(syn::Error::into_compile_error)
}

fn expand_enum(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "cape_error can only be applied to enums"));
    };

    let variants =
        data.variants.iter().map(ErrorVariant::parse).collect::<syn::Result<Vec<_>>>()?;

    let name = &input.ident;
    let ext = format_ident!("{name}Ext");

    let derives = derive_attr(&input.attrs);
    let with_context = with_context_impl(name, &variants);
    let ext_trait = ext_trait(name, &ext);
    let source_impls = variants.iter().map(|variant| source_impls(name, &ext, variant));
    let internal_impls = internal_impls(name, &variants);

    Ok(quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #with_context
        #ext_trait
        #(#source_impls)*
        #internal_impls

        #[allow(dead_code, clippy::ref_option)]
        fn format_context(
            context: &::core::option::Option<::std::borrow::Cow<'static, str>>,
        ) -> ::std::string::String {
            context.as_deref().map(|c| ::std::format!(" ({c})")).unwrap_or_default()
        }
    })
}

fn derive_attr(attrs: &[Attribute]) -> TokenStream {
    let present = derived_names(attrs);
    let mut missing = Vec::new();
    if !present.iter().any(|name| name == "Debug") {
        missing.push(quote! { Debug });
    }
    if !present.iter().any(|name| name == "Error") {
        missing.push(quote! { ::thiserror::Error });
    }

    if missing.is_empty() { quote! {} } else { quote! { #[derive(#(#missing),*)] } }
}

fn with_context_impl(name: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let arms = variants.iter().filter(|variant| variant.has_context).map(|variant| {
        let ident = variant.ident;
        let cfg = &variant.cfg;
        quote! {
            #(#cfg)*
            Self::#ident { context, .. } => *context = ::core::option::Option::Some(value),
        }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            /// Attaches a human-readable context describing the failed operation.
            #[must_use]
            #[allow(unreachable_patterns, unused_variables)]
            pub fn with_context(
                mut self,
                context: impl ::core::convert::Into<::std::borrow::Cow<'static, str>>,
            ) -> Self {
                let value = context.into();
                match &mut self {
                    #(#arms)*
                    _ => {}
                }
                self
            }
        }
    }
}

fn ext_trait(name: &Ident, ext: &Ident) -> TokenStream {
    quote! {
        pub trait #ext<T> {
            fn context(
                self,
                context: impl ::core::convert::Into<::std::borrow::Cow<'static, str>>,
            ) -> ::core::result::Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for ::core::result::Result<T, #name> {
            #[inline]
            fn context(
                self,
                context: impl ::core::convert::Into<::std::borrow::Cow<'static, str>>,
            ) -> Self {
                self.map_err(|error| error.with_context(context))
            }
        }
    }
}

fn source_impls(name: &Ident, ext: &Ident, variant: &ErrorVariant<'_>) -> TokenStream {
    let Some(field) = variant.source else {
        return quote! {};
    };
    if !variant.wraps_source_only() {
        return quote! {};
    }
    let Some(field_ident) = field.ident.as_ref() else {
        return quote! {};
    };

    let ident = variant.ident;
    let ty = &field.ty;
    let cfg = &variant.cfg;

    // thiserror already emits `From` for `#[from]` fields.
    let from_impl = if field.attrs.iter().any(|attr| attr.path().is_ident("from")) {
        quote! {}
    } else {
        quote! {
            #(#cfg)*
            #[automatically_derived]
            impl ::core::convert::From<#ty> for #name {
                #[inline]
                fn from(#field_ident: #ty) -> Self {
                    Self::#ident { #field_ident, context: ::core::option::Option::None }
                }
            }
        }
    };

    quote! {
        #from_impl

        #(#cfg)*
        #[automatically_derived]
        impl<T> #ext<T> for ::core::result::Result<T, #ty> {
            #[inline]
            fn context(
                self,
                context: impl ::core::convert::Into<::std::borrow::Cow<'static, str>>,
            ) -> ::core::result::Result<T, #name> {
                self.map_err(|#field_ident| #name::#ident {
                    #field_ident,
                    context: ::core::option::Option::Some(context.into()),
                })
            }
        }
    }
}

fn internal_impls(name: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let Some(internal) = variants.iter().find(|variant| variant.is_internal()) else {
        return quote! {};
    };
    let cfg = &internal.cfg;

    quote! {
        #(#cfg)*
        #[automatically_derived]
        impl ::core::convert::From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal {
                    message: ::std::borrow::Cow::Borrowed(message),
                    context: ::core::option::Option::None,
                }
            }
        }

        #(#cfg)*
        #[automatically_derived]
        impl ::core::convert::From<::std::string::String> for #name {
            #[inline]
            fn from(message: ::std::string::String) -> Self {
                Self::Internal {
                    message: ::std::borrow::Cow::Owned(message),
                    context: ::core::option::Option::None,
                }
            }
        }
    }
}

fn is_source(field: &Field) -> bool {
    field.ident.as_ref().is_some_and(|ident| ident == "source")
        || field.attrs.iter().any(|attr| attr.path().is_ident("source") || attr.path().is_ident("from"))
}

/// Accepts `Option<Cow<'static, str>>` with or without `std::`/`core::` path prefixes.
fn is_context_type(ty: &Type) -> bool {
    let rendered: String =
        ty.to_token_stream().to_string().chars().filter(|c| !c.is_whitespace()).collect();

    let rendered = strip_paths(&rendered, &["::std::option::", "::core::option::", "std::option::", "core::option::"]);
    let Some(inner) = rendered.strip_prefix("Option<").and_then(|rest| rest.strip_suffix('>')) else {
        return false;
    };
    let inner = strip_paths(inner, &["::std::borrow::", "::alloc::borrow::", "std::borrow::", "alloc::borrow::"]);

    inner == "Cow<'static,str>"
}

fn strip_paths<'a>(value: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes.iter().find_map(|prefix| value.strip_prefix(prefix)).unwrap_or(value)
}

fn derived_names(attrs: &[Attribute]) -> Vec<String> {
    let mut names = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                names.push(last.ident.to_string());
            }
            Ok(())
        });
    }
    names
}
