use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ItemStruct;

pub fn expand(input: ItemStruct) -> TokenStream {
    let ItemStruct { attrs, vis, ident, generics, fields, .. } = input;

    if !generics.params.is_empty() {
        return syn::Error::new_spanned(&generics, "cape_slice does not support generic slices")
            .into_compile_error();
    }

    let inner = format_ident!("{ident}Inner");
    let body = match &fields {
        syn::Fields::Named(_) => quote! { #fields },
        syn::Fields::Unnamed(_) => quote! { #fields; },
        syn::Fields::Unit => quote! { ; },
    };

    quote! {
        #(#attrs)*
        #[derive(Debug)]
        #vis struct #inner #body

        #[derive(Debug, Clone)]
        #vis struct #ident {
            inner: ::std::sync::Arc<#inner>,
        }

        #[automatically_derived]
        impl #ident {
            #[must_use]
            pub fn new(inner: #inner) -> Self {
                Self { inner: ::std::sync::Arc::new(inner) }
            }
        }

        #[automatically_derived]
        impl ::core::convert::From<#inner> for #ident {
            fn from(inner: #inner) -> Self {
                Self::new(inner)
            }
        }

        #[automatically_derived]
        impl ::core::ops::Deref for #ident {
            type Target = #inner;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        #[automatically_derived]
        impl ::cape_kernel::domain::registry::FeatureSlice for #ident {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }
    }
}
