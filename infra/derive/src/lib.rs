#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros shared by every crate of the workspace.
//!
//! * [`macro@cape_error`] turns an enum into a context-aware error type.
//! * [`macro@cape_slice`] turns a struct into a shareable feature slice handle.
//!
//! The examples below are `ignore`d because a proc-macro crate cannot depend on
//! the crates the generated code refers to.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// Defines a domain error enum with context support.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless the enum already derives them.
/// * An inherent `with_context(...)` method that fills the variant's `context` field.
/// * A `<Name>Ext` trait with `.context(...)` for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant wrapping a source error.
/// * `From<Source>` for every variant made of exactly a source and a context field.
/// * `From<&'static str>` and `From<String>` when an `Internal { message, context }`
///   variant exists.
/// * A module-private `format_context` helper for use in `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Every variant uses named fields.
/// 3. A `context` field must be typed `Option<Cow<'static, str>>`.
/// 4. A variant with a source (`source` field, `#[source]` or `#[from]`) must also
///    carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[cape_derive::cape_error]
/// pub enum StoreError {
///     #[error("SQL error{}: {source}", format_context(.context))]
///     Sql { source: sqlx::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal store error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load(pool: &sqlx::SqlitePool) -> Result<(), StoreError> {
///     run_query(pool).context("Loading heroes")?;
///     Err("unreachable state".into())
/// }
/// ```
#[proc_macro_attribute]
pub fn cape_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(&input).into()
}

/// Defines a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` is a cheap-to-clone `Arc`
/// wrapper that dereferences to it and implements
/// `cape_kernel::domain::registry::FeatureSlice`.
///
/// # Example
///
/// ```rust,ignore
/// #[cape_derive::cape_slice]
/// pub struct Heroes {
///     pub service: HeroService,
/// }
///
/// let slice = Heroes::new(HeroesInner { service });
/// ```
#[proc_macro_attribute]
pub fn cape_slice(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::slice::expand(input).into()
}
