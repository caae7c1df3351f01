//! `#[derive(Error)]` expansion.
//!
//! ```ignore
//! use mmc_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum MachineError {
//!     #[error("undefined label: {label}")]
//!     UndefinedLabel { label: String },
//!
//!     #[error("invalid opcode {0}")]
//!     InvalidOpcode(u8),
//!
//!     #[error("input exhausted")]
//!     InputExhausted,
//! }
//! ```
//!
//! Messages interpolate named fields by name and tuple fields by position.
//! Structs carry the attribute on the type itself.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input, spanned::Spanned};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data
                .variants
                .iter()
                .map(|variant| {
                    let ident = &variant.ident;
                    let message = message(&variant.attrs, variant.span(), &ident.to_string())?;
                    let (pattern, write) = write_fields(&variant.fields, &message);
                    Ok(quote! { Self::#ident #pattern => #write, })
                })
                .collect::<syn::Result<Vec<_>>>()?;
            quote! { match self { #(#arms)* } }
        }
        Data::Struct(data) => {
            let message = message(&input.attrs, input.span(), &name.to_string())?;
            let (pattern, write) = write_fields(&data.fields, &message);
            quote! {
                let Self #pattern = self;
                #write
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "#[derive(Error)] is only supported on enums and structs",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Builds the destructuring pattern for `fields` and the matching `write!` call.
///
/// Tuple fields are bound as `f0`, `f1`, ... and `{0}` placeholders are
/// rewritten to those names so every argument is passed by name.
fn write_fields(fields: &Fields, message: &LitStr) -> (TokenStream2, TokenStream2) {
    match fields {
        Fields::Unit => (quote! {}, quote! { f.write_str(#message) }),
        Fields::Named(named) => {
            let idents: Vec<_> = named.named.iter().filter_map(|f| f.ident.as_ref()).collect();
            let text = message.value();
            let used: Vec<_> = idents
                .iter()
                .filter(|ident| references(&text, &ident.to_string()))
                .collect();
            (
                quote! { { #(#idents),* } },
                quote! {{
                    #( let _ = #idents; )*
                    write!(f, #message, #(#used = #used),*)
                }},
            )
        }
        Fields::Unnamed(unnamed) => {
            let idents: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let mut text = message.value();
            for i in (0..idents.len()).rev() {
                text = text
                    .replace(&format!("{{{i}}}"), &format!("{{f{i}}}"))
                    .replace(&format!("{{{i}:"), &format!("{{f{i}:"));
            }
            let used: Vec<_> = idents
                .iter()
                .filter(|ident| references(&text, &ident.to_string()))
                .collect();
            let rewritten = LitStr::new(&text, message.span());
            (
                quote! { ( #(#idents),* ) },
                quote! {{
                    #( let _ = #idents; )*
                    write!(f, #rewritten, #(#used = #used),*)
                }},
            )
        }
    }
}

/// Whether `text` has a `{name}` or `{name:spec}` placeholder.
fn references(text: &str, name: &str) -> bool {
    text.contains(&format!("{{{name}}}")) || text.contains(&format!("{{{name}:"))
}

/// Reads the string literal out of the `#[error("...")]` attribute.
fn message(attrs: &[Attribute], span: proc_macro2::Span, target: &str) -> syn::Result<LitStr> {
    let attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("error"))
        .ok_or_else(|| {
            syn::Error::new(
                span,
                format!("`{target}` is missing an #[error(\"...\")] display message"),
            )
        })?;

    attr.parse_args::<LitStr>().map_err(|_| {
        syn::Error::new_spanned(
            &attr.meta,
            "expected a string literal, e.g. #[error(\"address {address} out of range\")]",
        )
    })
}
