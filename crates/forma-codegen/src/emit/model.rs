use forma_ir::Receiver;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{
    EmitContext, EmitError, deprecation_tokens, mentions_float, parse_type, visibility_tokens,
};
use crate::naming::prefixed_method;

/// The value type: struct, constructor, setters, trait impl, equality,
/// hashing and `Debug`.
pub(super) fn emit(context: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let class = &context.class;
    let model = context.model;
    let deprecated = deprecation_tokens(model.deprecation.as_ref());
    let serde = *model.settings.serde.value();
    let derive_serde = serde.then(|| quote!(#[derive(::serde::Serialize, ::serde::Deserialize)]));

    let fields = context.fields.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        let vis = visibility_tokens(field.attribute.field_visibility);
        let deprecated = deprecation_tokens(field.attribute.deprecation.as_ref());
        let skip = (serde && field.attribute.transient).then(|| quote!(#[serde(skip_serializing)]));
        quote! {
            #deprecated
            #skip
            #vis #ident: #ty
        }
    });

    let params = context.fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        quote!(#ident: #ty)
    });
    let idents = context.fields.iter().map(|f| &f.ident);

    let setter_prefix = model.settings.setter_prefix.value();
    let setters = context
        .fields
        .iter()
        .filter(|f| f.attribute.setter)
        .map(|field| {
            let ident = &field.ident;
            let ty = &field.ty;
            let name = format_ident!("{}", prefixed_method(setter_prefix, &field.ident.to_string()));
            let deprecated = deprecation_tokens(field.attribute.deprecation.as_ref());
            quote! {
                #deprecated
                pub fn #name(&mut self, #ident: #ty) -> &mut Self {
                    self.#ident = #ident;
                    self
                }
            }
        });

    let getters = context
        .fields
        .iter()
        .map(|field| {
            let method = &field.attribute.getter.method;
            let name = format_ident!("{}", method.name);
            let ident = &field.ident;
            let ret = match &method.return_type {
                Some(ty) => parse_type(ty.as_str(), &field.attribute.name)?,
                None => field.ty.clone(),
            };
            let (receiver, body) = match &method.receiver {
                Receiver::Value => (quote!(self), quote!(self.#ident)),
                Receiver::RefMut => (quote!(&mut self), quote!(self.#ident.clone())),
                Receiver::Ref | Receiver::None => (quote!(&self), quote!(self.#ident.clone())),
                // `Box<Self>`, `Rc<Self>` and the like reach the field through `Deref`.
                Receiver::Typed(ty) => {
                    let ty = parse_type(ty.as_str(), &field.attribute.name)?;
                    (quote!(self: #ty), quote!(self.#ident.clone()))
                }
            };
            Ok(quote! {
                fn #name(#receiver) -> #ret {
                    #body
                }
            })
        })
        .collect::<Result<Vec<_>, EmitError>>()?;

    let equality: Vec<_> = context
        .fields
        .iter()
        .filter(|f| f.attribute.in_equality)
        .collect();
    let equality_idents: Vec<_> = equality.iter().map(|f| &f.ident).collect();
    let eq_body = quote!(true #(&& self.#equality_idents == other.#equality_idents)*);
    let hash_body = if equality_idents.is_empty() {
        quote!(let _ = state;)
    } else {
        quote!(#(::core::hash::Hash::hash(&self.#equality_idents, state);)*)
    };

    let class_name = class.to_string();
    let debug_fields = context
        .fields
        .iter()
        .filter(|f| f.attribute.in_to_string)
        .map(|f| {
            let ident = &f.ident;
            let label = &f.attribute.name;
            quote!(.field(#label, &self.#ident))
        });
    let finish = if context.fields.iter().all(|f| f.attribute.in_to_string) {
        quote!(finish)
    } else {
        quote!(finish_non_exhaustive)
    };

    let interface = &context.interface;
    let allow_deprecated = context.allow(quote!(deprecated));
    // Floats have neither `Eq` nor `Hash`; such models only get `PartialEq`.
    let hash_impl = equality.iter().all(|f| !mentions_float(&f.ty)).then(|| {
        quote! {
            #allow_deprecated
            impl ::core::cmp::Eq for #class {}

            #allow_deprecated
            impl ::core::hash::Hash for #class {
                fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                    #hash_body
                }
            }
        }
    });
    let allow_args = context.allow(quote!(clippy::too_many_arguments));

    Ok(quote! {
        #deprecated
        #derive_serde
        #[derive(Clone)]
        pub struct #class {
            #(#fields,)*
        }

        #allow_deprecated
        impl #class {
            #allow_args
            pub fn new(#(#params),*) -> Self {
                Self { #(#idents),* }
            }

            #(#setters)*
        }

        #allow_deprecated
        impl #interface for #class {
            #(#getters)*
        }

        #allow_deprecated
        impl ::core::cmp::PartialEq for #class {
            fn eq(&self, other: &Self) -> bool {
                #eq_body
            }
        }

        #hash_impl

        #allow_deprecated
        impl ::core::fmt::Debug for #class {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(#class_name)
                    #(#debug_fields)*
                    .#finish()
            }
        }
    })
}
