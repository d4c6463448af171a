use forma_ir::BuilderKind;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{EmitContext, EmitError, FieldTokens, deprecation_tokens};
use crate::builder::{BuilderPlan, BuilderStage};
use crate::init_tracker::InitTracker;

/// Attribute fields never start with `_`, so this cannot clash with one.
const TRACKING_VAR: &str = "__forma_initialized";

pub(super) fn emit(context: &EmitContext<'_>, plan: &BuilderPlan) -> Result<TokenStream, EmitError> {
    Ok(match plan.strategy.kind {
        BuilderKind::None => TokenStream::new(),
        BuilderKind::Unchecked => unchecked(context, plan),
        BuilderKind::RuntimeChecked => runtime_checked(context, plan),
        BuilderKind::Staged => staged(context, plan),
    })
}

struct Names {
    builder: syn::Ident,
    builder_method: syn::Ident,
    build_method: syn::Ident,
}

impl Names {
    fn new(plan: &BuilderPlan) -> Self {
        Self {
            builder: format_ident!("{}", plan.strategy.type_name),
            builder_method: format_ident!("{}", plan.strategy.builder_method_name),
            build_method: format_ident!("{}", plan.strategy.build_method_name),
        }
    }
}

/// `Option` slots for every attribute.
fn slots<'a>(fields: impl Iterator<Item = &'a FieldTokens<'a>>) -> Vec<TokenStream> {
    fields
        .map(|f| {
            let ident = &f.ident;
            let ty = &f.ty;
            quote!(#ident: ::core::option::Option<#ty>)
        })
        .collect()
}

/// Builder setter for one attribute, consuming and returning the builder.
/// `extra` runs after the slot is filled.
fn setter(field: &FieldTokens<'_>, return_type: &TokenStream, extra: TokenStream) -> TokenStream {
    let ident = &field.ident;
    let ty = &field.ty;
    let deprecated = deprecation_tokens(field.attribute.deprecation.as_ref());
    quote! {
        #deprecated
        pub fn #ident(mut self, #ident: #ty) -> #return_type {
            self.#ident = ::core::option::Option::Some(#ident);
            #extra
            self
        }
    }
}

/// Field initialisers of the model. Mandatory attributes are known to be
/// present; optional ones fall back to their default.
fn take_fields(context: &EmitContext<'_>, checked: bool) -> Vec<TokenStream> {
    context
        .fields
        .iter()
        .map(|f| {
            let ident = &f.ident;
            if checked && f.attribute.mandatory {
                let message = format!("`{}` is set before building", f.attribute.name);
                quote! {
                    #ident: match self.#ident {
                        ::core::option::Option::Some(value) => value,
                        ::core::option::Option::None => ::core::unreachable!(#message),
                    }
                }
            } else {
                quote!(#ident: self.#ident.unwrap_or_default())
            }
        })
        .collect()
}

/// `to_builder` on the model, filling every slot from the current value.
fn to_builder(context: &EmitContext<'_>, plan: &BuilderPlan, tracker: Option<&InitTracker>) -> TokenStream {
    if !plan.strategy.to_builder {
        return TokenStream::new();
    }
    let class = &context.class;
    let builder = format_ident!("{}", plan.strategy.type_name);
    let idents = context.fields.iter().map(|f| &f.ident);
    let tracking = tracker.map(|tracker| {
        let var = format_ident!("{TRACKING_VAR}");
        let all = tracker.width().literal(tracker.all_mask());
        quote!(#var: #all,)
    });
    let allow = context.allow(quote!(deprecated));
    quote! {
        #allow
        impl #class {
            pub fn to_builder(&self) -> #builder {
                #builder {
                    #tracking
                    #(#idents: ::core::option::Option::Some(self.#idents.clone()),)*
                }
            }
        }
    }
}

fn unchecked(context: &EmitContext<'_>, plan: &BuilderPlan) -> TokenStream {
    let Names {
        builder,
        builder_method,
        build_method,
    } = Names::new(plan);
    let class = &context.class;
    let slots = slots(context.fields.iter());
    let setters = context
        .fields
        .iter()
        .map(|f| setter(f, &quote!(Self), TokenStream::new()));
    let fields = take_fields(context, false);
    let to_builder = to_builder(context, plan, None);
    let allow = context.allow(quote!(deprecated));

    quote! {
        #[derive(Default)]
        pub struct #builder {
            #(#slots,)*
        }

        #allow
        impl #builder {
            #(#setters)*

            /// Builds the value; unset attributes take their default.
            pub fn #build_method(self) -> #class {
                #class {
                    #(#fields,)*
                }
            }
        }

        impl #class {
            pub fn #builder_method() -> #builder {
                #builder::default()
            }
        }

        #to_builder
    }
}

fn runtime_checked(context: &EmitContext<'_>, plan: &BuilderPlan) -> TokenStream {
    let Names {
        builder,
        builder_method,
        build_method,
    } = Names::new(plan);
    let class = &context.class;
    let empty = InitTracker::new(Vec::<String>::new());
    let tracker = plan.tracker.as_ref().unwrap_or(&empty);
    let width = tracker.width();
    let var = format_ident!("{TRACKING_VAR}");
    let access = |_: &str| quote!(self.#var);
    let error = format_ident!(
        "{}",
        plan.error_type
            .clone()
            .unwrap_or_else(|| format!("{class}BuilderError"))
    );

    let tracker_ty = width.type_tokens();
    let initial = tracker.initial().render(width, &access);
    let slots = slots(context.fields.iter());
    let idents = context.fields.iter().map(|f| &f.ident);
    let setters = context.fields.iter().map(|f| {
        let mark = tracker
            .mark_set(TRACKING_VAR, &f.attribute.name)
            .map(|expr| {
                let value = expr.render(width, &access);
                quote!(self.#var = #value;)
            })
            .unwrap_or_default();
        setter(f, &quote!(Self), mark)
    });
    let any_unset = tracker.any_unset(TRACKING_VAR).render(width, &access);
    let missing_checks = context.mandatory().filter_map(|f| {
        let name = &f.attribute.name;
        let unset = tracker.is_unset(TRACKING_VAR, name)?.render(width, &access);
        Some(quote! {
            if #unset {
                missing.push(#name);
            }
        })
    });
    let fields = take_fields(context, true);
    let to_builder = to_builder(context, plan, Some(tracker));
    let class_name = class.to_string();
    let allow = context.allow(quote!(deprecated));

    quote! {
        /// Mandatory attributes that were not set before building.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct #error {
            missing: ::std::vec::Vec<&'static str>,
        }

        impl #error {
            pub fn missing(&self) -> &[&'static str] {
                &self.missing
            }
        }

        impl ::core::fmt::Display for #error {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(
                    f,
                    "cannot build {}: missing mandatory attributes: {}",
                    #class_name,
                    self.missing.join(", ")
                )
            }
        }

        impl ::std::error::Error for #error {}

        pub struct #builder {
            #var: #tracker_ty,
            #(#slots,)*
        }

        impl ::core::default::Default for #builder {
            fn default() -> Self {
                Self {
                    #var: #initial,
                    #(#idents: ::core::option::Option::None,)*
                }
            }
        }

        #allow
        impl #builder {
            #(#setters)*

            pub fn #build_method(self) -> ::core::result::Result<#class, #error> {
                if #any_unset {
                    let mut missing = ::std::vec::Vec::new();
                    #(#missing_checks)*
                    return ::core::result::Result::Err(#error { missing });
                }
                ::core::result::Result::Ok(#class {
                    #(#fields,)*
                })
            }
        }

        impl #class {
            pub fn #builder_method() -> #builder {
                #builder::default()
            }
        }

        #to_builder
    }
}

/// One trait per stage, all implemented by a single builder type that is
/// never named outside this file. Each dedicated stage only exposes the
/// setter leading to the next stage, so `build` is unreachable until every
/// mandatory attribute has been set.
fn staged(context: &EmitContext<'_>, plan: &BuilderPlan) -> TokenStream {
    let Names {
        builder,
        builder_method,
        build_method,
    } = Names::new(plan);
    let class = &context.class;
    let slots = slots(context.fields.iter());
    let idents = context.fields.iter().map(|f| &f.ident);
    let field_of = |attribute: &str| context.fields.iter().find(|f| f.attribute.name == attribute);

    let allow = context.allow(quote!(deprecated));
    let mut stage_traits = Vec::new();
    let mut stage_impls = Vec::new();
    for stage in &plan.stages {
        let stage_trait = format_ident!("{}", stage.trait_name());
        match stage {
            BuilderStage::Dedicated { attribute, next, .. } => {
                let Some(field) = field_of(attribute) else {
                    continue;
                };
                let ident = &field.ident;
                let ty = &field.ty;
                let next_trait = plan
                    .stages
                    .get(*next)
                    .map(|s| format_ident!("{}", s.trait_name()))
                    .unwrap_or_else(|| stage_trait.clone());
                let deprecated = deprecation_tokens(field.attribute.deprecation.as_ref());
                stage_traits.push(quote! {
                    pub trait #stage_trait {
                        #deprecated
                        fn #ident(self, #ident: #ty) -> impl #next_trait;
                    }
                });
                stage_impls.push(quote! {
                    #allow
                    impl #stage_trait for #builder {
                        fn #ident(mut self, #ident: #ty) -> impl #next_trait {
                            self.#ident = ::core::option::Option::Some(#ident);
                            self
                        }
                    }
                });
            }
            BuilderStage::Final { optional, .. } => {
                let fields: Vec<_> = optional.iter().filter_map(|a| field_of(a)).collect();
                let decls = fields.iter().map(|f| {
                    let ident = &f.ident;
                    let ty = &f.ty;
                    let deprecated = deprecation_tokens(f.attribute.deprecation.as_ref());
                    quote! {
                        #deprecated
                        fn #ident(self, #ident: #ty) -> Self;
                    }
                });
                let impls = fields.iter().map(|f| {
                    let ident = &f.ident;
                    let ty = &f.ty;
                    quote! {
                        fn #ident(mut self, #ident: #ty) -> Self {
                            self.#ident = ::core::option::Option::Some(#ident);
                            self
                        }
                    }
                });
                let take = take_fields(context, true);
                stage_traits.push(quote! {
                    pub trait #stage_trait: ::core::marker::Sized {
                        #(#decls)*
                        fn #build_method(self) -> #class;
                    }
                });
                stage_impls.push(quote! {
                    #allow
                    impl #stage_trait for #builder {
                        #(#impls)*

                        fn #build_method(self) -> #class {
                            #class {
                                #(#take,)*
                            }
                        }
                    }
                });
            }
        }
    }

    let first = plan
        .first_stage()
        .map(|s| format_ident!("{}", s.trait_name()));

    quote! {
        #(#stage_traits)*

        struct #builder {
            #(#slots,)*
        }

        #(#stage_impls)*

        impl #class {
            pub fn #builder_method() -> impl #first {
                #builder {
                    #(#idents: ::core::option::Option::None,)*
                }
            }
        }
    }
}
