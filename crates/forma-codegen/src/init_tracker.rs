//! Bitmask tracking of which mandatory attributes a builder has set.
//!
//! Each mandatory attribute owns one bit, assigned from the least
//! significant bit in attribute order. The tracker never runs itself: it
//! only produces [`BitExpr`] formulas that generated builders evaluate.

use std::fmt;

use indexmap::IndexMap;
use num_bigint::BigUint;
use proc_macro2::{Literal, TokenStream};
use quote::{ToTokens as _, quote};

/// Integer type holding the tracking bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackerWidth {
    U8,
    U16,
    U32,
    U64,
    U128,
    /// `num_bigint::BigUint`, for models with more than 128 mandatory
    /// attributes.
    Big,
}

impl TrackerWidth {
    /// The narrowest width with at least `count` bits.
    pub fn for_count(count: usize) -> Self {
        match count {
            0..=8 => TrackerWidth::U8,
            9..=16 => TrackerWidth::U16,
            17..=32 => TrackerWidth::U32,
            33..=64 => TrackerWidth::U64,
            65..=128 => TrackerWidth::U128,
            _ => TrackerWidth::Big,
        }
    }

    /// Number of bits, or `None` for arbitrary precision.
    pub fn bits(self) -> Option<u32> {
        match self {
            TrackerWidth::U8 => Some(8),
            TrackerWidth::U16 => Some(16),
            TrackerWidth::U32 => Some(32),
            TrackerWidth::U64 => Some(64),
            TrackerWidth::U128 => Some(128),
            TrackerWidth::Big => None,
        }
    }

    pub fn type_tokens(self) -> TokenStream {
        match self {
            TrackerWidth::U8 => quote!(u8),
            TrackerWidth::U16 => quote!(u16),
            TrackerWidth::U32 => quote!(u32),
            TrackerWidth::U64 => quote!(u64),
            TrackerWidth::U128 => quote!(u128),
            TrackerWidth::Big => quote!(::num_bigint::BigUint),
        }
    }

    /// A constant of this width as tokens.
    pub fn literal(self, value: &BigUint) -> TokenStream {
        let small = low_u128(value);
        match self {
            TrackerWidth::U8 => Literal::u8_suffixed(small as u8).into_token_stream(),
            TrackerWidth::U16 => Literal::u16_suffixed(small as u16).into_token_stream(),
            TrackerWidth::U32 => Literal::u32_suffixed(small as u32).into_token_stream(),
            TrackerWidth::U64 => Literal::u64_suffixed(small as u64).into_token_stream(),
            TrackerWidth::U128 => Literal::u128_suffixed(small).into_token_stream(),
            TrackerWidth::Big => {
                let bytes = value.to_bytes_le().into_iter().map(Literal::u8_unsuffixed);
                quote!(::num_bigint::BigUint::from_bytes_le(&[#(#bytes),*]))
            }
        }
    }
}

impl fmt::Display for TrackerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            Some(bits) => write!(f, "u{bits}"),
            None => f.write_str("BigUint"),
        }
    }
}

fn low_u128(value: &BigUint) -> u128 {
    value
        .iter_u64_digits()
        .take(2)
        .enumerate()
        .fold(0u128, |acc, (i, digit)| acc | (u128::from(digit) << (64 * i)))
}

/// A side-effect free formula over tracking variables and constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitExpr {
    Var(String),
    Const(BigUint),
    And(Box<BitExpr>, Box<BitExpr>),
    Or(Box<BitExpr>, Box<BitExpr>),
    Eq(Box<BitExpr>, Box<BitExpr>),
    Ne(Box<BitExpr>, Box<BitExpr>),
}

/// Result of evaluating a [`BitExpr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluated {
    Bits(BigUint),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),
    #[error("expected bits, found a boolean")]
    ExpectedBits,
}

impl BitExpr {
    fn and(left: BitExpr, right: BitExpr) -> Self {
        BitExpr::And(Box::new(left), Box::new(right))
    }

    fn or(left: BitExpr, right: BitExpr) -> Self {
        BitExpr::Or(Box::new(left), Box::new(right))
    }

    fn equal(left: BitExpr, right: BitExpr) -> Self {
        BitExpr::Eq(Box::new(left), Box::new(right))
    }

    fn not_equal(left: BitExpr, right: BitExpr) -> Self {
        BitExpr::Ne(Box::new(left), Box::new(right))
    }

    /// Evaluates the formula, looking variables up in `vars`.
    pub fn evaluate(&self, vars: &dyn Fn(&str) -> Option<BigUint>) -> Result<Evaluated, EvalError> {
        let bits = |expr: &BitExpr| -> Result<BigUint, EvalError> {
            match expr.evaluate(vars)? {
                Evaluated::Bits(bits) => Ok(bits),
                Evaluated::Bool(_) => Err(EvalError::ExpectedBits),
            }
        };
        Ok(match self {
            BitExpr::Var(name) => Evaluated::Bits(
                vars(name).ok_or_else(|| EvalError::UnboundVariable(name.clone()))?,
            ),
            BitExpr::Const(value) => Evaluated::Bits(value.clone()),
            BitExpr::And(left, right) => Evaluated::Bits(bits(left)? & bits(right)?),
            BitExpr::Or(left, right) => Evaluated::Bits(bits(left)? | bits(right)?),
            BitExpr::Eq(left, right) => Evaluated::Bool(bits(left)? == bits(right)?),
            BitExpr::Ne(left, right) => Evaluated::Bool(bits(left)? != bits(right)?),
        })
    }

    /// Evaluates a boolean formula with a single tracking variable bound to
    /// `value`.
    pub fn test(&self, value: &BigUint) -> Result<bool, EvalError> {
        match self.evaluate(&|_| Some(value.clone()))? {
            Evaluated::Bool(result) => Ok(result),
            Evaluated::Bits(bits) => Ok(bits != BigUint::default()),
        }
    }

    /// Renders the formula as Rust tokens for a tracker of `width`.
    /// `var` maps variable names to the tokens that access them.
    pub fn render(&self, width: TrackerWidth, var: &dyn Fn(&str) -> TokenStream) -> TokenStream {
        let big = width == TrackerWidth::Big;
        match self {
            BitExpr::Var(name) => var(name),
            BitExpr::Const(value) => width.literal(value),
            BitExpr::And(left, right) | BitExpr::Or(left, right) => {
                let left = left.render(width, var);
                let right = right.render(width, var);
                let op = if matches!(self, BitExpr::And(..)) {
                    quote!(&)
                } else {
                    quote!(|)
                };
                if big {
                    quote!((&#left #op &#right))
                } else {
                    quote!((#left #op #right))
                }
            }
            BitExpr::Eq(left, right) => {
                let left = left.render(width, var);
                let right = right.render(width, var);
                quote!(#left == #right)
            }
            BitExpr::Ne(left, right) => {
                let left = left.render(width, var);
                let right = right.render(width, var);
                quote!(#left != #right)
            }
        }
    }
}

/// Bit assignment for a set of mandatory attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitTracker {
    width: TrackerWidth,
    masks: IndexMap<String, BigUint>,
    all: BigUint,
}

impl InitTracker {
    /// Assigns bits to `attributes` in iteration order.
    pub fn new<S: Into<String>>(attributes: impl IntoIterator<Item = S>) -> Self {
        let mut masks = IndexMap::new();
        let mut all = BigUint::default();
        for (offset, attribute) in attributes.into_iter().enumerate() {
            let mask = BigUint::from(1u8) << offset;
            all |= &mask;
            masks.insert(attribute.into(), mask);
        }
        Self {
            width: TrackerWidth::for_count(masks.len()),
            masks,
            all,
        }
    }

    pub fn width(&self) -> TrackerWidth {
        self.width
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.masks.keys().map(String::as_str)
    }

    pub fn mask(&self, attribute: &str) -> Option<&BigUint> {
        self.masks.get(attribute)
    }

    pub fn all_mask(&self) -> &BigUint {
        &self.all
    }

    /// Value of a fresh tracking variable.
    pub fn initial(&self) -> BitExpr {
        BitExpr::Const(BigUint::default())
    }

    /// `(var & mask) == mask`
    pub fn is_set(&self, var: &str, attribute: &str) -> Option<BitExpr> {
        let mask = self.mask(attribute)?;
        Some(BitExpr::equal(
            BitExpr::and(BitExpr::Var(var.to_owned()), BitExpr::Const(mask.clone())),
            BitExpr::Const(mask.clone()),
        ))
    }

    /// `(var & mask) == 0`
    pub fn is_unset(&self, var: &str, attribute: &str) -> Option<BitExpr> {
        let mask = self.mask(attribute)?;
        Some(BitExpr::equal(
            BitExpr::and(BitExpr::Var(var.to_owned()), BitExpr::Const(mask.clone())),
            self.initial(),
        ))
    }

    /// `(var & all) != all`
    pub fn any_unset(&self, var: &str) -> BitExpr {
        BitExpr::not_equal(
            BitExpr::and(BitExpr::Var(var.to_owned()), BitExpr::Const(self.all.clone())),
            BitExpr::Const(self.all.clone()),
        )
    }

    /// `var | mask`, the new value of `var` once `attribute` is set.
    pub fn mark_set(&self, var: &str, attribute: &str) -> Option<BitExpr> {
        let mask = self.mask(attribute)?;
        Some(BitExpr::or(
            BitExpr::Var(var.to_owned()),
            BitExpr::Const(mask.clone()),
        ))
    }
}
