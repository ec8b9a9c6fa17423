//! Type hints, as declared in doc comments.

use std::fmt;

use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use crate::reflection::ClassName;

/// A built-in scalar type hint.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ScalarHint {
    /// `string`
    String,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `ID`
    Id,
}

impl ScalarHint {
    /// Recognizes a scalar keyword, case-insensitively.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "int" | "integer" => Self::Int,
            "float" | "double" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            "id" => Self::Id,
            _ => return None,
        })
    }

    /// Returns the keyword of this scalar, as written in doc comments.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Id => "ID",
        }
    }
}

/// A type hint, as declared in a doc comment or a signature.
///
/// This enum carries no semantic information and might refer to classes that
/// do not exist.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TypeHint {
    /// A class or an interface, e.g. `User`.
    Named(ClassName),
    /// A built-in scalar, e.g. `string`.
    Scalar(ScalarHint),
    /// A list of elements, e.g. `User[]`.
    Array(Box<TypeHint>),
    /// An optional value, e.g. `?User`.
    Nullable(Box<TypeHint>),
    /// A union of alternatives in declaration order, e.g. `ResultIterator|User[]`.
    Compound(Vec<TypeHint>),
}

impl TypeHint {
    /// Shortcut for a [`TypeHint::Named`] hint.
    pub fn named(class: impl Into<ClassName>) -> Self {
        Self::Named(class.into())
    }

    /// Shortcut for a [`TypeHint::Array`] of the given element.
    pub fn array_of(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    /// Shortcut for a [`TypeHint::Nullable`] wrapping the given hint.
    pub fn nullable(inner: Self) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Returns the class this hint refers to, if it's a [`TypeHint::Named`].
    pub fn class_name(&self) -> Option<&ClassName> {
        match self {
            Self::Named(class) => Some(class),
            _ => None,
        }
    }

    /// Returns the element type of an array hint, dropping one level of
    /// nullability on it.
    ///
    /// Returns [`None`] if this hint is not an array.
    pub fn array_element(&self) -> Option<&Self> {
        match self {
            Self::Array(element) => Some(element.without_nullable()),
            _ => None,
        }
    }

    /// Returns the hint wrapped by a [`TypeHint::Nullable`], or this hint
    /// itself.
    pub fn without_nullable(&self) -> &Self {
        match self {
            Self::Nullable(inner) => &**inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(class) => write!(f, "\\{class}"),
            Self::Scalar(scalar) => f.write_str(scalar.keyword()),
            Self::Array(element) => match **element {
                Self::Compound(_) | Self::Nullable(_) => write!(f, "({element})[]"),
                _ => write!(f, "{element}[]"),
            },
            Self::Nullable(inner) => match **inner {
                Self::Compound(_) => write!(f, "{inner}|null"),
                _ => write!(f, "?{inner}"),
            },
            Self::Compound(members) => write!(f, "{}", members.iter().format("|")),
        }
    }
}
