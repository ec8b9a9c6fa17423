//! Registry of the named types of a schema.

use std::sync::{PoisonError, RwLock};

use arcstr::ArcStr;
use derive_more::with_trait::{Display, Error};
use indexmap::{IndexMap, map::Entry};

use super::meta::{NamedType, ScalarMeta};

/// Error raised when registering a type whose name is already taken.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum RegistryError {
    /// A type of this name is registered already.
    #[display("type \"{_0}\" is already registered")]
    AlreadyRegistered(#[error(not(source))] ArcStr),

    /// A type of this name is registered already, but of another kind.
    #[display("type \"{name}\" is already registered as {existing}, cannot register it as {requested}")]
    KindMismatch {
        /// Name of the type.
        name: ArcStr,
        /// Kind of the registered type.
        existing: &'static str,
        /// Kind of the type being registered.
        requested: &'static str,
    },
}

/// Registry of the named types making up a schema
///
/// Types are identified by their name: the first type registered under a name
/// is canonical, and structurally-equal anonymous types (such as unions of the
/// same members) collapse to that single instance.
#[derive(Debug)]
pub struct TypeRegistry {
    types: RwLock<IndexMap<ArcStr, NamedType>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Construct a new registry holding the built-in scalars
    pub fn new() -> Self {
        let types = ["String", "Int", "Float", "Boolean", "ID"]
            .into_iter()
            .map(|name| (ArcStr::from(name), ScalarMeta::new(name).into_meta()))
            .collect();
        Self {
            types: RwLock::new(types),
        }
    }

    /// Construct a new registry without any type
    pub fn empty() -> Self {
        Self {
            types: RwLock::new(IndexMap::new()),
        }
    }

    /// Registers the given type.
    ///
    /// Fails if a type of the same name is registered already.
    pub fn register_type(&self, named: NamedType) -> Result<(), RegistryError> {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        match types.entry(named.name().clone()) {
            Entry::Occupied(e) => Err(RegistryError::AlreadyRegistered(e.key().clone())),
            Entry::Vacant(e) => {
                tracing::debug!(name = %named.name(), kind = named.kind(), "registering type");
                e.insert(named);
                Ok(())
            }
        }
    }

    /// Get the canonical instance of the given type
    ///
    /// If the registry hasn't seen a type with this name before, the given
    /// type is registered and returned. Otherwise, the already registered
    /// instance is returned and the given one is dropped.
    pub fn get_or_register_type(&self, named: NamedType) -> Result<NamedType, RegistryError> {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        match types.entry(named.name().clone()) {
            Entry::Occupied(e) => {
                let existing = e.get();
                if existing.kind() != named.kind() {
                    return Err(RegistryError::KindMismatch {
                        name: e.key().clone(),
                        existing: existing.kind(),
                        requested: named.kind(),
                    });
                }
                Ok(existing.clone())
            }
            Entry::Vacant(e) => {
                tracing::debug!(name = %named.name(), kind = named.kind(), "registering type");
                Ok(e.insert(named).clone())
            }
        }
    }

    /// Indicates whether a type is registered under the given name.
    pub fn has_type(&self, name: &str) -> bool {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Looks up a registered type by its name.
    pub fn get_type(&self, name: &str) -> Option<NamedType> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns all the registered types, in registration order.
    pub fn types(&self) -> Vec<NamedType> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
