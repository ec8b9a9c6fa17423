//! In-memory reflection over the declared classes a schema is built from.
//!
//! The [`ClassIndex`] plays the role of a runtime reflection API: it knows
//! every class and interface, their inheritance, the `use` aliases of the
//! file declaring them and the doc comments attached to their members.

pub mod doc_block;

use std::fmt;

use arcstr::ArcStr;
use derive_more::with_trait::{Display, Error};
use fnv::FnvHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fully qualified name of the sequential-access iteration interface.
pub const ITERATOR: &str = "Iterator";

/// Fully qualified name of the aggregate iteration interface.
pub const ITERATOR_AGGREGATE: &str = "IteratorAggregate";

/// Fully qualified class (or interface) name.
///
/// Leading namespace separators are stripped, so `\App\User` and `App\User`
/// name the same class.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ClassName(ArcStr);

impl ClassName {
    /// Creates a new [`ClassName`] out of the given fully qualified `name`.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim_start_matches('\\').into())
    }

    /// Returns this name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the unqualified part of this name, e.g. `User` for `App\User`.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('\\').next().unwrap_or(&self.0)
    }

    /// Returns the namespace part of this name, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('\\').map(|(ns, _)| ns)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Error raised when reflecting over a class the [`ClassIndex`] doesn't know.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum ReflectionError {
    /// The class doesn't exist.
    #[display("Class \"{_0}\" does not exist")]
    UnknownClass(#[error(not(source))] ClassName),

    /// The class exists, but doesn't declare the requested member.
    #[display("{kind} {class}::{name}() does not exist")]
    UnknownMember {
        /// Kind of the member, see [`Reflector::kind()`].
        kind: &'static str,
        /// Class the member was looked up on.
        class: ClassName,
        /// Name of the member.
        name: ArcStr,
    },
}

/// Reference to a member (method, property or constant) of a class.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MemberRef {
    /// Class declaring the member.
    pub class: ClassName,
    /// Name of the member.
    pub name: ArcStr,
}

impl MemberRef {
    /// Creates a new [`MemberRef`].
    pub fn new(class: impl Into<ClassName>, name: impl Into<ArcStr>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.name)
    }
}

/// A reflected symbol documentation can be attached to.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Reflector {
    /// A class or an interface.
    Class(ClassName),
    /// A method.
    Method(MemberRef),
    /// A property.
    Property(MemberRef),
    /// A class constant.
    ClassConstant(MemberRef),
}

impl Reflector {
    /// Returns the class declaring this symbol, or the class itself.
    pub fn declaring_class(&self) -> &ClassName {
        match self {
            Self::Class(class) => class,
            Self::Method(m) | Self::Property(m) | Self::ClassConstant(m) => &m.class,
        }
    }

    /// Returns the kind of this symbol.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Class(_) => "ReflectionClass",
            Self::Method(_) => "ReflectionMethod",
            Self::Property(_) => "ReflectionProperty",
            Self::ClassConstant(_) => "ReflectionClassConstant",
        }
    }

    /// Returns the name of this symbol.
    pub fn name(&self) -> &str {
        match self {
            Self::Class(class) => class.as_str(),
            Self::Method(m) | Self::Property(m) | Self::ClassConstant(m) => &m.name,
        }
    }
}

/// Reflection data of a single class or interface.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    #[doc(hidden)]
    pub name: ClassName,
    #[doc(hidden)]
    pub is_interface: bool,
    #[doc(hidden)]
    pub parent: Option<ClassName>,
    #[doc(hidden)]
    pub interfaces: Vec<ClassName>,
    #[doc(hidden)]
    pub uses: IndexMap<ArcStr, ClassName>,
    #[doc(hidden)]
    pub doc_comment: Option<ArcStr>,
    #[doc(hidden)]
    pub methods: IndexMap<ArcStr, Option<ArcStr>>,
    #[doc(hidden)]
    pub properties: IndexMap<ArcStr, Option<ArcStr>>,
    #[doc(hidden)]
    pub constants: IndexMap<ArcStr, Option<ArcStr>>,
}

impl ClassInfo {
    /// Starts describing a class with the given fully qualified `name`.
    pub fn class(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            is_interface: false,
            parent: None,
            interfaces: Vec::new(),
            uses: IndexMap::new(),
            doc_comment: None,
            methods: IndexMap::new(),
            properties: IndexMap::new(),
            constants: IndexMap::new(),
        }
    }

    /// Starts describing an interface with the given fully qualified `name`.
    pub fn interface(name: impl Into<ClassName>) -> Self {
        Self {
            is_interface: true,
            ..Self::class(name)
        }
    }

    /// Returns the fully qualified name of this class.
    pub fn name(&self) -> &ClassName {
        &self.name
    }

    /// Sets the parent class (or, for interfaces, adds a parent interface).
    #[must_use]
    pub fn extends(mut self, parent: impl Into<ClassName>) -> Self {
        if self.is_interface {
            self.interfaces.push(parent.into());
        } else {
            self.parent = Some(parent.into());
        }
        self
    }

    /// Adds a directly implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<ClassName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds a `use` import of the file declaring this class.
    ///
    /// Without an explicit `alias` the short name of `class` is used.
    #[must_use]
    pub fn uses(mut self, class: impl Into<ClassName>, alias: Option<&str>) -> Self {
        let class = class.into();
        let alias = ArcStr::from(alias.unwrap_or_else(|| class.short_name()));
        self.uses.insert(alias, class);
        self
    }

    /// Sets the doc comment of the class itself.
    #[must_use]
    pub fn doc_comment(mut self, comment: impl Into<ArcStr>) -> Self {
        self.doc_comment = Some(comment.into());
        self
    }

    /// Declares a method with an optional doc comment.
    #[must_use]
    pub fn method(mut self, name: impl Into<ArcStr>, doc_comment: Option<&str>) -> Self {
        self.methods.insert(name.into(), doc_comment.map(Into::into));
        self
    }

    /// Declares a property with an optional doc comment.
    #[must_use]
    pub fn property(mut self, name: impl Into<ArcStr>, doc_comment: Option<&str>) -> Self {
        self.properties
            .insert(name.into(), doc_comment.map(Into::into));
        self
    }

    /// Declares a class constant with an optional doc comment.
    #[must_use]
    pub fn constant(mut self, name: impl Into<ArcStr>, doc_comment: Option<&str>) -> Self {
        self.constants
            .insert(name.into(), doc_comment.map(Into::into));
        self
    }
}

/// Index of all the classes known at schema build time.
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: IndexMap<ClassName, ClassInfo>,
}

impl ClassIndex {
    /// Creates an empty [`ClassIndex`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class to this index, replacing any previous class of the same
    /// name.
    #[must_use]
    pub fn with(mut self, class: ClassInfo) -> Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    /// Indicates whether the given class is known.
    pub fn contains(&self, class: &ClassName) -> bool {
        self.classes.contains_key(class)
    }

    /// Looks up reflection data of the given class.
    pub fn reflect(&self, class: &ClassName) -> Result<&ClassInfo, ReflectionError> {
        self.classes
            .get(class)
            .ok_or_else(|| ReflectionError::UnknownClass(class.clone()))
    }

    /// Returns the doc comment attached to the given symbol, if any.
    pub fn doc_comment(&self, reflector: &Reflector) -> Result<Option<&ArcStr>, ReflectionError> {
        let info = self.reflect(reflector.declaring_class())?;
        let members = match reflector {
            Reflector::Class(_) => return Ok(info.doc_comment.as_ref()),
            Reflector::Method(_) => &info.methods,
            Reflector::Property(_) => &info.properties,
            Reflector::ClassConstant(_) => &info.constants,
        };
        members
            .get(reflector.name())
            .map(Option::as_ref)
            .ok_or_else(|| ReflectionError::UnknownMember {
                kind: reflector.kind(),
                class: reflector.declaring_class().clone(),
                name: reflector.name().into(),
            })
    }

    /// Checks whether `class` implements `interface`, directly or through
    /// its parents and the parents of its interfaces.
    ///
    /// An interface implements itself. The built-in [`ITERATOR`] and
    /// [`ITERATOR_AGGREGATE`] interfaces are known without being indexed.
    pub fn implements_interface(
        &self,
        class: &ClassName,
        interface: &ClassName,
    ) -> Result<bool, ReflectionError> {
        let mut seen = FnvHashSet::default();
        let mut pending = vec![class.clone()];
        while let Some(current) = pending.pop() {
            if current == *interface {
                return Ok(true);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            // Interfaces implemented by userland classes are not required to
            // be indexed (e.g. `Iterator` itself).
            let Some(info) = self.classes.get(&current) else {
                if &current == class && !is_builtin_interface(&current) {
                    return Err(ReflectionError::UnknownClass(current));
                }
                continue;
            };
            if info.interfaces.contains(interface) {
                return Ok(true);
            }
            pending.extend(info.interfaces.iter().cloned());
            pending.extend(info.parent.iter().cloned());
        }
        Ok(false)
    }

    /// Checks whether the given class can be iterated over, either as a
    /// sequential-access [`ITERATOR`] or as an [`ITERATOR_AGGREGATE`].
    pub fn is_iterable(&self, class: &ClassName) -> Result<bool, ReflectionError> {
        Ok(self.implements_interface(class, &ClassName::new(ITERATOR))?
            || self.implements_interface(class, &ClassName::new(ITERATOR_AGGREGATE))?)
    }
}

fn is_builtin_interface(class: &ClassName) -> bool {
    [ITERATOR, ITERATOR_AGGREGATE].contains(&class.as_str())
}
