//! Types used to describe a GraphQL schema

use std::{fmt, sync::Arc};

use arcstr::ArcStr;
use derive_more::with_trait::{Deref, Display};

use crate::{
    mappers::{MappingError, RecursiveTypeMapper, TypeMappingRuntimeError},
    reflection::ClassName,
};

/// Scalar type metadata
#[derive(Debug)]
pub struct ScalarMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
}

/// Object type metadata
#[derive(Debug)]
pub struct ObjectMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<Field>,
    #[doc(hidden)]
    pub interface_names: Vec<ArcStr>,
}

/// Interface type metadata
#[derive(Debug)]
pub struct InterfaceMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<Field>,
}

/// Union type metadata
///
/// Unions are anonymous structural types: their name is derived from their
/// members, so that two unions of the same members are the same type once
/// registered in a [`TypeRegistry`](crate::TypeRegistry).
pub struct UnionMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub of_types: Vec<OutputType>,
    type_mapper: Arc<dyn RecursiveTypeMapper>,
}

/// Input object metadata
#[derive(Debug)]
pub struct InputObjectMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub input_fields: Vec<Argument>,
}

/// Metadata for a field
#[derive(Clone, Debug)]
pub struct Field {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub arguments: Vec<Argument>,
    #[doc(hidden)]
    pub field_type: OutputType,
}

/// Metadata for an argument to a field
#[derive(Clone, Debug)]
pub struct Argument {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub arg_type: InputType,
}

/// Generic named type metadata
///
/// Equality is by kind and name: a schema never holds two distinct named
/// types of the same name. Use [`NamedType::ptr_eq()`] to check identity.
#[derive(Clone, Debug)]
pub enum NamedType {
    #[doc(hidden)]
    Scalar(Arc<ScalarMeta>),
    #[doc(hidden)]
    Object(Arc<ObjectMeta>),
    #[doc(hidden)]
    Interface(Arc<InterfaceMeta>),
    #[doc(hidden)]
    Union(Arc<UnionMeta>),
    #[doc(hidden)]
    InputObject(Arc<InputObjectMeta>),
}

impl NamedType {
    /// Access the name of the type
    pub fn name(&self) -> &ArcStr {
        match self {
            Self::Scalar(m) => &m.name,
            Self::Object(m) => &m.name,
            Self::Interface(m) => &m.name,
            Self::Union(m) => &m.name,
            Self::InputObject(m) => &m.name,
        }
    }

    /// Access the description of the type, if any
    pub fn description(&self) -> Option<&ArcStr> {
        match self {
            Self::Scalar(m) => m.description.as_ref(),
            Self::Object(m) => m.description.as_ref(),
            Self::Interface(m) => m.description.as_ref(),
            Self::Union(m) => m.description.as_ref(),
            Self::InputObject(m) => m.description.as_ref(),
        }
    }

    /// Returns true if the type can be used in output positions
    ///
    /// Everything but input objects is an output type.
    pub fn is_output(&self) -> bool {
        !matches!(self, Self::InputObject(_))
    }

    /// Returns true if the type can be used in input positions
    ///
    /// Only scalars and input objects are input types.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::InputObject(_))
    }

    /// Returns true if the type is built-in to GraphQL.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Scalar(_))
            && ["Boolean", "String", "Int", "Float", "ID"].contains(&self.name().as_str())
    }

    /// Checks whether both types are the very same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Interface(a), Self::Interface(b)) => Arc::ptr_eq(a, b),
            (Self::Union(a), Self::Union(b)) => Arc::ptr_eq(a, b),
            (Self::InputObject(a), Self::InputObject(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns the introspection kind of the type, e.g. `OBJECT`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "SCALAR",
            Self::Object(_) => "OBJECT",
            Self::Interface(_) => "INTERFACE",
            Self::Union(_) => "UNION",
            Self::InputObject(_) => "INPUT_OBJECT",
        }
    }
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.name() == other.name()
    }
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A possibly wrapped reference to a [`NamedType`]
#[derive(Clone, Debug, PartialEq)]
pub enum WrappedType {
    /// A nullable named type, e.g. `User`
    Named(NamedType),
    /// A nullable list type, e.g. `[User]`
    List(Box<WrappedType>),
    /// A non-null type, e.g. `User!` or `[User]!`
    NonNull(Box<WrappedType>),
}

impl WrappedType {
    /// Returns the named type wrapped by this type.
    pub fn innermost(&self) -> &NamedType {
        match self {
            Self::Named(n) => n,
            Self::List(inner) | Self::NonNull(inner) => inner.innermost(),
        }
    }

    /// Returns true if this type is wrapped into a non-null.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Returns true if this type is a (possibly non-null) list.
    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            Self::Named(_) => false,
        }
    }

    /// Name fragment this type contributes to the name of a union.
    fn union_name_fragment(&self) -> String {
        match self {
            Self::Named(n) => n.name().to_string(),
            Self::List(inner) => format!("ListOf{}", inner.union_name_fragment()),
            Self::NonNull(inner) => inner.union_name_fragment(),
        }
    }

    fn list_of(self) -> Self {
        Self::List(Box::new(self))
    }

    fn non_null(self) -> Self {
        match self {
            t @ Self::NonNull(_) => t,
            t => Self::NonNull(Box::new(t)),
        }
    }

    fn nullable(self) -> Self {
        match self {
            Self::NonNull(inner) => *inner,
            t => t,
        }
    }
}

impl fmt::Display for WrappedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => write!(f, "{n}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Type that may appear in output positions: field types and union members.
///
/// Can only wrap output-capable named types.
#[derive(Clone, Debug, Deref, Display, PartialEq)]
pub struct OutputType(WrappedType);

/// Type that may appear in input positions: argument types and input fields.
///
/// Can only wrap input-capable named types.
#[derive(Clone, Debug, Deref, Display, PartialEq)]
pub struct InputType(WrappedType);

/// Operations shared by [`OutputType`] and [`InputType`].
///
/// The wrapping operations preserve the capability of the wrapped named type,
/// so they are available on both kinds of types alike.
pub trait GraphQLType: Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Wraps this type into a nullable list, e.g. `User!` into `[User!]`.
    #[must_use]
    fn list_of(self) -> Self;

    /// Wraps this type into a non-null, unless it's non-null already.
    #[must_use]
    fn non_null(self) -> Self;

    /// Strips the outermost non-null wrapper, if any.
    #[must_use]
    fn nullable(self) -> Self;

    /// Access the underlying [`WrappedType`].
    fn as_wrapped(&self) -> &WrappedType;
}

macro_rules! impl_graphql_type {
    ($ty:ident) => {
        impl GraphQLType for $ty {
            fn list_of(self) -> Self {
                Self(self.0.list_of())
            }

            fn non_null(self) -> Self {
                Self(self.0.non_null())
            }

            fn nullable(self) -> Self {
                Self(self.0.nullable())
            }

            fn as_wrapped(&self) -> &WrappedType {
                &self.0
            }
        }
    };
}

impl_graphql_type!(OutputType);
impl_graphql_type!(InputType);

impl OutputType {
    /// Wraps the given named type, if it's output-capable.
    pub fn named(named: NamedType) -> Option<Self> {
        named
            .is_output()
            .then(|| Self(WrappedType::Named(named)))
    }

    /// Nullable reference to a scalar.
    pub fn scalar(meta: Arc<ScalarMeta>) -> Self {
        Self(WrappedType::Named(NamedType::Scalar(meta)))
    }

    /// Nullable reference to an object.
    pub fn object(meta: Arc<ObjectMeta>) -> Self {
        Self(WrappedType::Named(NamedType::Object(meta)))
    }

    /// Nullable reference to an interface.
    pub fn interface(meta: Arc<InterfaceMeta>) -> Self {
        Self(WrappedType::Named(NamedType::Interface(meta)))
    }

    /// Nullable reference to a union.
    pub fn union(meta: Arc<UnionMeta>) -> Self {
        Self(WrappedType::Named(NamedType::Union(meta)))
    }
}

impl InputType {
    /// Wraps the given named type, if it's input-capable.
    pub fn named(named: NamedType) -> Option<Self> {
        named.is_input().then(|| Self(WrappedType::Named(named)))
    }

    /// Nullable reference to a scalar.
    pub fn scalar(meta: Arc<ScalarMeta>) -> Self {
        Self(WrappedType::Named(NamedType::Scalar(meta)))
    }

    /// Nullable reference to an input object.
    pub fn input_object(meta: Arc<InputObjectMeta>) -> Self {
        Self(WrappedType::Named(NamedType::InputObject(meta)))
    }
}

impl ScalarMeta {
    /// Builds a new [`ScalarMeta`] type with the specified `name`.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the `description` of this [`ScalarMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`ScalarMeta`] type into a generic [`NamedType`].
    pub fn into_meta(self) -> NamedType {
        NamedType::Scalar(Arc::new(self))
    }
}

impl ObjectMeta {
    /// Build a new [`ObjectMeta`] type with the specified `name` and `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: &[Field]) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.to_vec(),
            interface_names: vec![],
        }
    }

    /// Sets the `description` of this [`ObjectMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the `interfaces` this [`ObjectMeta`] type implements.
    ///
    /// Overwrites any previously set list of interfaces.
    #[must_use]
    pub fn interfaces(mut self, interfaces: &[OutputType]) -> Self {
        self.interface_names = interfaces
            .iter()
            .map(|t| t.innermost().name().clone())
            .collect();
        self
    }

    /// Access a field's meta data given its name
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Wraps this [`ObjectMeta`] type into a generic [`NamedType`].
    pub fn into_meta(self) -> NamedType {
        NamedType::Object(Arc::new(self))
    }
}

impl InterfaceMeta {
    /// Builds a new [`InterfaceMeta`] type with the specified `name` and
    /// `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: &[Field]) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.to_vec(),
        }
    }

    /// Wraps this [`InterfaceMeta`] type into a generic [`NamedType`].
    pub fn into_meta(self) -> NamedType {
        NamedType::Interface(Arc::new(self))
    }
}

impl UnionMeta {
    /// Build a new anonymous [`UnionMeta`] type of the given members.
    ///
    /// The union is named `Union` followed by the names of its members, list
    /// members contributing `ListOf` followed by their element name.
    /// The `type_mapper` resolves runtime values to member types.
    pub fn new(of_types: Vec<OutputType>, type_mapper: Arc<dyn RecursiveTypeMapper>) -> Self {
        let name = of_types
            .iter()
            .fold(String::from("Union"), |mut name, t| {
                name.push_str(&t.union_name_fragment());
                name
            });
        Self {
            name: name.into(),
            description: None,
            of_types,
            type_mapper,
        }
    }

    /// Resolves the member type of a runtime value of the given `class`.
    pub fn resolve_type(&self, class: &ClassName) -> Result<OutputType, MappingError> {
        let resolved = self
            .type_mapper
            .map_class_to_interface_or_type(class, None)?;
        let resolved_name = resolved.innermost().name();
        self.of_types
            .iter()
            .find(|t| t.innermost().name() == resolved_name)
            .cloned()
            .ok_or_else(|| {
                TypeMappingRuntimeError::new(format!(
                    "object of class \"{class}\" resolves to \"{resolved_name}\", \
                     which is not a member of union \"{}\"",
                    self.name,
                ))
                .into()
            })
    }

    /// Wraps this [`UnionMeta`] type into a generic [`NamedType`].
    pub fn into_meta(self) -> NamedType {
        NamedType::Union(Arc::new(self))
    }
}

impl InputObjectMeta {
    /// Builds a new [`InputObjectMeta`] type with the specified `name` and
    /// `input_fields`.
    pub fn new(name: impl Into<ArcStr>, input_fields: &[Argument]) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_fields: input_fields.to_vec(),
        }
    }

    /// Wraps this [`InputObjectMeta`] type into a generic [`NamedType`].
    pub fn into_meta(self) -> NamedType {
        NamedType::InputObject(Arc::new(self))
    }
}

impl Field {
    /// Builds a new [`Field`] of the given [`OutputType`] with the given
    /// `name`.
    pub fn new(name: impl Into<ArcStr>, field_type: OutputType) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: vec![],
            field_type,
        }
    }

    /// Set the `description` of this [`Field`].
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an `argument` to this [`Field`].
    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }
}

impl Argument {
    /// Builds a new [`Argument`] of the given [`InputType`] with the given
    /// `name`.
    pub fn new(name: impl Into<ArcStr>, arg_type: InputType) -> Self {
        Self {
            name: name.into(),
            description: None,
            arg_type,
        }
    }
}

impl fmt::Debug for UnionMeta {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("UnionMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("of_types", &self.of_types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        Argument, Field, GraphQLType as _, InputObjectMeta, InputType, InterfaceMeta, NamedType,
        ObjectMeta, OutputType, ScalarMeta,
    };

    #[test]
    fn capabilities_are_disjoint() {
        let input = InputObjectMeta::new("UserInput", &[]).into_meta();
        let object = ObjectMeta::new("User", &[]).into_meta();
        let scalar = ScalarMeta::new("String").into_meta();

        assert!(OutputType::named(input.clone()).is_none());
        assert!(InputType::named(object.clone()).is_none());
        assert!(OutputType::named(object).is_some());
        assert!(InputType::named(input).is_some());
        assert!(OutputType::named(scalar.clone()).is_some());
        assert!(InputType::named(scalar).is_some());
    }

    #[test]
    fn displays_wrapping() {
        let user = OutputType::object(Arc::new(ObjectMeta::new("User", &[])));

        assert_eq!(user.clone().non_null().list_of().non_null().to_string(), "[User!]!");
        assert_eq!(user.clone().non_null().non_null().to_string(), "User!");
        assert_eq!(user.clone().non_null().nullable(), user);
        assert!(user.clone().list_of().non_null().is_list());
    }

    #[test]
    fn named_types_compare_by_kind_and_name() {
        let a = ObjectMeta::new("User", &[]).into_meta();
        let b = ObjectMeta::new("User", &[]).into_meta();

        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
        assert_ne!(a, InputObjectMeta::new("User", &[]).into_meta());
        assert!(matches!(a, NamedType::Object(_)));
    }

    #[test]
    fn builds_object_types() {
        let string = Arc::new(ScalarMeta::new("String").description("UTF-8 text"));
        let node = OutputType::interface(Arc::new(InterfaceMeta::new(
            "Node",
            &[Field::new("id", OutputType::scalar(string.clone()).non_null())],
        )));
        let posts = Field::new("posts", OutputType::scalar(string.clone()).list_of())
            .description("Posts written by the user")
            .argument(Argument::new("first", InputType::scalar(string.clone())));

        let user = ObjectMeta::new("User", &[posts])
            .description("Author of posts")
            .interfaces(&[node]);

        assert_eq!(
            user.interface_names.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
            ["Node"],
        );
        let field = user.field_by_name("posts").unwrap();
        assert_eq!(field.description.as_deref(), Some("Posts written by the user"));
        assert_eq!(field.arguments[0].name.as_str(), "first");
        assert!(!field.field_type.is_non_null());
        assert!(field.field_type.is_list());
        assert!(user.field_by_name("id").is_none());

        let user = user.into_meta();
        assert_eq!(user.description().map(|d| d.as_str()), Some("Author of posts"));
        assert_eq!(
            NamedType::Scalar(string).description().map(|d| d.as_str()),
            Some("UTF-8 text"),
        );
    }
}
