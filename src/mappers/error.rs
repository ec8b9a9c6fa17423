use derive_more::with_trait::{Display, Error};

use crate::{
    ast::TypeHint,
    reflection::{ClassName, MemberRef, ReflectionError},
    schema::registry::RegistryError,
};

/// Result of asking a mapper to map something.
///
/// `Ok(None)` means the mapper declines, letting the next one try.
pub type MappingResult<T> = Result<Option<T>, MappingError>;

/// Error raised when a type hint has no GraphQL counterpart.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("{message}")]
pub struct CannotMapTypeError {
    message: String,
    has_location: bool,
}

impl CannotMapTypeError {
    /// Creates a new [`CannotMapTypeError`] with the given `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            has_location: false,
        }
    }

    /// Error for a type hint no mapper knows how to map.
    pub fn for_type_hint(hint: &TypeHint) -> Self {
        Self::new(format!("don't know how to handle type {hint}"))
    }

    /// Error for a class that cannot be mapped to a GraphQL type.
    pub fn for_class(class: &ClassName) -> Self {
        Self::new(format!("cannot map class \"{class}\" to a known GraphQL type"))
    }

    /// Error for a GraphQL type name nothing is registered under.
    pub fn for_name(name: &str) -> Self {
        Self::new(format!("cannot find GraphQL type \"{name}\""))
    }

    /// Error for a class mapped to an output type used in input position.
    pub fn for_input_class(class: &ClassName) -> Self {
        Self::new(format!(
            "cannot map class \"{class}\" to a GraphQL input type: it is not an input type",
        ))
    }

    /// Prefixes the message with the method whose return type failed.
    ///
    /// Only the first location added is kept.
    #[must_use]
    pub fn with_return_info(mut self, method: &MemberRef) -> Self {
        if !self.has_location {
            self.message = format!("For return type of {method}, {}", self.message);
            self.has_location = true;
        }
        self
    }

    /// Prefixes the message with the parameter whose type failed.
    ///
    /// Only the first location added is kept.
    #[must_use]
    pub fn with_param_info(mut self, argument: &str, method: &MemberRef) -> Self {
        if !self.has_location {
            self.message = format!(
                "For parameter ${argument}, in {method}, {}",
                self.message,
            );
            self.has_location = true;
        }
        self
    }

    /// Returns the human-readable message of this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error raised when a mapper is given a type shape it cannot work with.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("{message}")]
pub struct TypeMappingRuntimeError {
    message: String,
}

impl TypeMappingRuntimeError {
    /// Creates a new [`TypeMappingRuntimeError`] with the given `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error for a class that needs a sub-type but was given none, or the
    /// other way round.
    pub fn unexpected_sub_type(class: &ClassName, sub_type: Option<&str>) -> Self {
        Self::new(match sub_type {
            Some(sub_type) => format!("class \"{class}\" cannot be parametrized by \"{sub_type}\""),
            None => format!("class \"{class}\" must be parametrized by an element type"),
        })
    }
}

/// Error flowing through the root type mapper chain.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum MappingError {
    /// The type shape cannot be mapped. Recoverable.
    CannotMapType(CannotMapTypeError),

    /// A mapper could not handle the type shape it was given. Recoverable.
    TypeMappingRuntime(TypeMappingRuntimeError),

    /// Reflection data is inconsistent with the type hints. Fatal.
    Reflection(ReflectionError),

    /// A type could not be registered into the schema. Fatal.
    Registry(RegistryError),

    /// A chain link re-entered the chain before it was assembled. Fatal.
    #[display("the root type mapper chain was used before being assembled")]
    UnboundTopMapper,
}

impl MappingError {
    /// Indicates whether this error only means "this particular type shape
    /// could not be mapped", as opposed to a configuration or programming
    /// error that must abort schema construction.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CannotMapType(_) | Self::TypeMappingRuntime(_))
    }
}

impl From<CannotMapTypeError> for MappingError {
    fn from(e: CannotMapTypeError) -> Self {
        Self::CannotMapType(e)
    }
}

impl From<TypeMappingRuntimeError> for MappingError {
    fn from(e: TypeMappingRuntimeError) -> Self {
        Self::TypeMappingRuntime(e)
    }
}

impl From<RegistryError> for MappingError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<ReflectionError> for MappingError {
    fn from(e: ReflectionError) -> Self {
        Self::Reflection(e)
    }
}

#[cfg(test)]
mod tests {
    use super::{CannotMapTypeError, MappingError, TypeMappingRuntimeError};
    use crate::reflection::{MemberRef, ReflectionError};

    #[test]
    fn keeps_first_location_only() {
        let method = MemberRef::new("App\\UserController", "getUsers");
        let err = CannotMapTypeError::for_name("Foo")
            .with_return_info(&method)
            .with_param_info("id", &method);

        assert_eq!(
            err.to_string(),
            "For return type of App\\UserController::getUsers, \
             cannot find GraphQL type \"Foo\"",
        );
    }

    #[test]
    fn classifies_recoverable_errors() {
        assert!(MappingError::from(CannotMapTypeError::new("x")).is_recoverable());
        assert!(MappingError::from(TypeMappingRuntimeError::new("x")).is_recoverable());
        assert!(!MappingError::from(ReflectionError::UnknownClass("X".into())).is_recoverable());
        assert!(!MappingError::UnboundTopMapper.is_recoverable());
    }
}
