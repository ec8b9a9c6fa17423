//! Mapping of type hints to GraphQL types.

mod error;
pub mod root;

use crate::{
    reflection::ClassName,
    schema::meta::{InputType, NamedType, OutputType},
};

pub use self::error::{CannotMapTypeError, MappingError, MappingResult, TypeMappingRuntimeError};

/// Maps classes to the GraphQL types declared for them.
///
/// Unlike a [`RootTypeMapper`](root::RootTypeMapper), it never declines: a
/// class it doesn't know is an error.
pub trait RecursiveTypeMapper: Send + Sync {
    /// Maps a class to its GraphQL object or interface type.
    ///
    /// The `sub_type` parametrizes generic-like classes (such as iterators) by
    /// the type of their elements. Classes that can't be parametrized must
    /// refuse it with a [`TypeMappingRuntimeError`].
    fn map_class_to_interface_or_type(
        &self,
        class: &ClassName,
        sub_type: Option<&OutputType>,
    ) -> Result<OutputType, MappingError>;

    /// Maps a class to its GraphQL input type.
    fn map_class_to_input_type(&self, class: &ClassName) -> Result<InputType, MappingError>;

    /// Looks up a GraphQL type by its name.
    fn map_name_to_type(&self, name: &str) -> Result<NamedType, MappingError>;
}
