use std::sync::Arc;

use super::{RootTypeMapper, TopRootTypeMapper};
use crate::{
    ast::{ScalarHint, TypeHint},
    mappers::{CannotMapTypeError, MappingResult, RecursiveTypeMapper},
    reflection::{MemberRef, doc_block::DocBlock},
    schema::{
        meta::{GraphQLType, InputType, NamedType, OutputType},
        registry::TypeRegistry,
    },
};

/// Name of the built-in GraphQL scalar a scalar type hint maps to.
fn scalar_name(scalar: ScalarHint) -> &'static str {
    match scalar {
        ScalarHint::String => "String",
        ScalarHint::Int => "Int",
        ScalarHint::Float => "Float",
        ScalarHint::Bool => "Boolean",
        ScalarHint::Id => "ID",
    }
}

/// Maps the plain shapes of type hints: scalars, classes, arrays and
/// nullables.
///
/// Types are non-null unless hinted as nullable. Compound hints are declined.
pub struct BaseTypeMapper {
    top: TopRootTypeMapper,
    type_registry: Arc<TypeRegistry>,
    recursive_type_mapper: Arc<dyn RecursiveTypeMapper>,
}

impl BaseTypeMapper {
    /// Creates a new [`BaseTypeMapper`] resolving nested type hints through
    /// `top`.
    pub fn new(
        top: TopRootTypeMapper,
        type_registry: Arc<TypeRegistry>,
        recursive_type_mapper: Arc<dyn RecursiveTypeMapper>,
    ) -> Self {
        Self {
            top,
            type_registry,
            recursive_type_mapper,
        }
    }

    fn scalar(&self, scalar: ScalarHint) -> Result<NamedType, CannotMapTypeError> {
        let name = scalar_name(scalar);
        self.type_registry
            .get_type(name)
            .ok_or_else(|| CannotMapTypeError::for_name(name))
    }
}

impl RootTypeMapper for BaseTypeMapper {
    fn to_graphql_output_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&OutputType>,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<OutputType> {
        let ty = match hint {
            TypeHint::Scalar(scalar) => OutputType::named(self.scalar(*scalar)?),
            TypeHint::Named(class) => Some(
                self.recursive_type_mapper
                    .map_class_to_interface_or_type(class, sub_type)?,
            ),
            TypeHint::Array(element) => self
                .top
                .to_graphql_output_type(element, None, method, doc_block)?
                .map(GraphQLType::list_of),
            TypeHint::Nullable(inner) => {
                return Ok(self
                    .top
                    .to_graphql_output_type(inner, sub_type, method, doc_block)?
                    .map(GraphQLType::nullable));
            }
            TypeHint::Compound(_) => None,
        };
        Ok(ty.map(GraphQLType::non_null))
    }

    fn to_graphql_input_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&InputType>,
        argument: &str,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<InputType> {
        let ty = match hint {
            TypeHint::Scalar(scalar) => InputType::named(self.scalar(*scalar)?),
            TypeHint::Named(class) => Some(self.recursive_type_mapper.map_class_to_input_type(class)?),
            TypeHint::Array(element) => self
                .top
                .to_graphql_input_type(element, None, argument, method, doc_block)?
                .map(GraphQLType::list_of),
            TypeHint::Nullable(inner) => {
                return Ok(self
                    .top
                    .to_graphql_input_type(inner, sub_type, argument, method, doc_block)?
                    .map(GraphQLType::nullable));
            }
            TypeHint::Compound(_) => None,
        };
        Ok(ty.map(GraphQLType::non_null))
    }

    fn map_name_to_type(&self, name: &str) -> MappingResult<NamedType> {
        if let Some(ty) = self.type_registry.get_type(name) {
            return Ok(Some(ty));
        }
        self.recursive_type_mapper.map_name_to_type(name).map(Some)
    }
}

/// Last link of the chain: fails on whatever the previous links declined.
#[derive(Clone, Copy, Debug, Default)]
pub struct FinalRootTypeMapper;

impl RootTypeMapper for FinalRootTypeMapper {
    fn to_graphql_output_type(
        &self,
        hint: &TypeHint,
        _: Option<&OutputType>,
        method: &MemberRef,
        _: &DocBlock,
    ) -> MappingResult<OutputType> {
        tracing::debug!(%hint, %method, "no root type mapper could map the return type");
        Err(CannotMapTypeError::for_type_hint(hint)
            .with_return_info(method)
            .into())
    }

    fn to_graphql_input_type(
        &self,
        hint: &TypeHint,
        _: Option<&InputType>,
        argument: &str,
        method: &MemberRef,
        _: &DocBlock,
    ) -> MappingResult<InputType> {
        tracing::debug!(%hint, %method, argument, "no root type mapper could map the parameter type");
        Err(CannotMapTypeError::for_type_hint(hint)
            .with_param_info(argument, method)
            .into())
    }

    fn map_name_to_type(&self, name: &str) -> MappingResult<NamedType> {
        Err(CannotMapTypeError::for_name(name).into())
    }
}
