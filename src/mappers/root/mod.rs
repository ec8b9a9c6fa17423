//! The root type mapper chain.
//!
//! A type hint is offered to every link of the chain in turn, until one of
//! them maps it. Links resolving nested type hints (array elements, union
//! members) do so through the [`TopRootTypeMapper`], so that the whole chain
//! takes part in resolving them, not just the link itself.

mod base;
mod iterator;

use std::sync::{Arc, OnceLock, Weak};

use crate::{
    ast::TypeHint,
    mappers::{CannotMapTypeError, MappingError, MappingResult, RecursiveTypeMapper},
    reflection::{ClassIndex, MemberRef, doc_block::DocBlock},
    schema::{
        meta::{InputType, NamedType, OutputType},
        registry::TypeRegistry,
    },
};

pub use self::{
    base::{BaseTypeMapper, FinalRootTypeMapper},
    iterator::{IteratorTypeMapper, split_iterator_from_other_types},
};

/// A link of the root type mapper chain.
///
/// Each operation returns `Ok(None)` to decline, letting the next link try.
pub trait RootTypeMapper: Send + Sync {
    /// Maps the type hint of a return value (or a property) to an output type.
    ///
    /// The `sub_type` is the element type parametrizing the hinted class, if
    /// the caller resolved one.
    fn to_graphql_output_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&OutputType>,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<OutputType>;

    /// Maps the type hint of the `argument` parameter of `method` to an input
    /// type.
    fn to_graphql_input_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&InputType>,
        argument: &str,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<InputType>;

    /// Looks up a GraphQL type this link is able to produce by its name.
    fn map_name_to_type(&self, name: &str) -> MappingResult<NamedType>;
}

/// Handle on the head of the root type mapper chain.
///
/// Links are created before the chain they belong to, so the handle is bound
/// once the chain is assembled. It only holds a weak reference: the chain owns
/// its links, not the other way round.
#[derive(Clone, Default)]
pub struct TopRootTypeMapper {
    chain: Arc<OnceLock<Weak<dyn RootTypeMapper>>>,
}

impl TopRootTypeMapper {
    /// Creates an unbound handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds this handle (and all its clones) to the given chain.
    ///
    /// Returns `false` if it was bound already, in which case it's left
    /// untouched.
    pub fn bind(&self, chain: &Arc<dyn RootTypeMapper>) -> bool {
        self.chain.set(Arc::downgrade(chain)).is_ok()
    }

    /// Indicates whether this handle was bound to a chain.
    pub fn is_bound(&self) -> bool {
        self.chain.get().is_some()
    }

    fn chain(&self) -> Result<Arc<dyn RootTypeMapper>, MappingError> {
        self.chain
            .get()
            .and_then(Weak::upgrade)
            .ok_or(MappingError::UnboundTopMapper)
    }
}

impl RootTypeMapper for TopRootTypeMapper {
    fn to_graphql_output_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&OutputType>,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<OutputType> {
        self.chain()?
            .to_graphql_output_type(hint, sub_type, method, doc_block)
    }

    fn to_graphql_input_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&InputType>,
        argument: &str,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<InputType> {
        self.chain()?
            .to_graphql_input_type(hint, sub_type, argument, method, doc_block)
    }

    fn map_name_to_type(&self, name: &str) -> MappingResult<NamedType> {
        self.chain()?.map_name_to_type(name)
    }
}

/// Tries each of its links in order, the first one not declining wins.
///
/// Errors are not caught: a failing link fails the whole composite.
pub struct CompositeRootTypeMapper {
    mappers: Vec<Arc<dyn RootTypeMapper>>,
}

impl CompositeRootTypeMapper {
    /// Creates a composite of the given links, in order of precedence.
    pub fn new(mappers: Vec<Arc<dyn RootTypeMapper>>) -> Self {
        Self { mappers }
    }

    fn first_mapped<T>(
        &self,
        mut map: impl FnMut(&dyn RootTypeMapper) -> MappingResult<T>,
    ) -> MappingResult<T> {
        for mapper in &self.mappers {
            if let Some(mapped) = map(mapper.as_ref())? {
                return Ok(Some(mapped));
            }
        }
        Ok(None)
    }
}

impl RootTypeMapper for CompositeRootTypeMapper {
    fn to_graphql_output_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&OutputType>,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<OutputType> {
        self.first_mapped(|m| m.to_graphql_output_type(hint, sub_type, method, doc_block))
    }

    fn to_graphql_input_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&InputType>,
        argument: &str,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<InputType> {
        self.first_mapped(|m| m.to_graphql_input_type(hint, sub_type, argument, method, doc_block))
    }

    fn map_name_to_type(&self, name: &str) -> MappingResult<NamedType> {
        self.first_mapped(|m| m.map_name_to_type(name))
    }
}

/// Builder of a [`RootTypeMapperChain`].
pub struct RootTypeMapperChainBuilder {
    top: TopRootTypeMapper,
    mappers: Vec<Arc<dyn RootTypeMapper>>,
    type_registry: Arc<TypeRegistry>,
    recursive_type_mapper: Arc<dyn RecursiveTypeMapper>,
    class_index: Arc<ClassIndex>,
}

impl RootTypeMapperChainBuilder {
    /// Returns the handle on the chain being built, for custom links to
    /// resolve nested type hints with.
    pub fn top(&self) -> &TopRootTypeMapper {
        &self.top
    }

    /// Adds a custom link, tried before the built-in ones and after the
    /// previously added custom links.
    #[must_use]
    pub fn mapper(mut self, mapper: Arc<dyn RootTypeMapper>) -> Self {
        self.mappers.push(mapper);
        self
    }

    /// Assembles the chain.
    pub fn build(self) -> RootTypeMapperChain {
        let Self {
            top,
            mut mappers,
            type_registry,
            recursive_type_mapper,
            class_index,
        } = self;

        mappers.push(Arc::new(IteratorTypeMapper::new(
            top.clone(),
            type_registry.clone(),
            recursive_type_mapper.clone(),
            class_index,
        )));
        mappers.push(Arc::new(BaseTypeMapper::new(
            top.clone(),
            type_registry,
            recursive_type_mapper,
        )));
        mappers.push(Arc::new(FinalRootTypeMapper));
        tracing::debug!(links = mappers.len(), "assembled root type mapper chain");

        let root: Arc<dyn RootTypeMapper> = Arc::new(CompositeRootTypeMapper::new(mappers));
        top.bind(&root);
        RootTypeMapperChain { root, top }
    }
}

/// The assembled root type mapper chain.
///
/// Custom links come first, then the [`IteratorTypeMapper`], the
/// [`BaseTypeMapper`] and finally the [`FinalRootTypeMapper`] failing on
/// whatever no other link could map.
pub struct RootTypeMapperChain {
    root: Arc<dyn RootTypeMapper>,
    top: TopRootTypeMapper,
}

impl RootTypeMapperChain {
    /// Starts building a chain mapping classes with the given
    /// `recursive_type_mapper`, registering the anonymous types it creates
    /// into `type_registry` and reflecting over `class_index`.
    pub fn builder(
        type_registry: Arc<TypeRegistry>,
        recursive_type_mapper: Arc<dyn RecursiveTypeMapper>,
        class_index: Arc<ClassIndex>,
    ) -> RootTypeMapperChainBuilder {
        RootTypeMapperChainBuilder {
            top: TopRootTypeMapper::new(),
            mappers: vec![],
            type_registry,
            recursive_type_mapper,
            class_index,
        }
    }

    /// Returns the handle on this chain.
    pub fn top(&self) -> &TopRootTypeMapper {
        &self.top
    }

    /// Maps the return type hint of `method`.
    ///
    /// Errors mention the `method` they occurred in.
    pub fn output_type_for_return(
        &self,
        hint: &TypeHint,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> Result<OutputType, MappingError> {
        match self.root.to_graphql_output_type(hint, None, method, doc_block) {
            Ok(Some(ty)) => Ok(ty),
            Ok(None) => Err(CannotMapTypeError::for_type_hint(hint)
                .with_return_info(method)
                .into()),
            Err(MappingError::CannotMapType(e)) => Err(e.with_return_info(method).into()),
            Err(e) => Err(e),
        }
    }

    /// Maps the type hint of the `argument` parameter of `method`.
    ///
    /// Errors mention the `argument` they occurred in.
    pub fn input_type_for_parameter(
        &self,
        hint: &TypeHint,
        argument: &str,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> Result<InputType, MappingError> {
        match self
            .root
            .to_graphql_input_type(hint, None, argument, method, doc_block)
        {
            Ok(Some(ty)) => Ok(ty),
            Ok(None) => Err(CannotMapTypeError::for_type_hint(hint)
                .with_param_info(argument, method)
                .into()),
            Err(MappingError::CannotMapType(e)) => Err(e.with_param_info(argument, method).into()),
            Err(e) => Err(e),
        }
    }
}

impl RootTypeMapper for RootTypeMapperChain {
    fn to_graphql_output_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&OutputType>,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<OutputType> {
        self.root
            .to_graphql_output_type(hint, sub_type, method, doc_block)
    }

    fn to_graphql_input_type(
        &self,
        hint: &TypeHint,
        sub_type: Option<&InputType>,
        argument: &str,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<InputType> {
        self.root
            .to_graphql_input_type(hint, sub_type, argument, method, doc_block)
    }

    fn map_name_to_type(&self, name: &str) -> MappingResult<NamedType> {
        self.root.map_name_to_type(name)
    }
}
