#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod ast;
pub mod cache;
pub mod mappers;
pub mod parameters;
pub mod parser;
pub mod reflection;
pub mod schema;

#[cfg(test)]
mod tests;

use static_assertions as sa;

pub use crate::{
    ast::{ScalarHint, TypeHint},
    cache::{ClassBoundCache, ClassBoundCacheExt, InMemoryClassBoundCache},
    mappers::{
        CannotMapTypeError, MappingError, MappingResult, RecursiveTypeMapper,
        TypeMappingRuntimeError,
        root::{
            BaseTypeMapper, CompositeRootTypeMapper, FinalRootTypeMapper, IteratorTypeMapper,
            RootTypeMapper, RootTypeMapperChain, RootTypeMapperChainBuilder, TopRootTypeMapper,
        },
    },
    parameters::{Arguments, AuthenticationService, InjectUserParameter, Parameter, ResolveInfo},
    parser::{TypeHintParseError, parse_type_hint},
    reflection::{
        ClassIndex, ClassInfo, ClassName, MemberRef, ReflectionError, Reflector,
        doc_block::{
            CachedDocBlockContextFactory, CachedDocBlockFactory, Context, DocBlock,
            DocBlockContextFactory, DocBlockFactory, ReflectionDocBlockContextFactory,
            ReflectionDocBlockFactory,
        },
    },
    schema::{
        meta::{self, GraphQLType, InputType, NamedType, OutputType},
        registry::{RegistryError, TypeRegistry},
    },
};

// Schemas are built once and shared by every query-serving thread.
sa::assert_impl_all!(TypeRegistry: Send, Sync);
sa::assert_impl_all!(InMemoryClassBoundCache: Send, Sync);
sa::assert_impl_all!(RootTypeMapperChain: Send, Sync);
sa::assert_impl_all!(CachedDocBlockFactory: Send, Sync);
sa::assert_impl_all!(CachedDocBlockContextFactory: Send, Sync);
sa::assert_impl_all!(NamedType: Send, Sync);
