use std::sync::Arc;

use super::{RootTypeMapper, TopRootTypeMapper};
use crate::{
    ast::TypeHint,
    mappers::{MappingResult, RecursiveTypeMapper},
    reflection::{ClassIndex, MemberRef, ReflectionError, doc_block::DocBlock},
    schema::{
        meta::{GraphQLType, InputType, NamedType, OutputType, UnionMeta},
        registry::TypeRegistry,
    },
};

/// Splits the members of a compound type hint into the first iterable class
/// and the other members, in declaration order.
///
/// Returns [`None`] if no member is an iterable class. Members following the
/// iterable one are not reflected upon.
pub fn split_iterator_from_other_types<'h>(
    members: &'h [TypeHint],
    classes: &ClassIndex,
) -> Result<Option<(&'h TypeHint, Vec<&'h TypeHint>)>, ReflectionError> {
    for (idx, member) in members.iter().enumerate() {
        let Some(class) = member.class_name() else {
            continue;
        };
        if classes.is_iterable(class)? {
            let others = members[..idx].iter().chain(&members[idx + 1..]).collect();
            return Ok(Some((member, others)));
        }
    }
    Ok(None)
}

/// Maps compound type hints one member of which is an iterable class.
///
/// The other members are element hints parametrizing the iterable class, so
/// that `ResultIterator|User[]` maps to a `ResultIterator` of `User`s. Several
/// element hints produce a union of the parametrized iterables, in output
/// positions only.
pub struct IteratorTypeMapper {
    top: TopRootTypeMapper,
    type_registry: Arc<TypeRegistry>,
    recursive_type_mapper: Arc<dyn RecursiveTypeMapper>,
    class_index: Arc<ClassIndex>,
}

impl IteratorTypeMapper {
    /// Creates a new [`IteratorTypeMapper`] resolving members through `top`.
    pub fn new(
        top: TopRootTypeMapper,
        type_registry: Arc<TypeRegistry>,
        recursive_type_mapper: Arc<dyn RecursiveTypeMapper>,
        class_index: Arc<ClassIndex>,
    ) -> Self {
        Self {
            top,
            type_registry,
            recursive_type_mapper,
            class_index,
        }
    }

    /// Resolves a compound type hint with the given `resolve` delegate.
    ///
    /// Members failing with a recoverable error are dropped, unless all of
    /// them fail: then the iterable class alone is tried, and if that fails
    /// too the first error is returned. Several resolved types are combined
    /// with `combine`.
    fn to_graphql_type<T: GraphQLType>(
        &self,
        hint: &TypeHint,
        resolve: impl Fn(&TypeHint, Option<&T>) -> MappingResult<T>,
        combine: impl FnOnce(Vec<T>) -> MappingResult<T>,
    ) -> MappingResult<T> {
        let TypeHint::Compound(members) = hint else {
            return Ok(None);
        };
        let Some((iterator, others)) = split_iterator_from_other_types(members, &self.class_index)?
        else {
            tracing::trace!(%hint, "no iterable member, declining");
            return Ok(None);
        };
        tracing::trace!(%hint, %iterator, "found iterable member");

        let mut types = Vec::with_capacity(others.len());
        let mut first_failure = None;
        for member in others {
            let element = member.array_element();
            let parametrized = element
                .map(|e| resolve(e, None))
                .transpose()
                .map(Option::flatten)
                .and_then(|sub_type| {
                    // Element types parametrize iterables as nullable types.
                    let sub_type = sub_type.map(GraphQLType::nullable);
                    resolve(iterator, sub_type.as_ref())
                });
            match parametrized {
                Ok(Some(ty)) => types.push(ty),
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(%member, %iterator, %e, "cannot parametrize iterable by member");
                    if let Some(element) = element {
                        // The member is an array, let's use it as a plain list.
                        match resolve(element, None) {
                            Ok(Some(ty)) => {
                                tracing::debug!(%member, "falling back to a list");
                                types.push(ty.list_of().non_null());
                            }
                            Ok(None) => {}
                            Err(e) if e.is_recoverable() => {
                                tracing::debug!(%member, %e, "dropping member");
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    first_failure.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }

        if types.is_empty() {
            tracing::debug!(%iterator, "nothing parametrizes the iterable, resolving it alone");
            return match (resolve(iterator, None), first_failure) {
                (Err(e), Some(first)) if e.is_recoverable() => {
                    tracing::debug!(%iterator, %e, "iterable alone cannot be resolved either");
                    Err(first)
                }
                (resolved, _) => resolved,
            };
        }
        if types.len() == 1 {
            return Ok(types.pop());
        }
        combine(types)
    }
}

impl RootTypeMapper for IteratorTypeMapper {
    fn to_graphql_output_type(
        &self,
        hint: &TypeHint,
        _: Option<&OutputType>,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<OutputType> {
        self.to_graphql_type(
            hint,
            |hint, sub_type| {
                self.top
                    .to_graphql_output_type(hint, sub_type, method, doc_block)
            },
            |types| {
                let union = UnionMeta::new(types, self.recursive_type_mapper.clone()).into_meta();
                let union = self.type_registry.get_or_register_type(union)?;
                tracing::debug!(name = %union.name(), "built union of parametrized iterables");
                Ok(OutputType::named(union).map(GraphQLType::non_null))
            },
        )
    }

    fn to_graphql_input_type(
        &self,
        hint: &TypeHint,
        _: Option<&InputType>,
        argument: &str,
        method: &MemberRef,
        doc_block: &DocBlock,
    ) -> MappingResult<InputType> {
        self.to_graphql_type(
            hint,
            |hint, sub_type| {
                self.top
                    .to_graphql_input_type(hint, sub_type, argument, method, doc_block)
            },
            |types| {
                tracing::debug!(
                    %hint,
                    argument,
                    candidates = types.len(),
                    "input unions are not supported, declining",
                );
                Ok(None)
            },
        )
    }

    /// The unions built by this mapper are anonymous, so none of them can be
    /// looked up by name.
    fn map_name_to_type(&self, _: &str) -> MappingResult<NamedType> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::split_iterator_from_other_types;
    use crate::{
        ast::TypeHint,
        reflection::{ClassIndex, ClassInfo, ReflectionError},
    };

    fn index() -> ClassIndex {
        ClassIndex::new()
            .with(ClassInfo::class("App\\ResultIterator").implements("Iterator"))
            .with(ClassInfo::class("App\\Page").implements("IteratorAggregate"))
            .with(ClassInfo::class("App\\User"))
    }

    #[test]
    fn first_iterable_member_wins() {
        let members = [
            TypeHint::named("App\\User"),
            TypeHint::array_of(TypeHint::named("App\\User")),
            TypeHint::named("App\\Page"),
            TypeHint::named("App\\ResultIterator"),
        ];

        let (iterator, others) = split_iterator_from_other_types(&members, &index())
            .unwrap()
            .unwrap();

        assert_eq!(iterator, &members[2]);
        assert_eq!(others, vec![&members[0], &members[1], &members[3]]);
    }

    #[test]
    fn detects_iteration_interfaces_themselves() {
        for interface in ["Iterator", "IteratorAggregate"] {
            let members = [
                TypeHint::array_of(TypeHint::named("App\\User")),
                TypeHint::named(interface),
            ];

            let (iterator, others) = split_iterator_from_other_types(&members, &index())
                .unwrap()
                .unwrap();

            assert_eq!(iterator, &members[1]);
            assert_eq!(others, vec![&members[0]]);
        }
    }

    #[test]
    fn declines_without_iterable_member() {
        let members = [
            TypeHint::named("App\\User"),
            TypeHint::array_of(TypeHint::named("App\\ResultIterator")),
            TypeHint::nullable(TypeHint::named("App\\ResultIterator")),
        ];

        assert_eq!(split_iterator_from_other_types(&members, &index()), Ok(None));
    }

    #[test]
    fn unknown_class_before_iterable_is_fatal() {
        let members = [
            TypeHint::named("App\\Ghost"),
            TypeHint::named("App\\ResultIterator"),
        ];

        assert_eq!(
            split_iterator_from_other_types(&members, &index()),
            Err(ReflectionError::UnknownClass("App\\Ghost".into())),
        );

        let members = [members[1].clone(), members[0].clone()];
        assert!(split_iterator_from_other_types(&members, &index()).unwrap().is_some());
    }
}
