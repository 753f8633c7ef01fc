// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Namespace assembly: runs the discovery strategies over the registered
//! sources, groups resolvers by name, builds operations, and exposes lookup
//! by (trail, name) plus the nestable-operations-by-type view the schema
//! layer consumes.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use ingraph_core_model::mapped_arena::MappedArena;
use ingraph_core_model::operation::{Operation, OperationKind};
use ingraph_core_model::resolver::Resolver;
use ingraph_core_model::type_algebra::{GraphType, TypeArena, TypeId, TypeShape};

use crate::builder::operation_builder::OperationBuilder;
use crate::builder::source_repository::OperationSourceRepository;
use crate::config::BuildConfig;
use crate::error::ModelBuildingError;

/// The fully assembled, immutable operation namespace.
pub struct OperationRegistry {
    root_queries: MappedArena<String, Arc<Operation>>,
    root_mutations: MappedArena<String, Arc<Operation>>,
    root_subscriptions: MappedArena<String, Arc<Operation>>,
    nested: Vec<Arc<Operation>>,
    /// Raw-class name of the registered domain type -> indices into `nested`.
    nested_by_type: HashMap<String, Vec<usize>>,
}

/// The raw class a result type attaches nested operations by: collection
/// results (arrays) attach by their element type.
fn attachment_raw(typ: &GraphType, _arena: &TypeArena) -> Option<TypeId> {
    match &typ.shape {
        TypeShape::Array(component) => attachment_raw(component, _arena),
        _ => typ.raw(),
    }
}

impl OperationRegistry {
    #[instrument(skip_all)]
    pub fn build(
        sources: &OperationSourceRepository,
        arena: &TypeArena,
        config: &BuildConfig,
    ) -> Result<Self, ModelBuildingError> {
        let builder = OperationBuilder::new(arena, config);

        // roots are grouped by name across all root sources: overloads of
        // one operation may live on different service types
        let mut queries: IndexMap<String, Vec<Resolver>> = IndexMap::new();
        let mut mutations: IndexMap<String, Vec<Resolver>> = IndexMap::new();
        let mut subscriptions: IndexMap<String, Vec<Resolver>> = IndexMap::new();

        for source in sources.root_sources() {
            for strategy in sources.builders_for(source) {
                let discovered = strategy.build(&source.typ, arena)?;
                for resolver in discovered.queries {
                    queries.entry(resolver.name.clone()).or_default().push(resolver);
                }
                for resolver in discovered.mutations {
                    mutations
                        .entry(resolver.name.clone())
                        .or_default()
                        .push(resolver);
                }
                for resolver in discovered.subscriptions {
                    subscriptions
                        .entry(resolver.name.clone())
                        .or_default()
                        .push(resolver);
                }
            }
        }

        let mut root_queries = MappedArena::default();
        for (name, group) in queries {
            root_queries.add(name, Arc::new(builder.build_query(group)?));
        }
        let mut root_mutations = MappedArena::default();
        for (name, group) in mutations {
            root_mutations.add(name, Arc::new(builder.build_mutation(group)?));
        }
        let mut root_subscriptions = MappedArena::default();
        for (name, group) in subscriptions {
            root_subscriptions.add(name, Arc::new(builder.build_subscription(group)?));
        }

        // nested sources are grouped per domain type: operations of
        // different parent types never merge, even under the same name
        let mut nested: Vec<Arc<Operation>> = vec![];
        let mut nested_by_type: HashMap<String, Vec<usize>> = HashMap::new();

        for source in sources.nested_sources() {
            let attach = attachment_raw(&source.typ, arena).ok_or_else(|| {
                ModelBuildingError::Generic(format!(
                    "nested source `{}` has no raw class",
                    source.typ.key(arena)
                ))
            })?;
            let attach_name = arena[attach].name.clone();

            let mut source_queries: IndexMap<String, Vec<Resolver>> = IndexMap::new();
            let mut source_mutations: IndexMap<String, Vec<Resolver>> = IndexMap::new();
            for strategy in sources.builders_for(source) {
                let discovered = strategy.build(&source.typ, arena)?;
                for resolver in discovered.queries {
                    source_queries
                        .entry(resolver.name.clone())
                        .or_default()
                        .push(resolver);
                }
                for resolver in discovered.mutations {
                    source_mutations
                        .entry(resolver.name.clone())
                        .or_default()
                        .push(resolver);
                }
            }

            for (_, group) in source_queries {
                let operation = Arc::new(builder.build_query(group)?);
                nested_by_type
                    .entry(attach_name.clone())
                    .or_default()
                    .push(nested.len());
                nested.push(operation);
            }
            for (_, group) in source_mutations {
                let operation = Arc::new(builder.build_mutation(group)?);
                nested_by_type
                    .entry(attach_name.clone())
                    .or_default()
                    .push(nested.len());
                nested.push(operation);
            }
        }

        debug!(
            root_queries = root_queries.keys().len(),
            root_mutations = root_mutations.keys().len(),
            nested = nested.len(),
            "operation namespace assembled"
        );

        Ok(Self {
            root_queries,
            root_mutations,
            root_subscriptions,
            nested,
            nested_by_type,
        })
    }

    fn root(&self, kind: OperationKind) -> &MappedArena<String, Arc<Operation>> {
        match kind {
            OperationKind::Query => &self.root_queries,
            OperationKind::Mutation => &self.root_mutations,
            OperationKind::Subscription => &self.root_subscriptions,
        }
    }

    pub fn root_operations(
        &self,
        kind: OperationKind,
    ) -> impl Iterator<Item = &Arc<Operation>> {
        self.root(kind).iter().map(|(_, operation)| operation)
    }

    /// Looks up an operation by its nesting trail and name. Trail entries
    /// name ancestor operations starting at the root; intermediate hops
    /// resolve through queries first, then mutations.
    pub fn operation(
        &self,
        arena: &TypeArena,
        trail: &[&str],
        name: &str,
        kind: OperationKind,
    ) -> Option<&Arc<Operation>> {
        let Some((head, rest)) = trail.split_first() else {
            return self.root(kind).get_by_key(name);
        };

        let mut current = self
            .root(OperationKind::Query)
            .get_by_key(*head)
            .or_else(|| self.root(OperationKind::Mutation).get_by_key(*head))?;

        for hop in rest {
            current = self.find_nested(
                arena,
                &current.typ,
                hop,
                &[OperationKind::Query, OperationKind::Mutation],
            )?;
        }

        self.find_nested(arena, &current.typ, name, &[kind])
    }

    /// All operations nestable under results of `typ`: the operations
    /// declared for that domain type, plus embeddable operations whose
    /// source type is a supertype of it.
    pub fn nestable_under(
        &self,
        arena: &TypeArena,
        typ: &GraphType,
    ) -> Vec<&Arc<Operation>> {
        let Some(raw) = attachment_raw(typ, arena) else {
            return vec![];
        };

        let mut result: Vec<&Arc<Operation>> = self
            .nested_by_type
            .get(&arena[raw].name)
            .map(|indices| indices.iter().map(|index| &self.nested[*index]).collect())
            .unwrap_or_default();

        let declared: Vec<*const Operation> = result
            .iter()
            .map(|operation| Arc::as_ptr(operation))
            .collect();

        let embeddable_pool = self
            .root_operations(OperationKind::Query)
            .chain(self.root_operations(OperationKind::Mutation))
            .chain(self.nested.iter());
        for operation in embeddable_pool {
            if !operation.embeddable || declared.contains(&Arc::as_ptr(operation)) {
                continue;
            }
            let attaches = operation.source_types.iter().any(|source| {
                source
                    .raw()
                    .map(|source_raw| arena.is_subtype(raw, source_raw))
                    .unwrap_or(false)
            });
            if attaches {
                result.push(operation);
            }
        }

        result
    }

    fn find_nested(
        &self,
        arena: &TypeArena,
        parent: &GraphType,
        name: &str,
        kinds: &[OperationKind],
    ) -> Option<&Arc<Operation>> {
        for kind in kinds {
            if let Some(operation) = self
                .nestable_under(arena, parent)
                .into_iter()
                .find(|operation| operation.name == name && operation.kind == *kind)
            {
                return Some(operation);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingraph_core_model::annotation::{Annotation, names};
    use ingraph_core_model::executable::Handler;
    use ingraph_core_model::type_algebra::{
        ClassDescriptor, MemberDescriptor, ParameterDescriptor, TypeTemplate,
    };
    use ingraph_core_model::value::Val;

    fn sample_registry() -> (TypeArena, OperationRegistry) {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");

        let person = arena.add_class(ClassDescriptor::new("Person"));
        let user = arena.declare("User");
        arena.define(
            user,
            ClassDescriptor::new("User")
                .supertype(TypeTemplate::Class(person))
                .member(
                    MemberDescriptor::method("friends", TypeTemplate::array(TypeTemplate::Class(user)))
                        .annotation(Annotation::new(names::QUERY))
                        .param(
                            ParameterDescriptor::new("parent", TypeTemplate::Class(user))
                                .annotation(Annotation::new(names::SOURCE)),
                        )
                        .handler(Handler::from_fn(|_, _| Ok(Val::List(vec![])))),
                ),
        );

        let service = arena.add_class(
            ClassDescriptor::new("UserService")
                .member(
                    MemberDescriptor::method("user", TypeTemplate::Class(user))
                        .annotation(Annotation::new(names::QUERY))
                        .param(ParameterDescriptor::new("id", TypeTemplate::Class(int)))
                        .handler(Handler::from_fn(|_, _| Ok(Val::Null))),
                )
                .member(
                    MemberDescriptor::method("audit_log", TypeTemplate::Class(int))
                        .annotation(Annotation::with_value(names::QUERY, "auditLog"))
                        .annotation(Annotation::new(names::EMBEDDABLE))
                        .param(
                            ParameterDescriptor::new("subject", TypeTemplate::Class(person))
                                .annotation(Annotation::new(names::SOURCE)),
                        )
                        .handler(Handler::from_fn(|_, _| Ok(Val::Null))),
                ),
        );

        let mut sources = OperationSourceRepository::new();
        sources.add_root(GraphType::class(service));
        sources.add_nested(GraphType::class(user));

        let config = BuildConfig::default();
        let registry = OperationRegistry::build(&sources, &arena, &config).unwrap();
        (arena, registry)
    }

    #[test]
    fn root_operations_resolve_with_an_empty_trail() {
        let (arena, registry) = sample_registry();

        let operation = registry
            .operation(&arena, &[], "user", OperationKind::Query)
            .unwrap();
        assert_eq!(operation.name, "user");
        assert_eq!(operation.typ.key(&arena), "User");

        assert!(
            registry
                .operation(&arena, &[], "missing", OperationKind::Query)
                .is_none()
        );
    }

    #[test]
    fn nested_operations_resolve_by_trail() {
        let (arena, registry) = sample_registry();

        let friends = registry
            .operation(&arena, &["user"], "friends", OperationKind::Query)
            .unwrap();
        assert_eq!(friends.name, "friends");
        assert_eq!(friends.source_types.len(), 1);

        // deeper trail through the collection-valued result also resolves,
        // since arrays attach by their element type
        let nested_again = registry
            .operation(&arena, &["user", "friends"], "friends", OperationKind::Query)
            .unwrap();
        assert_eq!(nested_again.name, "friends");

        assert!(
            registry
                .operation(&arena, &["user"], "missing", OperationKind::Query)
                .is_none()
        );
    }

    #[test]
    fn embeddable_operations_attach_by_source_supertype() {
        let (arena, registry) = sample_registry();

        let user_type = GraphType::class(arena.get_id("User").unwrap());
        let nestable: Vec<&str> = registry
            .nestable_under(&arena, &user_type)
            .into_iter()
            .map(|operation| operation.name.as_str())
            .collect();

        // `friends` is declared for User; `auditLog` declares source type
        // Person and embeds under any Person subtype
        assert!(nestable.contains(&"friends"));
        assert!(nestable.contains(&"auditLog"));

        let embedded = registry
            .operation(&arena, &["user"], "auditLog", OperationKind::Query)
            .unwrap();
        assert_eq!(embedded.name, "auditLog");
    }
}
