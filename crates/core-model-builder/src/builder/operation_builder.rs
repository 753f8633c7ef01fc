// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Groups pre-grouped resolvers into one operation: return-type inference
//! (union or common supertype), source-type agreement, per-name argument
//! merging, and fingerprint-map assembly under the configured collision
//! policy.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use ingraph_core_model::annotation::names;
use ingraph_core_model::argument::{DefaultValue, OperationArgument};
use ingraph_core_model::operation::{Operation, OperationKind};
use ingraph_core_model::resolver::Resolver;
use ingraph_core_model::type_algebra::{
    GraphType, TypeArena, common_supertype_with_fallback, union_of,
};

use crate::config::{BuildConfig, FingerprintCollisionPolicy};
use crate::error::ModelBuildingError;

pub struct OperationBuilder<'a> {
    arena: &'a TypeArena,
    config: &'a BuildConfig,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(arena: &'a TypeArena, config: &'a BuildConfig) -> Self {
        Self { arena, config }
    }

    pub fn build_query(&self, resolvers: Vec<Resolver>) -> Result<Operation, ModelBuildingError> {
        self.build(OperationKind::Query, resolvers)
    }

    pub fn build_mutation(
        &self,
        resolvers: Vec<Resolver>,
    ) -> Result<Operation, ModelBuildingError> {
        self.build(OperationKind::Mutation, resolvers)
    }

    pub fn build_subscription(
        &self,
        resolvers: Vec<Resolver>,
    ) -> Result<Operation, ModelBuildingError> {
        self.build(OperationKind::Subscription, resolvers)
    }

    fn build(
        &self,
        kind: OperationKind,
        resolvers: Vec<Resolver>,
    ) -> Result<Operation, ModelBuildingError> {
        let resolvers: Vec<Arc<Resolver>> = resolvers.into_iter().map(Arc::new).collect();
        let first = resolvers.first().ok_or(ModelBuildingError::EmptyOperation)?;
        let name = first.name.clone();

        let typ = self.operation_type(&name, &resolvers)?;

        // all overloads must agree on what parent-result types they accept
        let source_keys = |resolver: &Resolver| {
            let mut keys: Vec<String> = resolver
                .source_types()
                .iter()
                .map(|typ| typ.key(self.arena))
                .collect();
            keys.sort();
            keys
        };
        let first_keys = source_keys(first.as_ref());
        for resolver in &resolvers[1..] {
            let keys = source_keys(resolver.as_ref());
            if keys != first_keys {
                return Err(ModelBuildingError::ConflictingSourceTypes {
                    operation: name.clone(),
                    left: first_keys.join(", "),
                    right: keys.join(", "),
                });
            }
        }
        let source_types: Vec<GraphType> =
            first.source_types().into_iter().cloned().collect();

        let arguments = self.merge_arguments(resolvers.iter().map(Arc::as_ref))?;
        let sortable_arguments = self.merge_arguments(
            resolvers
                .iter()
                .map(Arc::as_ref)
                .filter(|resolver| resolver.supports_paged_requests()),
        )?;

        let description = resolvers
            .iter()
            .find_map(|resolver| {
                resolver
                    .description
                    .clone()
                    .filter(|description| !description.is_empty())
            });
        let deprecation = resolvers
            .iter()
            .find_map(|resolver| resolver.deprecation.clone());

        // a name any overload marks as context/paging (or hides) never
        // disambiguates, for any overload
        let excluded: Vec<&str> = arguments
            .iter()
            .filter(|argument| !argument.fingerprint_relevant())
            .map(|argument| argument.name.as_str())
            .collect();

        let mut by_fingerprint: HashMap<String, Arc<Resolver>> = HashMap::new();
        for resolver in &resolvers {
            for fingerprint in resolver.fingerprints_excluding(&excluded) {
                match by_fingerprint.entry(fingerprint) {
                    Entry::Vacant(entry) => {
                        entry.insert(resolver.clone());
                    }
                    Entry::Occupied(mut entry) => {
                        if entry.get().same_executable(resolver) {
                            continue;
                        }
                        match self.config.collision_policy {
                            FingerprintCollisionPolicy::Reject => {
                                return Err(ModelBuildingError::AmbiguousFingerprint {
                                    operation: name.clone(),
                                    fingerprint: entry.key().clone(),
                                });
                            }
                            FingerprintCollisionPolicy::LastWins => {
                                warn!(
                                    operation = %name,
                                    fingerprint = %entry.key(),
                                    "fingerprint collision, later resolver replaces the earlier one"
                                );
                                entry.insert(resolver.clone());
                            }
                        }
                    }
                }
            }
        }

        let embeddable = resolvers.iter().any(|resolver| resolver.embeddable);

        Ok(Operation {
            name,
            kind,
            description,
            deprecation,
            typ,
            arguments,
            sortable_arguments,
            resolvers,
            by_fingerprint,
            source_types,
            embeddable,
        })
    }

    fn operation_type(
        &self,
        name: &str,
        resolvers: &[Arc<Resolver>],
    ) -> Result<GraphType, ModelBuildingError> {
        let return_types: Vec<GraphType> = resolvers
            .iter()
            .map(|resolver| resolver.return_type.clone())
            .collect();

        let union_marked = resolvers.iter().any(|resolver| {
            resolver
                .return_type
                .class_has_annotation(self.arena, names::UNION)
        });

        if union_marked {
            Ok(union_of(self.arena, &return_types))
        } else {
            common_supertype_with_fallback(
                self.arena,
                &return_types,
                self.config.fallback_type.as_ref(),
            )
            .map_err(|source| ModelBuildingError::IncompatibleReturnTypes {
                operation: name.to_string(),
                source,
            })
        }
    }

    /// Per-name merge across overloads: common-supertype of the types, first
    /// non-empty description, first concrete default, OR-merged role flags.
    fn merge_arguments<'r>(
        &self,
        resolvers: impl Iterator<Item = &'r Resolver>,
    ) -> Result<Vec<OperationArgument>, ModelBuildingError> {
        let mut grouped: IndexMap<String, Vec<&OperationArgument>> = IndexMap::new();
        for resolver in resolvers {
            for argument in &resolver.arguments {
                grouped
                    .entry(argument.name.clone())
                    .or_default()
                    .push(argument);
            }
        }

        grouped
            .into_iter()
            .map(|(name, overloads)| {
                let types: Vec<GraphType> =
                    overloads.iter().map(|argument| argument.typ.clone()).collect();
                let typ = common_supertype_with_fallback(
                    self.arena,
                    &types,
                    self.config.fallback_type.as_ref(),
                )
                .map_err(|source| ModelBuildingError::IncompatibleArgumentTypes {
                    argument: name.clone(),
                    source,
                })?;

                let mut merged = OperationArgument::new(name, typ);
                merged.description = overloads.iter().find_map(|argument| {
                    argument
                        .description
                        .clone()
                        .filter(|description| !description.is_empty())
                });
                merged.default_value = overloads
                    .iter()
                    .map(|argument| &argument.default_value)
                    .find(|default| default.is_set())
                    .cloned()
                    .unwrap_or(DefaultValue::Unset);
                merged.context = overloads.iter().any(|argument| argument.context);
                merged.resolver_source =
                    overloads.iter().any(|argument| argument.resolver_source);
                merged.identity = overloads.iter().any(|argument| argument.identity);
                merged.paging = overloads.iter().any(|argument| argument.paging);
                merged.mappable = overloads.iter().all(|argument| argument.mappable);

                Ok(merged)
            })
            .collect()
    }
}
