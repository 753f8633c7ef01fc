// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::argument::OperationArgument;
use crate::resolver::{Deprecation, Resolver, fingerprint_of};
use crate::type_algebra::GraphType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// A named, client-visible query or mutation, backed by one or more
/// resolvers sharing the name. Built once during schema assembly, immutable
/// afterward, looked up on every request.
#[derive(Debug)]
pub struct Operation {
    pub name: String,
    pub kind: OperationKind,
    /// First non-empty description among the resolvers.
    pub description: Option<String>,
    pub deprecation: Option<Deprecation>,
    /// Union or common supertype of all resolvers' return types.
    pub typ: GraphType,
    /// Per-name merged view of all resolvers' arguments.
    pub arguments: Vec<OperationArgument>,
    /// Same merge, restricted to resolvers that support paged requests.
    pub sortable_arguments: Vec<OperationArgument>,
    pub resolvers: Vec<Arc<Resolver>>,
    /// Dispatch table; keys are exactly the union of the resolvers'
    /// fingerprints.
    pub by_fingerprint: HashMap<String, Arc<Resolver>>,
    /// Source-argument types shared by all resolvers (empty for root-only
    /// operations).
    pub source_types: Vec<GraphType>,
    /// Attachable under any result of a source type, independent of trail.
    pub embeddable: bool,
}

impl Operation {
    /// Selects the resolver answering the given set of non-null argument
    /// names.
    ///
    /// An operation with a single resolver dispatches unconditionally (all
    /// arguments may be optional). With multiple resolvers, the supplied
    /// names must hit a fingerprint exactly after dropping declared
    /// context/paging argument names, which never participate in the
    /// signature; a miss means no resolver accepts this combination.
    pub fn resolver(&self, supplied: &[&str]) -> Option<&Arc<Resolver>> {
        if self.resolvers.len() == 1 {
            return self.resolvers.first();
        }

        let names = supplied
            .iter()
            .copied()
            .filter(|name| {
                self.arguments
                    .iter()
                    .find(|arg| arg.name == *name)
                    .map(|arg| arg.fingerprint_relevant())
                    .unwrap_or(true)
            });
        self.by_fingerprint.get(&fingerprint_of(names))
    }

    pub fn has_primary_resolver(&self) -> bool {
        self.resolvers.iter().any(|resolver| resolver.is_primary())
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &str> {
        self.by_fingerprint.keys().map(String::as_str)
    }

    /// Whether results of `source_key` can host this operation as a nested
    /// field (the operation declares that source type).
    pub fn declares_source(&self, source_key: &str, arena: &crate::type_algebra::TypeArena) -> bool {
        self.source_types
            .iter()
            .any(|typ| typ.key(arena) == source_key)
    }
}
