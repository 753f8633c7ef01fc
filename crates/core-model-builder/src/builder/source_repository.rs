// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use ingraph_core_model::type_algebra::GraphType;

use crate::builder::resolver_builder::{AnnotatedResolverBuilder, ResolverBuilder};

/// One registered source: the type whose descriptor is scanned, plus the
/// discovery strategies to scan it with (empty means "use the defaults").
pub struct OperationSource {
    pub typ: GraphType,
    pub builders: Vec<Arc<dyn ResolverBuilder>>,
}

/// Holds the registered root sources (service types whose operations form
/// the top of the namespace) and nested sources (domain types whose
/// operations attach under results of that type).
pub struct OperationSourceRepository {
    root_sources: Vec<OperationSource>,
    nested_sources: Vec<OperationSource>,
    default_builders: Vec<Arc<dyn ResolverBuilder>>,
}

impl OperationSourceRepository {
    pub fn new() -> Self {
        Self::with_default_builders(vec![Arc::new(AnnotatedResolverBuilder::new())])
    }

    pub fn with_default_builders(default_builders: Vec<Arc<dyn ResolverBuilder>>) -> Self {
        Self {
            root_sources: vec![],
            nested_sources: vec![],
            default_builders,
        }
    }

    pub fn add_root(&mut self, typ: GraphType) {
        self.add_root_with(typ, vec![]);
    }

    pub fn add_root_with(&mut self, typ: GraphType, builders: Vec<Arc<dyn ResolverBuilder>>) {
        self.root_sources.push(OperationSource { typ, builders });
    }

    pub fn add_nested(&mut self, typ: GraphType) {
        self.add_nested_with(typ, vec![]);
    }

    pub fn add_nested_with(&mut self, typ: GraphType, builders: Vec<Arc<dyn ResolverBuilder>>) {
        self.nested_sources.push(OperationSource { typ, builders });
    }

    pub fn root_sources(&self) -> &[OperationSource] {
        &self.root_sources
    }

    pub fn nested_sources(&self) -> &[OperationSource] {
        &self.nested_sources
    }

    /// The source's own strategies plus the defaults, structurally
    /// deduplicated: registering the same strategy class twice scans once.
    pub fn builders_for<'a>(
        &'a self,
        source: &'a OperationSource,
    ) -> Vec<&'a Arc<dyn ResolverBuilder>> {
        let mut builders: Vec<&Arc<dyn ResolverBuilder>> = vec![];
        for builder in source.builders.iter().chain(self.default_builders.iter()) {
            if !builders
                .iter()
                .any(|existing| existing.same_strategy(builder.as_ref()))
            {
                builders.push(builder);
            }
        }
        builders
    }
}

impl Default for OperationSourceRepository {
    fn default() -> Self {
        Self::new()
    }
}
