// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The system-facing resolver: an immutable bundle of the assembled
//! operation registry, the type arena, and the conversion/injection stacks.
//! Built once, then shared read-only across arbitrarily many concurrent
//! field resolutions.

use std::sync::Arc;

use async_graphql_parser::types::FieldDefinition;
use indexmap::IndexMap;
use tracing::instrument;

use ingraph_core_model::introspection::field_definition;
use ingraph_core_model::mapping::{JsonValueMapper, ValueMapper};
use ingraph_core_model::operation::{Operation, OperationKind};
use ingraph_core_model::type_algebra::{GraphType, TypeArena};
use ingraph_core_model::value::Val;
use ingraph_core_model_builder::builder::operation_repository::OperationRegistry;

use crate::converter::{InputConverterChain, OutputConverterChain};
use crate::error::ResolutionError;
use crate::executor::OperationExecutor;
use crate::injector::{ArgumentInjector, default_injectors};
use crate::request_context::RequestContext;

pub struct SystemResolver {
    registry: OperationRegistry,
    arena: TypeArena,
    injectors: Vec<Arc<dyn ArgumentInjector>>,
    input_converters: InputConverterChain,
    output_converters: OutputConverterChain,
    value_mapper: Arc<dyn ValueMapper>,
}

impl SystemResolver {
    pub fn new(registry: OperationRegistry, arena: TypeArena) -> Self {
        Self {
            registry,
            arena,
            injectors: default_injectors(),
            input_converters: InputConverterChain::default(),
            output_converters: OutputConverterChain::default(),
            value_mapper: Arc::new(JsonValueMapper),
        }
    }

    pub fn with_injectors(mut self, injectors: Vec<Arc<dyn ArgumentInjector>>) -> Self {
        self.injectors = injectors;
        self
    }

    pub fn with_input_converters(mut self, converters: InputConverterChain) -> Self {
        self.input_converters = converters;
        self
    }

    pub fn with_output_converters(mut self, converters: OutputConverterChain) -> Self {
        self.output_converters = converters;
        self
    }

    pub fn with_value_mapper(mut self, value_mapper: Arc<dyn ValueMapper>) -> Self {
        self.value_mapper = value_mapper;
        self
    }

    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Resolves one operation: lookup by (trail, name), fingerprint
    /// dispatch, injection, invocation, output conversion.
    #[instrument(name = "SystemResolver::resolve", skip_all, fields(name = %name))]
    pub async fn resolve(
        &self,
        trail: &[&str],
        name: &str,
        kind: OperationKind,
        raw_arguments: IndexMap<String, Val>,
        source: Option<&Val>,
        context: &RequestContext,
    ) -> Result<Val, ResolutionError> {
        let operation = self
            .registry
            .operation(&self.arena, trail, name, kind)
            .ok_or_else(|| ResolutionError::OperationNotFound {
                trail: trail.iter().map(|hop| hop.to_string()).collect(),
                name: name.to_string(),
            })?;

        self.executor()
            .execute(operation, &raw_arguments, source, context)
            .await
    }

    /// Operations nestable under results of the given type (declared nested
    /// operations plus embeddable ones).
    pub fn nestable_under(&self, typ: &GraphType) -> Vec<&Arc<Operation>> {
        self.registry.nestable_under(&self.arena, typ)
    }

    /// Schema-facing view of the root operations of one kind.
    pub fn field_definitions(&self, kind: OperationKind) -> Vec<FieldDefinition> {
        self.registry
            .root_operations(kind)
            .map(|operation| field_definition(operation, &self.arena))
            .collect()
    }

    fn executor(&self) -> OperationExecutor<'_> {
        OperationExecutor {
            arena: &self.arena,
            injectors: &self.injectors,
            input_converters: &self.input_converters,
            output_converters: &self.output_converters,
            value_mapper: self.value_mapper.as_ref(),
        }
    }
}
