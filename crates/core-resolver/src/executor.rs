// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Per-request execution: select the resolver by fingerprint, build the
//! argument array through the injectors, invoke the executable, convert the
//! output. Every failure is re-signaled as a [`ResolutionError`] carrying
//! the operation name, with the original cause attached.

use std::sync::Arc;

use futures::StreamExt;
use indexmap::IndexMap;
use tracing::instrument;

use ingraph_core_model::mapping::ValueMapper;
use ingraph_core_model::operation::Operation;
use ingraph_core_model::type_algebra::TypeArena;
use ingraph_core_model::value::Val;

use crate::converter::{InputConverterChain, OutputConverterChain};
use crate::environment::ResolutionEnvironment;
use crate::error::{InjectionError, ResolutionError};
use crate::injector::ArgumentInjector;
use crate::request_context::RequestContext;

pub struct OperationExecutor<'a> {
    pub arena: &'a TypeArena,
    pub injectors: &'a [Arc<dyn ArgumentInjector>],
    pub input_converters: &'a InputConverterChain,
    pub output_converters: &'a OutputConverterChain,
    pub value_mapper: &'a dyn ValueMapper,
}

impl OperationExecutor<'_> {
    #[instrument(name = "OperationExecutor::execute", skip_all, fields(operation = %operation.name))]
    pub async fn execute(
        &self,
        operation: &Operation,
        raw_arguments: &IndexMap<String, Val>,
        source: Option<&Val>,
        context: &RequestContext,
    ) -> Result<Val, ResolutionError> {
        let supplied: Vec<&str> = raw_arguments
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, _)| name.as_str())
            .collect();

        let resolver = operation.resolver(&supplied).ok_or_else(|| {
            ResolutionError::UnresolvedOperation {
                operation: operation.name.clone(),
                arguments: supplied.join(", "),
            }
        })?;

        let env = ResolutionEnvironment {
            operation,
            source,
            context,
            raw_arguments,
            arena: self.arena,
            value_mapper: self.value_mapper,
            input_converters: self.input_converters,
        };

        // declaration order matters: arguments are injected one by one into
        // the invocation array
        let args: Vec<Val> = futures::stream::iter(resolver.arguments.iter())
            .then(|argument| async {
                let raw = raw_arguments.get(&argument.name);

                let injector = self
                    .injectors
                    .iter()
                    .find(|injector| injector.supports(argument, &env))
                    .ok_or_else(|| ResolutionError::Injection {
                        operation: operation.name.clone(),
                        argument: argument.name.clone(),
                        source: InjectionError::Unsupported(argument.name.clone()),
                    })?;

                injector
                    .inject(raw, argument, &env)
                    .await
                    .map_err(|source| ResolutionError::Injection {
                        operation: operation.name.clone(),
                        argument: argument.name.clone(),
                        source,
                    })
            })
            .collect::<Vec<Result<_, _>>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()?;

        let result = resolver
            .executable
            .execute(source, args)
            .await
            .map_err(|source| ResolutionError::Invocation {
                operation: operation.name.clone(),
                source,
            })?;

        match self
            .output_converters
            .first_supporting(&resolver.return_type, self.arena)
        {
            Some(converter) => converter
                .convert_output(result, &resolver.return_type, &env)
                .map_err(|source| ResolutionError::Conversion {
                    operation: operation.name.clone(),
                    source,
                }),
            None => Ok(result),
        }
    }
}
