// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Argument injection: what value ultimately lands in the invocation
//! argument array. Injectors form an ordered list; the first one that
//! supports an argument wins.

use std::sync::Arc;

use async_trait::async_trait;

use ingraph_core_model::argument::OperationArgument;
use ingraph_core_model::value::Val;

use crate::environment::ResolutionEnvironment;
use crate::error::InjectionError;

#[async_trait]
pub trait ArgumentInjector: Send + Sync {
    fn supports(&self, argument: &OperationArgument, env: &ResolutionEnvironment<'_>) -> bool;

    async fn inject(
        &self,
        raw: Option<&Val>,
        argument: &OperationArgument,
        env: &ResolutionEnvironment<'_>,
    ) -> Result<Val, InjectionError>;
}

/// Binds context arguments from the ambient request context, keyed by the
/// argument's innermost declared type name with the argument name as a
/// fallback key.
pub struct ContextInjector;

#[async_trait]
impl ArgumentInjector for ContextInjector {
    fn supports(&self, argument: &OperationArgument, _env: &ResolutionEnvironment<'_>) -> bool {
        argument.context
    }

    async fn inject(
        &self,
        _raw: Option<&Val>,
        argument: &OperationArgument,
        env: &ResolutionEnvironment<'_>,
    ) -> Result<Val, InjectionError> {
        let type_name = argument
            .typ
            .innermost_raw()
            .map(|id| env.arena[id].name.clone());

        type_name
            .as_deref()
            .and_then(|name| env.context.get(name))
            .or_else(|| env.context.get(&argument.name))
            .cloned()
            .ok_or_else(|| {
                InjectionError::MissingContext(
                    type_name.unwrap_or_else(|| argument.name.clone()),
                )
            })
    }
}

/// Binds source arguments to the parent operation's result.
pub struct SourceInjector;

#[async_trait]
impl ArgumentInjector for SourceInjector {
    fn supports(&self, argument: &OperationArgument, env: &ResolutionEnvironment<'_>) -> bool {
        argument.resolver_source && env.source.is_some()
    }

    async fn inject(
        &self,
        _raw: Option<&Val>,
        _argument: &OperationArgument,
        env: &ResolutionEnvironment<'_>,
    ) -> Result<Val, InjectionError> {
        // supports() guarantees presence
        Ok(env.source.cloned().unwrap_or(Val::Null))
    }
}

/// The catch-all: client-supplied values run through the first supporting
/// input converter (the value mapper otherwise); absent values fall back to
/// the declared default, then to null.
pub struct InputValueInjector;

#[async_trait]
impl ArgumentInjector for InputValueInjector {
    fn supports(&self, _argument: &OperationArgument, _env: &ResolutionEnvironment<'_>) -> bool {
        true
    }

    async fn inject(
        &self,
        raw: Option<&Val>,
        argument: &OperationArgument,
        env: &ResolutionEnvironment<'_>,
    ) -> Result<Val, InjectionError> {
        match raw {
            Some(raw) => {
                let converted = match env
                    .input_converters
                    .first_supporting(&argument.typ, env.arena)
                {
                    Some(converter) => {
                        converter.convert_input(raw.clone(), &argument.typ, env)?
                    }
                    None => env.value_mapper.from_input(raw, &argument.typ, env.arena)?,
                };
                Ok(converted)
            }
            None => Ok(argument.default_value.to_val().unwrap_or(Val::Null)),
        }
    }
}

/// The standard injector stack, in consultation order.
pub fn default_injectors() -> Vec<Arc<dyn ArgumentInjector>> {
    vec![
        Arc::new(ContextInjector),
        Arc::new(SourceInjector),
        Arc::new(InputValueInjector),
    ]
}
