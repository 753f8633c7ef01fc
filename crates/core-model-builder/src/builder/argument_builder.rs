// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use ingraph_core_model::annotation::names;
use ingraph_core_model::argument::{DefaultValue, OperationArgument};
use ingraph_core_model::mapping::ValueMapper;
use ingraph_core_model::type_algebra::{
    GraphType, MemberDescriptor, ParameterDescriptor, TypeArena, resolve_parameter_type,
};
use ingraph_core_model::value::Val;

use crate::error::ModelBuildingError;

/// Materializes a parameter's default value.
pub trait DefaultValueProvider: Send + Sync {
    fn kind(&self) -> &'static str;

    fn default_value(
        &self,
        parameter: &ParameterDescriptor,
        typ: &GraphType,
        arena: &TypeArena,
    ) -> Result<DefaultValue, ModelBuildingError>;
}

/// Pass-through: the default annotation's value is used verbatim.
#[derive(Debug, Default)]
pub struct IdentityDefaultValueProvider;

impl DefaultValueProvider for IdentityDefaultValueProvider {
    fn kind(&self) -> &'static str {
        "identity"
    }

    fn default_value(
        &self,
        parameter: &ParameterDescriptor,
        _typ: &GraphType,
        _arena: &TypeArena,
    ) -> Result<DefaultValue, ModelBuildingError> {
        Ok(match parameter.annotations.get(names::DEFAULT) {
            None => DefaultValue::Unset,
            Some(annotation) => match annotation.value() {
                None | Some(Val::Null) => DefaultValue::Null,
                Some(value) => DefaultValue::Value(value.clone()),
            },
        })
    }
}

/// Parses a string literal default through the value mapper, so complex
/// defaults can be written the way clients would write them.
pub struct LiteralDefaultValueProvider {
    mapper: Arc<dyn ValueMapper>,
}

impl LiteralDefaultValueProvider {
    pub fn new(mapper: Arc<dyn ValueMapper>) -> Self {
        Self { mapper }
    }
}

impl DefaultValueProvider for LiteralDefaultValueProvider {
    fn kind(&self) -> &'static str {
        "literal"
    }

    fn default_value(
        &self,
        parameter: &ParameterDescriptor,
        typ: &GraphType,
        arena: &TypeArena,
    ) -> Result<DefaultValue, ModelBuildingError> {
        match parameter.annotations.get(names::DEFAULT) {
            None => Ok(DefaultValue::Unset),
            Some(annotation) => match annotation.value() {
                None | Some(Val::Null) => Ok(DefaultValue::Null),
                Some(Val::String(literal)) => {
                    let value = self
                        .mapper
                        .from_string(literal, typ, arena)
                        .map_err(|source| ModelBuildingError::InvalidDefault {
                            parameter: parameter.name.clone(),
                            source,
                        })?;
                    Ok(match value {
                        Val::Null => DefaultValue::Null,
                        value => DefaultValue::Value(value),
                    })
                }
                Some(value) => Ok(DefaultValue::Value(value.clone())),
            },
        }
    }
}

/// Builds the argument list of one resolver from the reflection-free
/// parameter descriptors of its member.
pub trait ArgumentBuilder: Send + Sync {
    fn kind(&self) -> &'static str;

    fn build_arguments(
        &self,
        member: &MemberDescriptor,
        declaring: &GraphType,
        arena: &TypeArena,
    ) -> Result<Vec<OperationArgument>, ModelBuildingError>;
}

pub struct DefaultArgumentBuilder {
    default_value_provider: Arc<dyn DefaultValueProvider>,
}

impl DefaultArgumentBuilder {
    pub fn new(default_value_provider: Arc<dyn DefaultValueProvider>) -> Self {
        Self {
            default_value_provider,
        }
    }
}

impl Default for DefaultArgumentBuilder {
    fn default() -> Self {
        Self::new(Arc::new(IdentityDefaultValueProvider))
    }
}

impl ArgumentBuilder for DefaultArgumentBuilder {
    fn kind(&self) -> &'static str {
        "default"
    }

    fn build_arguments(
        &self,
        member: &MemberDescriptor,
        declaring: &GraphType,
        arena: &TypeArena,
    ) -> Result<Vec<OperationArgument>, ModelBuildingError> {
        member
            .params
            .iter()
            .filter(|param| !param.synthetic)
            .map(|param| {
                let typ = resolve_parameter_type(param, declaring, arena).map_err(|source| {
                    ModelBuildingError::UnresolvableType {
                        member: format!("{}.{}", member.name, param.name),
                        source,
                    }
                })?;

                let name = param
                    .annotations
                    .string_value(names::NAME)
                    .map(str::to_string)
                    .unwrap_or_else(|| param.name.clone());

                let default_value =
                    self.default_value_provider
                        .default_value(param, &typ, arena)?;

                let mut argument = OperationArgument::new(name, typ).default_value(default_value);
                argument.description = param
                    .annotations
                    .string_value(names::DESCRIPTION)
                    .map(str::to_string);
                argument.context = param.annotations.has(names::CONTEXT);
                argument.resolver_source = param.annotations.has(names::SOURCE);
                argument.mappable = !param.annotations.has(names::IGNORE);
                argument.identity = param.annotations.has(names::IDENTITY);
                argument.paging = param.annotations.has(names::PAGING);

                Ok(argument)
            })
            .collect()
    }
}
