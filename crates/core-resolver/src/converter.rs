// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Input/output conversion: prioritized, first-match-wins chains consulted
//! around every invocation. The chains are explicit ordered lists; the
//! resolution order is the registration order, and it is inspectable.

use std::sync::Arc;

use ingraph_core_model::mapping::MappingError;
use ingraph_core_model::type_algebra::{GraphType, TypeArena};
use ingraph_core_model::value::Val;

use crate::environment::ResolutionEnvironment;

pub trait InputConverter: Send + Sync {
    fn supports(&self, typ: &GraphType, arena: &TypeArena) -> bool;

    fn convert_input(
        &self,
        substitute: Val,
        typ: &GraphType,
        env: &ResolutionEnvironment<'_>,
    ) -> Result<Val, MappingError>;
}

pub trait OutputConverter: Send + Sync {
    fn supports(&self, typ: &GraphType, arena: &TypeArena) -> bool;

    fn convert_output(
        &self,
        original: Val,
        typ: &GraphType,
        env: &ResolutionEnvironment<'_>,
    ) -> Result<Val, MappingError>;
}

#[derive(Default, Clone)]
pub struct InputConverterChain {
    converters: Vec<Arc<dyn InputConverter>>,
}

impl InputConverterChain {
    pub fn new(converters: Vec<Arc<dyn InputConverter>>) -> Self {
        Self { converters }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn InputConverter>> {
        self.converters.iter()
    }

    pub fn first_supporting(
        &self,
        typ: &GraphType,
        arena: &TypeArena,
    ) -> Option<&Arc<dyn InputConverter>> {
        self.converters
            .iter()
            .find(|converter| converter.supports(typ, arena))
    }
}

#[derive(Default, Clone)]
pub struct OutputConverterChain {
    converters: Vec<Arc<dyn OutputConverter>>,
}

impl OutputConverterChain {
    pub fn new(converters: Vec<Arc<dyn OutputConverter>>) -> Self {
        Self { converters }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn OutputConverter>> {
        self.converters.iter()
    }

    pub fn first_supporting(
        &self,
        typ: &GraphType,
        arena: &TypeArena,
    ) -> Option<&Arc<dyn OutputConverter>> {
        self.converters
            .iter()
            .find(|converter| converter.supports(typ, arena))
    }
}
