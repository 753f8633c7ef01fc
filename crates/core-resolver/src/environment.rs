// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use ingraph_core_model::mapping::ValueMapper;
use ingraph_core_model::operation::Operation;
use ingraph_core_model::type_algebra::TypeArena;
use ingraph_core_model::value::Val;

use crate::converter::InputConverterChain;
use crate::request_context::RequestContext;

/// Per-request resolution state, thread-confined to one field resolution.
/// Everything it references is immutable shared model data; the only
/// mutable state of a resolution lives on the executor's stack.
pub struct ResolutionEnvironment<'a> {
    pub operation: &'a Operation,
    /// The parent operation's result, when resolving a nested operation.
    pub source: Option<&'a Val>,
    pub context: &'a RequestContext,
    pub raw_arguments: &'a IndexMap<String, Val>,
    pub arena: &'a TypeArena,
    pub value_mapper: &'a dyn ValueMapper,
    pub input_converters: &'a InputConverterChain,
}
