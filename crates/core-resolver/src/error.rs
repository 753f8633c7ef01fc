// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use ingraph_core_model::executable::InvocationError;
use ingraph_core_model::mapping::MappingError;

/// Failures local to one argument injection.
#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("No ambient context value for `{0}`")]
    MissingContext(String),

    #[error("No injector supports argument `{0}`")]
    Unsupported(String),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Request-phase failures. Each is scoped to the single operation being
/// resolved; concurrently resolving siblings are unaffected.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("No operation `{name}` at trail {trail:?}")]
    OperationNotFound { trail: Vec<String>, name: String },

    #[error("Operation `{operation}` is not implemented for arguments ({arguments})")]
    UnresolvedOperation {
        operation: String,
        arguments: String,
    },

    #[error("Could not inject argument `{argument}` of operation `{operation}`")]
    Injection {
        operation: String,
        argument: String,
        #[source]
        source: InjectionError,
    },

    #[error("Operation `{operation}` failed")]
    Invocation {
        operation: String,
        #[source]
        source: InvocationError,
    },

    #[error("Could not convert the result of operation `{operation}`")]
    Conversion {
        operation: String,
        #[source]
        source: MappingError,
    },
}
