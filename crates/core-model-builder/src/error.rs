// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use ingraph_core_model::mapping::MappingError;
use ingraph_core_model::type_algebra::TypeAlgebraError;

/// Build-phase failures. All of these abort schema assembly: nothing
/// partially built is usable.
#[derive(Error, Debug)]
pub enum ModelBuildingError {
    #[error("Could not resolve the type of `{member}`")]
    UnresolvableType {
        member: String,
        #[source]
        source: TypeAlgebraError,
    },

    #[error("Resolvers of operation `{operation}` have no common return type")]
    IncompatibleReturnTypes {
        operation: String,
        #[source]
        source: TypeAlgebraError,
    },

    #[error("Overloads of argument `{argument}` have no common type")]
    IncompatibleArgumentTypes {
        argument: String,
        #[source]
        source: TypeAlgebraError,
    },

    #[error(
        "Resolvers of operation `{operation}` disagree on source types (`{left}` vs `{right}`)"
    )]
    ConflictingSourceTypes {
        operation: String,
        left: String,
        right: String,
    },

    #[error(
        "Ambiguous resolvers for operation `{operation}`: fingerprint `{fingerprint}` is claimed more than once"
    )]
    AmbiguousFingerprint {
        operation: String,
        fingerprint: String,
    },

    #[error("Invalid default value for parameter `{parameter}`")]
    InvalidDefault {
        parameter: String,
        #[source]
        source: MappingError,
    },

    #[error("Cannot build an operation from an empty resolver list")]
    EmptyOperation,

    #[error("{0}")]
    Generic(String),
}
