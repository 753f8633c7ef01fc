// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use ingraph_core_model::type_algebra::GraphType;

/// What to do when two resolvers of one operation compute the same
/// fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintCollisionPolicy {
    /// Ambiguous dispatch is rejected at build time.
    #[default]
    Reject,
    /// The later registration replaces the earlier one (logged).
    LastWins,
}

/// Immutable build configuration, constructed once before assembly starts.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub collision_policy: FingerprintCollisionPolicy,
    /// Return type used when resolvers of one operation share no ancestor
    /// besides the universal roots. Without it, such a grouping is an error.
    pub fallback_type: Option<GraphType>,
}

impl BuildConfig {
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct BuildConfigBuilder {
    collision_policy: FingerprintCollisionPolicy,
    fallback_type: Option<GraphType>,
}

impl BuildConfigBuilder {
    pub fn collision_policy(mut self, policy: FingerprintCollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn fallback_type(mut self, fallback: GraphType) -> Self {
        self.fallback_type = Some(fallback);
        self
    }

    pub fn build(self) -> BuildConfig {
        BuildConfig {
            collision_policy: self.collision_policy,
            fallback_type: self.fallback_type,
        }
    }
}
