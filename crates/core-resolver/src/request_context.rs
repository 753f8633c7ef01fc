// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use ingraph_core_model::value::Val;

/// Ambient values available to context-bound arguments, keyed by the
/// context type's name (with the argument name as a fallback key).
#[derive(Debug, Default)]
pub struct RequestContext {
    entries: HashMap<String, Val>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Val) {
        self.entries.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: Val) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Val> {
        self.entries.get(key)
    }
}
