// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::type_algebra::GraphType;
use crate::value::Val;

/// A default value is always present as a value: "not set" and "explicitly
/// null" are distinct states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DefaultValue {
    #[default]
    Unset,
    Null,
    Value(Val),
}

impl DefaultValue {
    pub fn is_set(&self) -> bool {
        !matches!(self, DefaultValue::Unset)
    }

    /// The concrete value to inject when the client supplies nothing.
    pub fn to_val(&self) -> Option<Val> {
        match self {
            DefaultValue::Unset => None,
            DefaultValue::Null => Some(Val::Null),
            DefaultValue::Value(val) => Some(val.clone()),
        }
    }
}

/// One named input parameter of one resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationArgument {
    pub name: String,
    pub typ: GraphType,
    pub description: Option<String>,
    pub default_value: DefaultValue,
    /// Bound to ambient request context, never client-supplied.
    pub context: bool,
    /// Bound to the parent operation's result (nested operations).
    pub resolver_source: bool,
    /// Exposed to clients at all (false for injected-only parameters).
    pub mappable: bool,
    /// Identity (primary key) lookup argument.
    pub identity: bool,
    /// Connection/pagination-style request argument.
    pub paging: bool,
}

impl OperationArgument {
    pub fn new(name: impl Into<String>, typ: GraphType) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty());
        Self {
            name,
            typ,
            description: None,
            default_value: DefaultValue::Unset,
            context: false,
            resolver_source: false,
            mappable: true,
            identity: false,
            paging: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, default_value: DefaultValue) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn context(mut self) -> Self {
        self.context = true;
        self
    }

    pub fn resolver_source(mut self) -> Self {
        self.resolver_source = true;
        self
    }

    pub fn unmappable(mut self) -> Self {
        self.mappable = false;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn paging(mut self) -> Self {
        self.paging = true;
        self
    }

    /// Whether the argument participates in dispatch fingerprints: context
    /// and paging arguments never do, nor do injected-only parameters.
    pub fn fingerprint_relevant(&self) -> bool {
        self.mappable && !self.context && !self.paging
    }
}
