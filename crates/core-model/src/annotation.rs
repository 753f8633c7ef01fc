// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Annotations-as-data.
//!
//! Discovery never touches a live reflection API; every fact about a member
//! (exposure, naming overrides, context/source binding, defaults) arrives as
//! an [`Annotation`] attached to a descriptor. Well-known annotation names
//! understood by the built-in discovery strategies live in [`names`].

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::value::Val;

/// Well-known annotation names.
pub mod names {
    /// Marks a member as an exposed query.
    pub const QUERY: &str = "query";
    /// Marks a member as an exposed mutation.
    pub const MUTATION: &str = "mutation";
    /// Marks a member as an exposed subscription.
    pub const SUBSCRIPTION: &str = "subscription";
    /// Overrides the exposed name (`value` parameter).
    pub const NAME: &str = "name";
    /// Supplies a description (`value` parameter).
    pub const DESCRIPTION: &str = "description";
    /// Marks a member as deprecated (optional `reason` parameter).
    pub const DEPRECATED: &str = "deprecated";
    /// Marks a parameter as bound to ambient request context.
    pub const CONTEXT: &str = "context";
    /// Marks a parameter as bound to the parent operation's result.
    pub const SOURCE: &str = "source";
    /// Marks a parameter as invisible to clients.
    pub const IGNORE: &str = "ignore";
    /// Marks a parameter as an identity (primary key) lookup.
    pub const IDENTITY: &str = "identity";
    /// Marks a parameter as a paging/connection-style request.
    pub const PAGING: &str = "paging";
    /// Supplies a default value (`value` parameter; a string literal when a
    /// literal-parsing default-value provider is configured).
    pub const DEFAULT: &str = "default";
    /// Marks a return type as a union contributor.
    pub const UNION: &str = "union";
    /// Marks a type as a stream/publisher shape (subscription results).
    pub const PUBLISHER: &str = "publisher";
    /// Marks a member's operation as embeddable under any result of its
    /// source type, independent of the declared nesting trail.
    pub const EMBEDDABLE: &str = "embeddable";

    /// Parameter key used by single-value annotations.
    pub const VALUE: &str = "value";
}

/// One annotation instance: a name plus named data values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    #[serde(serialize_with = "ordered_params")]
    pub params: HashMap<String, Val>,
}

fn ordered_params<S: Serializer>(
    value: &HashMap<String, Val>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let ordered = value.iter().collect::<BTreeMap<_, _>>();
    ordered.serialize(serializer)
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: HashMap::new(),
        }
    }

    /// A single-value annotation (`name = value`).
    pub fn with_value(name: impl Into<String>, value: impl Into<Val>) -> Self {
        Annotation::new(name).param(names::VALUE, value)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Val>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The `value` parameter, if present.
    pub fn value(&self) -> Option<&Val> {
        self.params.get(names::VALUE)
    }

    pub fn string_value(&self) -> Option<&str> {
        self.value().and_then(Val::as_str)
    }
}

/// Annotations keyed by name, in declaration order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AnnotationMap {
    annotations: IndexMap<String, Annotation>,
}

impl AnnotationMap {
    pub fn new(annotations: impl IntoIterator<Item = Annotation>) -> Self {
        let mut map = AnnotationMap::default();
        for annotation in annotations {
            map.add(annotation);
        }
        map
    }

    pub fn add(&mut self, annotation: Annotation) {
        self.annotations
            .entry(annotation.name.clone())
            .or_insert(annotation);
    }

    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.annotations.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    /// The `value` parameter of the named annotation, as a string.
    pub fn string_value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Annotation::string_value)
    }

    /// Union with `other`: annotations already present (by name) are kept,
    /// the rest are appended in `other`'s order.
    pub fn merge(&mut self, other: &AnnotationMap) {
        for annotation in other.iter() {
            self.add(annotation.clone());
        }
    }

    pub fn merged(mut self, other: &AnnotationMap) -> Self {
        self.merge(other);
        self
    }
}

impl FromIterator<Annotation> for AnnotationMap {
    fn from_iter<T: IntoIterator<Item = Annotation>>(iter: T) -> Self {
        AnnotationMap::new(iter)
    }
}
