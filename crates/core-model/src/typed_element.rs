// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationMap;
use crate::type_algebra::{GraphType, TypeId};

/// Identity of one physical member declaration: the declaring class plus the
/// member's position in its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub class: TypeId,
    pub member: usize,
}

impl ElementRef {
    pub fn new(class: TypeId, member: usize) -> Self {
        Self { class, member }
    }
}

/// One logical element merged from one or more physical declarations (e.g. a
/// field and its accessor method). Immutable once discovery completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedElement {
    pub name: String,
    /// Resolved type of the element, annotations included.
    pub typ: GraphType,
    /// Underlying declarations, ordered and distinct.
    elements: Vec<ElementRef>,
    pub annotations: AnnotationMap,
}

impl TypedElement {
    pub fn new(
        name: impl Into<String>,
        typ: GraphType,
        element: ElementRef,
        annotations: AnnotationMap,
    ) -> Self {
        Self {
            name: name.into(),
            typ,
            elements: vec![element],
            annotations,
        }
    }

    pub fn elements(&self) -> &[ElementRef] {
        &self.elements
    }

    /// Union of annotations (member-level and type-level), concatenation of
    /// the element lists with duplicates dropped. The receiver's type wins.
    pub fn merge(&mut self, other: &TypedElement) {
        self.annotations.merge(&other.annotations);
        self.typ.annotations.merge(&other.typ.annotations);
        for element in &other.elements {
            if !self.elements.contains(element) {
                self.elements.push(*element);
            }
        }
    }

    pub fn merged(mut self, other: &TypedElement) -> Self {
        self.merge(other);
        self
    }
}
