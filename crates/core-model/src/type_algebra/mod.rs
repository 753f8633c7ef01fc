// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The closed type representation the engine operates on.
//!
//! Instead of a reflection API, sources describe themselves through
//! [`ClassDescriptor`]s interned in a [`TypeArena`]. A descriptor lists the
//! type's parameters, its supertypes (as [`TypeTemplate`]s that may reference
//! those parameters), its members, and its annotations. Resolved types are
//! [`GraphType`] values: named classes, parameterized applications, arrays,
//! wildcard-like bounds, and unions, each carrying an annotation set.

mod substitution;
mod supertype;

pub use substitution::{resolve_member_type, resolve_parameter_type, substitute};
pub use supertype::{common_supertype, common_supertype_with_fallback, stripped, union_of};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::{Annotation, AnnotationMap, names};
use crate::executable::Handler;
use crate::mapped_arena::{MappedArena, SerializableSlabIndex};

pub type TypeId = SerializableSlabIndex<ClassDescriptor>;

pub const ANY_TYPE: &str = "Any";
pub const UNIT_TYPE: &str = "Unit";

#[derive(Error, Debug)]
pub enum TypeAlgebraError {
    #[error("No type information for variable {index} in `{in_type}`")]
    UnresolvableTypeVariable { index: usize, in_type: String },

    #[error("No common supertype among `{types}`")]
    NoCommonSupertype { types: String },

    #[error("Unknown type `{0}`")]
    UnknownType(String),
}

/// Structural description of one named type: the capability-descriptor
/// replacement for a reflective `Class` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    /// Names of the type parameters; [`TypeTemplate::Var`] indexes into this.
    pub type_params: Vec<String>,
    /// Direct supertypes, possibly referencing the type parameters.
    pub supertypes: Vec<TypeTemplate>,
    pub members: Vec<MemberDescriptor>,
    pub annotations: AnnotationMap,
    /// Universal roots (`Any` and marker types registered as such) are
    /// excluded from common-supertype results unless nothing else remains.
    pub universal: bool,
    /// Record-shaped types expose their components through the record
    /// discovery strategy.
    pub record: bool,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_params: vec![],
            supertypes: vec![],
            members: vec![],
            annotations: AnnotationMap::default(),
            universal: false,
            record: false,
        }
    }

    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn supertype(mut self, template: TypeTemplate) -> Self {
        self.supertypes.push(template);
        self
    }

    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.add(annotation);
        self
    }

    pub fn universal(mut self) -> Self {
        self.universal = true;
        self
    }

    pub fn record(mut self) -> Self {
        self.record = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Field,
    Method,
    RecordComponent,
}

/// Structural description of one member (field, method, or record
/// component) of a [`ClassDescriptor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    /// Declared (return) type; may reference the declaring type's parameters.
    pub typ: TypeTemplate,
    pub params: Vec<ParameterDescriptor>,
    pub annotations: AnnotationMap,
    pub public: bool,
    /// Compiler-generated members (bridges and the like) are never exposed.
    pub synthetic: bool,
    /// Invocation handler; absent for members that are never executed
    /// (e.g. supertype declarations kept for typing only).
    #[serde(skip)]
    pub handler: Option<Handler>,
}

impl MemberDescriptor {
    pub fn field(name: impl Into<String>, typ: TypeTemplate) -> Self {
        Self::new(name, MemberKind::Field, typ)
    }

    pub fn method(name: impl Into<String>, typ: TypeTemplate) -> Self {
        Self::new(name, MemberKind::Method, typ)
    }

    pub fn record_component(name: impl Into<String>, typ: TypeTemplate) -> Self {
        Self::new(name, MemberKind::RecordComponent, typ)
    }

    fn new(name: impl Into<String>, kind: MemberKind, typ: TypeTemplate) -> Self {
        Self {
            name: name.into(),
            kind,
            typ,
            params: vec![],
            annotations: AnnotationMap::default(),
            public: true,
            synthetic: false,
            handler: None,
        }
    }

    pub fn param(mut self, param: ParameterDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.add(annotation);
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub typ: TypeTemplate,
    pub annotations: AnnotationMap,
    /// Implicit compiler-injected parameters are skipped by argument building.
    pub synthetic: bool,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, typ: TypeTemplate) -> Self {
        Self {
            name: name.into(),
            typ,
            annotations: AnnotationMap::default(),
            synthetic: false,
        }
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.add(annotation);
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }
}

/// A type expression as written in a declaration: leaves may reference the
/// declaring type's parameters by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeTemplate {
    Var(usize),
    Class(TypeId),
    Parameterized { raw: TypeId, args: Vec<TypeTemplate> },
    Array(Box<TypeTemplate>),
}

impl TypeTemplate {
    pub fn parameterized(raw: TypeId, args: impl IntoIterator<Item = TypeTemplate>) -> Self {
        TypeTemplate::Parameterized {
            raw,
            args: args.into_iter().collect(),
        }
    }

    pub fn array(component: TypeTemplate) -> Self {
        TypeTemplate::Array(Box::new(component))
    }
}

/// A fully resolved type: the engine's `javaType` analog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphType {
    pub shape: TypeShape,
    pub annotations: AnnotationMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeShape {
    Class(TypeId),
    Parameterized { raw: TypeId, args: Vec<GraphType> },
    Array(Box<GraphType>),
    /// Wildcard-like form: an unknown type below the given upper bounds.
    Bounded { uppers: Vec<GraphType> },
    Union(Vec<GraphType>),
}

impl GraphType {
    pub fn class(id: TypeId) -> Self {
        GraphType {
            shape: TypeShape::Class(id),
            annotations: AnnotationMap::default(),
        }
    }

    pub fn parameterized(raw: TypeId, args: impl IntoIterator<Item = GraphType>) -> Self {
        GraphType {
            shape: TypeShape::Parameterized {
                raw,
                args: args.into_iter().collect(),
            },
            annotations: AnnotationMap::default(),
        }
    }

    pub fn array(component: GraphType) -> Self {
        GraphType {
            shape: TypeShape::Array(Box::new(component)),
            annotations: AnnotationMap::default(),
        }
    }

    pub fn bounded(uppers: impl IntoIterator<Item = GraphType>) -> Self {
        GraphType {
            shape: TypeShape::Bounded {
                uppers: uppers.into_iter().collect(),
            },
            annotations: AnnotationMap::default(),
        }
    }

    pub fn union(members: impl IntoIterator<Item = GraphType>) -> Self {
        GraphType {
            shape: TypeShape::Union(members.into_iter().collect()),
            annotations: AnnotationMap::default(),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.add(annotation);
        self
    }

    /// The raw class behind this type, if there is a single one.
    pub fn raw(&self) -> Option<TypeId> {
        match &self.shape {
            TypeShape::Class(id) => Some(*id),
            TypeShape::Parameterized { raw, .. } => Some(*raw),
            TypeShape::Bounded { uppers } => uppers.first().and_then(GraphType::raw),
            TypeShape::Array(_) | TypeShape::Union(_) => None,
        }
    }

    /// The raw class after peeling arrays: used for context/type-name lookup.
    pub fn innermost_raw(&self) -> Option<TypeId> {
        match &self.shape {
            TypeShape::Array(component) => component.innermost_raw(),
            _ => self.raw(),
        }
    }

    /// Canonical structural key, annotations excluded. Two types are treated
    /// as the same type iff their keys are equal.
    pub fn key(&self, arena: &TypeArena) -> String {
        match &self.shape {
            TypeShape::Class(id) => arena[*id].name.clone(),
            TypeShape::Parameterized { raw, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.key(arena))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}<{}>", arena[*raw].name, args)
            }
            TypeShape::Array(component) => format!("[{}]", component.key(arena)),
            TypeShape::Bounded { uppers } => {
                if uppers.is_empty() {
                    "?".to_string()
                } else {
                    let uppers = uppers
                        .iter()
                        .map(|upper| upper.key(arena))
                        .collect::<Vec<_>>()
                        .join(" & ");
                    format!("? extends {uppers}")
                }
            }
            TypeShape::Union(members) => members
                .iter()
                .map(|member| member.key(arena))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    pub fn is_unit(&self, arena: &TypeArena) -> bool {
        self.raw().map(|id| arena[id].name == UNIT_TYPE).unwrap_or(false)
    }

    /// True if the raw class (or any type reachable from it) carries the
    /// given annotation.
    pub fn class_has_annotation(&self, arena: &TypeArena, name: &str) -> bool {
        self.annotations.has(name)
            || self
                .raw()
                .map(|id| arena[id].annotations.has(name))
                .unwrap_or(false)
    }
}

/// Interned store of class descriptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeArena {
    classes: MappedArena<String, ClassDescriptor>,
    any: TypeId,
    unit: TypeId,
}

impl TypeArena {
    pub fn new() -> Self {
        let mut classes = MappedArena::default();
        let any = classes.add(
            ANY_TYPE.to_string(),
            ClassDescriptor::new(ANY_TYPE).universal(),
        );
        let unit = classes.add(UNIT_TYPE.to_string(), ClassDescriptor::new(UNIT_TYPE));
        TypeArena { classes, any, unit }
    }

    /// Interns a descriptor under its name. Re-adding a name returns the
    /// existing id, keeping references stable.
    pub fn add_class(&mut self, descriptor: ClassDescriptor) -> TypeId {
        self.classes.add(descriptor.name.clone(), descriptor)
    }

    /// Registers a plain scalar-like type with no members.
    pub fn primitive(&mut self, name: &str) -> TypeId {
        self.classes.add(name.to_string(), ClassDescriptor::new(name))
    }

    /// Shallow registration: reserves an id for a name so that
    /// self-referential and mutually recursive descriptors can be built in
    /// two phases (declare, then [`TypeArena::define`]).
    pub fn declare(&mut self, name: &str) -> TypeId {
        self.classes.add(name.to_string(), ClassDescriptor::new(name))
    }

    /// Expanded registration: replaces the shallow descriptor. The name must
    /// match the declared one.
    pub fn define(&mut self, id: TypeId, descriptor: ClassDescriptor) {
        debug_assert_eq!(self.classes[id].name, descriptor.name);
        self.classes[id] = descriptor;
    }

    pub fn get_id(&self, name: &str) -> Option<TypeId> {
        self.classes.get_id(name)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get_by_key(name)
    }

    pub fn any(&self) -> TypeId {
        self.any
    }

    pub fn any_type(&self) -> GraphType {
        GraphType::class(self.any)
    }

    pub fn unit(&self) -> TypeId {
        self.unit
    }

    pub fn unit_type(&self) -> GraphType {
        GraphType::class(self.unit)
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (TypeId, &ClassDescriptor)> {
        self.classes.iter()
    }

    /// Raw-hierarchy subtype check (reflexive).
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut queue = vec![sub];
        let mut visited = vec![];
        while let Some(current) = queue.pop() {
            if current == sup {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            for template in &self[current].supertypes {
                if let Some(raw) = template_raw(template) {
                    queue.push(raw);
                }
            }
        }
        false
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        TypeArena::new()
    }
}

impl std::ops::Index<TypeId> for TypeArena {
    type Output = ClassDescriptor;

    fn index(&self, id: TypeId) -> &ClassDescriptor {
        &self.classes[id]
    }
}

pub(crate) fn template_raw(template: &TypeTemplate) -> Option<TypeId> {
    match template {
        TypeTemplate::Class(id) => Some(*id),
        TypeTemplate::Parameterized { raw, .. } => Some(*raw),
        TypeTemplate::Var(_) | TypeTemplate::Array(_) => None,
    }
}

/// True if the type (or its raw class) is marked as a stream/publisher
/// shape, classifying a member as a subscription under the convention
/// strategies.
pub fn is_publisher_shaped(arena: &TypeArena, typ: &GraphType) -> bool {
    typ.class_has_annotation(arena, names::PUBLISHER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn intern_is_stable() {
        let mut arena = TypeArena::new();
        let first = arena.add_class(ClassDescriptor::new("User"));
        let second = arena.add_class(ClassDescriptor::new("User").record());

        assert_eq!(first, second);
        assert!(!arena[first].record);
    }

    #[multiplatform_test]
    fn keys_are_structural() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");
        let list = arena.add_class(ClassDescriptor::new("List").type_param("T"));

        let typ = GraphType::parameterized(list, [GraphType::array(GraphType::class(int))]);

        assert_eq!(typ.key(&arena), "List<[Int]>");
    }

    #[multiplatform_test]
    fn subtype_walks_the_hierarchy() {
        let mut arena = TypeArena::new();
        let animal = arena.add_class(ClassDescriptor::new("Animal"));
        let dog = arena.add_class(ClassDescriptor::new("Dog").supertype(TypeTemplate::Class(animal)));
        let cat = arena.add_class(ClassDescriptor::new("Cat"));

        assert!(arena.is_subtype(dog, animal));
        assert!(arena.is_subtype(dog, dog));
        assert!(!arena.is_subtype(cat, animal));
        assert!(!arena.is_subtype(animal, dog));
    }
}
