// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Discovery strategies: given a source type's descriptor, produce the raw
//! resolver sets for queries, mutations, and subscriptions.
//!
//! All strategies share AND-composed member filters (synthetic members are
//! always excluded) and are structurally comparable: two instances whose
//! kind, name-generator kind, and argument-builder kind match are the same
//! strategy, which lets the source repository deduplicate registrations.

use std::sync::Arc;

use tracing::debug;

use ingraph_core_model::annotation::names;
use ingraph_core_model::executable::{
    Executable, FieldExecutable, Handler, InvocationError, MethodExecutable,
};
use ingraph_core_model::resolver::{Deprecation, Resolver};
use ingraph_core_model::type_algebra::{
    ClassDescriptor, GraphType, MemberDescriptor, MemberKind, TypeArena, TypeId,
    is_publisher_shaped, resolve_member_type,
};
use ingraph_core_model::typed_element::{ElementRef, TypedElement};
use ingraph_core_model::value::Val;

use crate::builder::argument_builder::{ArgumentBuilder, DefaultArgumentBuilder};
use crate::builder::name_generator::{
    BeanNameGenerator, MemberNameGenerator, OperationNameGenerator,
};
use crate::error::ModelBuildingError;

pub type MemberFilter = Arc<dyn Fn(&MemberDescriptor) -> bool + Send + Sync>;

#[derive(Debug, Default)]
pub struct DiscoveredResolvers {
    pub queries: Vec<Resolver>,
    pub mutations: Vec<Resolver>,
    pub subscriptions: Vec<Resolver>,
}

pub trait ResolverBuilder: Send + Sync {
    fn kind(&self) -> &'static str;

    fn name_generator(&self) -> &dyn OperationNameGenerator;

    fn argument_builder(&self) -> &dyn ArgumentBuilder;

    fn filters(&self) -> &[MemberFilter];

    fn build(
        &self,
        source: &GraphType,
        arena: &TypeArena,
    ) -> Result<DiscoveredResolvers, ModelBuildingError>;

    /// Structural strategy equality, for deduplication across sources.
    fn same_strategy(&self, other: &dyn ResolverBuilder) -> bool {
        self.kind() == other.kind()
            && self.name_generator().kind() == other.name_generator().kind()
            && self.argument_builder().kind() == other.argument_builder().kind()
    }
}

fn accepts(filters: &[MemberFilter], member: &MemberDescriptor) -> bool {
    !member.synthetic && filters.iter().all(|filter| filter(member))
}

fn source_descriptor<'a>(
    source: &GraphType,
    arena: &'a TypeArena,
) -> Result<(TypeId, &'a ClassDescriptor), ModelBuildingError> {
    let raw = source.raw().ok_or_else(|| {
        ModelBuildingError::Generic("source type has no raw class".to_string())
    })?;
    Ok((raw, &arena[raw]))
}

fn resolve_element(
    member: &MemberDescriptor,
    element_ref: ElementRef,
    logical_name: &str,
    source: &GraphType,
    arena: &TypeArena,
) -> Result<TypedElement, ModelBuildingError> {
    let typ = resolve_member_type(member, source, arena).map_err(|cause| {
        ModelBuildingError::UnresolvableType {
            member: member.name.clone(),
            source: cause,
        }
    })?;
    Ok(TypedElement::new(
        logical_name,
        typ,
        element_ref,
        member.annotations.clone(),
    ))
}

fn build_resolver(
    member: &MemberDescriptor,
    element: TypedElement,
    operation_name: String,
    source: &GraphType,
    arena: &TypeArena,
    argument_builder: &dyn ArgumentBuilder,
) -> Result<Resolver, ModelBuildingError> {
    let executable: Arc<dyn Executable> = match (member.kind, &member.handler) {
        (MemberKind::Field | MemberKind::RecordComponent, None) => {
            Arc::new(FieldExecutable::new(element))
        }
        (_, handler) => {
            let handler = handler.clone().unwrap_or_else(|| {
                let member_name = member.name.clone();
                Handler::from_fn(move |_, _| Err(InvocationError::NoHandler(member_name.clone())))
            });
            Arc::new(MethodExecutable::new(
                element,
                member.params.clone(),
                handler,
            ))
        }
    };

    let arguments = argument_builder.build_arguments(member, source, arena)?;

    let description = member
        .annotations
        .string_value(names::DESCRIPTION)
        .map(str::to_string);
    let deprecation = member.annotations.get(names::DEPRECATED).map(|annotation| {
        Deprecation {
            reason: annotation
                .params
                .get("reason")
                .and_then(Val::as_str)
                .or_else(|| annotation.string_value())
                .map(str::to_string),
        }
    });

    Ok(Resolver::new(operation_name, executable, arguments, arena)
        .description(description)
        .deprecation(deprecation)
        .embeddable(member.annotations.has(names::EMBEDDABLE)))
}

/// Exposure is opt-in: only members carrying a query/mutation/subscription
/// annotation are discovered; names, descriptions, and deprecations come
/// from annotation data with member-name fallback.
pub struct AnnotatedResolverBuilder {
    filters: Vec<MemberFilter>,
    name_generator: Box<dyn OperationNameGenerator>,
    argument_builder: Box<dyn ArgumentBuilder>,
}

impl Default for AnnotatedResolverBuilder {
    fn default() -> Self {
        Self {
            filters: vec![],
            name_generator: Box::new(MemberNameGenerator),
            argument_builder: Box::new(DefaultArgumentBuilder::default()),
        }
    }
}

impl AnnotatedResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: MemberFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_argument_builder(mut self, argument_builder: Box<dyn ArgumentBuilder>) -> Self {
        self.argument_builder = argument_builder;
        self
    }
}

impl ResolverBuilder for AnnotatedResolverBuilder {
    fn kind(&self) -> &'static str {
        "annotated"
    }

    fn name_generator(&self) -> &dyn OperationNameGenerator {
        self.name_generator.as_ref()
    }

    fn argument_builder(&self) -> &dyn ArgumentBuilder {
        self.argument_builder.as_ref()
    }

    fn filters(&self) -> &[MemberFilter] {
        &self.filters
    }

    fn build(
        &self,
        source: &GraphType,
        arena: &TypeArena,
    ) -> Result<DiscoveredResolvers, ModelBuildingError> {
        let (raw, descriptor) = source_descriptor(source, arena)?;
        let mut discovered = DiscoveredResolvers::default();

        for (index, member) in descriptor.members.iter().enumerate() {
            if !accepts(&self.filters, member) {
                continue;
            }

            for (marker, bucket) in [
                (names::QUERY, &mut discovered.queries),
                (names::MUTATION, &mut discovered.mutations),
                (names::SUBSCRIPTION, &mut discovered.subscriptions),
            ] {
                let Some(annotation) = member.annotations.get(marker) else {
                    continue;
                };
                let name = annotation
                    .string_value()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.name_generator.operation_name(member));

                let element =
                    resolve_element(member, ElementRef::new(raw, index), &member.name, source, arena)?;
                bucket.push(build_resolver(
                    member,
                    element,
                    name,
                    source,
                    arena,
                    self.argument_builder.as_ref(),
                )?);
            }
        }

        debug!(
            source = %descriptor.name,
            queries = discovered.queries.len(),
            mutations = discovered.mutations.len(),
            "annotated discovery"
        );
        Ok(discovered)
    }
}

/// Convention over configuration: every public method is exposed and
/// classified by return-type shape (unit means mutation, a publisher shape
/// means subscription, anything else a query).
pub struct PublicResolverBuilder {
    filters: Vec<MemberFilter>,
    name_generator: Box<dyn OperationNameGenerator>,
    argument_builder: Box<dyn ArgumentBuilder>,
}

impl Default for PublicResolverBuilder {
    fn default() -> Self {
        Self {
            filters: vec![],
            name_generator: Box::new(MemberNameGenerator),
            argument_builder: Box::new(DefaultArgumentBuilder::default()),
        }
    }
}

impl PublicResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: MemberFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl ResolverBuilder for PublicResolverBuilder {
    fn kind(&self) -> &'static str {
        "public"
    }

    fn name_generator(&self) -> &dyn OperationNameGenerator {
        self.name_generator.as_ref()
    }

    fn argument_builder(&self) -> &dyn ArgumentBuilder {
        self.argument_builder.as_ref()
    }

    fn filters(&self) -> &[MemberFilter] {
        &self.filters
    }

    fn build(
        &self,
        source: &GraphType,
        arena: &TypeArena,
    ) -> Result<DiscoveredResolvers, ModelBuildingError> {
        let (raw, descriptor) = source_descriptor(source, arena)?;
        let mut discovered = DiscoveredResolvers::default();

        for (index, member) in descriptor.members.iter().enumerate() {
            if member.kind != MemberKind::Method || !member.public {
                continue;
            }
            if !accepts(&self.filters, member) {
                continue;
            }

            let name = self.name_generator.operation_name(member);
            let element =
                resolve_element(member, ElementRef::new(raw, index), &member.name, source, arena)?;
            let resolver = build_resolver(
                member,
                element,
                name,
                source,
                arena,
                self.argument_builder.as_ref(),
            )?;

            if resolver.executable.return_type().is_unit(arena) {
                discovered.mutations.push(resolver);
            } else if is_publisher_shaped(arena, resolver.executable.return_type()) {
                discovered.subscriptions.push(resolver);
            } else {
                discovered.queries.push(resolver);
            }
        }

        Ok(discovered)
    }
}

/// The public strategy narrowed to accessor shape: getters become queries
/// named after the property, setters become mutations. A backing field with
/// the property's name contributes its annotations to the logical element.
pub struct BeanResolverBuilder {
    filters: Vec<MemberFilter>,
    name_generator: Box<dyn OperationNameGenerator>,
    argument_builder: Box<dyn ArgumentBuilder>,
}

impl Default for BeanResolverBuilder {
    fn default() -> Self {
        Self {
            filters: vec![],
            name_generator: Box::new(BeanNameGenerator),
            argument_builder: Box::new(DefaultArgumentBuilder::default()),
        }
    }
}

impl BeanResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: MemberFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl ResolverBuilder for BeanResolverBuilder {
    fn kind(&self) -> &'static str {
        "bean"
    }

    fn name_generator(&self) -> &dyn OperationNameGenerator {
        self.name_generator.as_ref()
    }

    fn argument_builder(&self) -> &dyn ArgumentBuilder {
        self.argument_builder.as_ref()
    }

    fn filters(&self) -> &[MemberFilter] {
        &self.filters
    }

    fn build(
        &self,
        source: &GraphType,
        arena: &TypeArena,
    ) -> Result<DiscoveredResolvers, ModelBuildingError> {
        let (raw, descriptor) = source_descriptor(source, arena)?;
        let mut discovered = DiscoveredResolvers::default();

        for (index, member) in descriptor.members.iter().enumerate() {
            if member.kind != MemberKind::Method || !member.public {
                continue;
            }
            if !accepts(&self.filters, member) {
                continue;
            }
            let Some(property) = BeanNameGenerator::property_name(&member.name) else {
                continue;
            };

            let client_params = member.params.iter().filter(|p| !p.synthetic).count();
            let is_setter = member.name.starts_with("set");
            if is_setter && client_params == 0 {
                continue;
            }
            if !is_setter && client_params > 0 {
                continue;
            }

            let name = self.name_generator.operation_name(member);
            let mut element =
                resolve_element(member, ElementRef::new(raw, index), &property, source, arena)?;

            // a backing field (or record component) named after the property
            // merges into the same logical element
            for (field_index, field) in descriptor.members.iter().enumerate() {
                if field.kind != MemberKind::Method
                    && field_index != index
                    && field.name == property
                {
                    element.merge(&resolve_element(
                        field,
                        ElementRef::new(raw, field_index),
                        &property,
                        source,
                        arena,
                    )?);
                }
            }

            let resolver = build_resolver(
                member,
                element,
                name,
                source,
                arena,
                self.argument_builder.as_ref(),
            )?;

            if is_setter {
                discovered.mutations.push(resolver);
            } else {
                discovered.queries.push(resolver);
            }
        }

        Ok(discovered)
    }
}

/// Record-shaped types expose each component accessor as one query resolver
/// named after the component.
pub struct RecordResolverBuilder {
    filters: Vec<MemberFilter>,
    name_generator: Box<dyn OperationNameGenerator>,
    argument_builder: Box<dyn ArgumentBuilder>,
}

impl Default for RecordResolverBuilder {
    fn default() -> Self {
        Self {
            filters: vec![],
            name_generator: Box::new(MemberNameGenerator),
            argument_builder: Box::new(DefaultArgumentBuilder::default()),
        }
    }
}

impl RecordResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: MemberFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl ResolverBuilder for RecordResolverBuilder {
    fn kind(&self) -> &'static str {
        "record"
    }

    fn name_generator(&self) -> &dyn OperationNameGenerator {
        self.name_generator.as_ref()
    }

    fn argument_builder(&self) -> &dyn ArgumentBuilder {
        self.argument_builder.as_ref()
    }

    fn filters(&self) -> &[MemberFilter] {
        &self.filters
    }

    fn build(
        &self,
        source: &GraphType,
        arena: &TypeArena,
    ) -> Result<DiscoveredResolvers, ModelBuildingError> {
        let (raw, descriptor) = source_descriptor(source, arena)?;
        let mut discovered = DiscoveredResolvers::default();

        if !descriptor.record {
            return Ok(discovered);
        }

        for (index, member) in descriptor.members.iter().enumerate() {
            if member.kind != MemberKind::RecordComponent || !accepts(&self.filters, member) {
                continue;
            }

            let name = self.name_generator.operation_name(member);
            let element =
                resolve_element(member, ElementRef::new(raw, index), &member.name, source, arena)?;
            discovered.queries.push(build_resolver(
                member,
                element,
                name,
                source,
                arena,
                self.argument_builder.as_ref(),
            )?);
        }

        Ok(discovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingraph_core_model::annotation::Annotation;
    use ingraph_core_model::type_algebra::{ClassDescriptor, ParameterDescriptor, TypeTemplate};

    fn service_arena() -> (TypeArena, GraphType) {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");
        let user = arena.add_class(ClassDescriptor::new("User"));
        let stream = arena.add_class(
            ClassDescriptor::new("UserStream").annotation(Annotation::new(names::PUBLISHER)),
        );

        let service = arena.add_class(
            ClassDescriptor::new("UserService")
                .member(
                    MemberDescriptor::method("user", TypeTemplate::Class(user))
                        .annotation(Annotation::new(names::QUERY))
                        .param(ParameterDescriptor::new("id", TypeTemplate::Class(int)))
                        .handler(Handler::from_fn(|_, _| Ok(Val::Null))),
                )
                .member(
                    MemberDescriptor::method("rename", TypeTemplate::Class(arena.unit()))
                        .handler(Handler::from_fn(|_, _| Ok(Val::Null))),
                )
                .member(
                    MemberDescriptor::method("watch", TypeTemplate::Class(stream))
                        .handler(Handler::from_fn(|_, _| Ok(Val::Null))),
                )
                .member(
                    MemberDescriptor::method("bridge", TypeTemplate::Class(user)).synthetic(),
                )
                .member(
                    MemberDescriptor::method("internal", TypeTemplate::Class(user)).private(),
                ),
        );
        (arena, GraphType::class(service))
    }

    #[test]
    fn annotated_discovery_is_opt_in() {
        let (arena, service) = service_arena();
        let discovered = AnnotatedResolverBuilder::new().build(&service, &arena).unwrap();

        assert_eq!(discovered.queries.len(), 1);
        assert_eq!(discovered.queries[0].name, "user");
        assert!(discovered.mutations.is_empty());
    }

    #[test]
    fn public_discovery_classifies_by_return_shape() {
        let (arena, service) = service_arena();
        let discovered = PublicResolverBuilder::new().build(&service, &arena).unwrap();

        let names_of = |resolvers: &[Resolver]| {
            resolvers.iter().map(|r| r.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names_of(&discovered.queries), vec!["user"]);
        assert_eq!(names_of(&discovered.mutations), vec!["rename"]);
        assert_eq!(names_of(&discovered.subscriptions), vec!["watch"]);
    }

    #[test]
    fn synthetic_and_filtered_members_are_excluded() {
        let (arena, service) = service_arena();
        let builder = PublicResolverBuilder::new()
            .with_filter(Arc::new(|member: &MemberDescriptor| member.name != "watch"));
        let discovered = builder.build(&service, &arena).unwrap();

        assert!(discovered.subscriptions.is_empty());
        assert!(
            !discovered
                .queries
                .iter()
                .any(|resolver| resolver.name == "bridge" || resolver.name == "internal")
        );
    }

    #[test]
    fn bean_discovery_merges_the_backing_field() {
        let mut arena = TypeArena::new();
        let string = arena.primitive("String");
        let bean = arena.add_class(
            ClassDescriptor::new("UserBean")
                .member(
                    MemberDescriptor::field("name", TypeTemplate::Class(string)).annotation(
                        Annotation::with_value(names::DESCRIPTION, "the display name"),
                    ),
                )
                .member(
                    MemberDescriptor::method("get_name", TypeTemplate::Class(string))
                        .handler(Handler::from_fn(|_, _| Ok(Val::Null))),
                )
                .member(
                    MemberDescriptor::method("set_name", TypeTemplate::Class(arena.unit()))
                        .param(ParameterDescriptor::new("name", TypeTemplate::Class(string)))
                        .handler(Handler::from_fn(|_, _| Ok(Val::Null))),
                ),
        );

        let discovered = BeanResolverBuilder::new()
            .build(&GraphType::class(bean), &arena)
            .unwrap();

        assert_eq!(discovered.queries.len(), 1);
        let getter = &discovered.queries[0];
        assert_eq!(getter.name, "name");
        // field + accessor merged into one logical element
        assert_eq!(getter.executable.element().elements().len(), 2);
        assert!(getter.executable.element().annotations.has(names::DESCRIPTION));

        assert_eq!(discovered.mutations.len(), 1);
        assert_eq!(discovered.mutations[0].name, "name");
    }

    #[test]
    fn record_discovery_exposes_components() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");
        let point = arena.add_class(
            ClassDescriptor::new("Point")
                .record()
                .member(MemberDescriptor::record_component("x", TypeTemplate::Class(int)))
                .member(MemberDescriptor::record_component("y", TypeTemplate::Class(int))),
        );

        let discovered = RecordResolverBuilder::new()
            .build(&GraphType::class(point), &arena)
            .unwrap();

        assert_eq!(discovered.queries.len(), 2);
        assert_eq!(discovered.queries[0].name, "x");
        assert_eq!(discovered.queries[1].name, "y");

        // non-record types contribute nothing
        let user = arena.add_class(ClassDescriptor::new("User"));
        let empty = RecordResolverBuilder::new()
            .build(&GraphType::class(user), &arena)
            .unwrap();
        assert!(empty.queries.is_empty());
    }

    #[test]
    fn strategies_compare_structurally() {
        let left = AnnotatedResolverBuilder::new();
        let right = AnnotatedResolverBuilder::new();
        let public = PublicResolverBuilder::new();

        assert!(left.same_strategy(&right));
        assert!(!left.same_strategy(&public));
    }
}
