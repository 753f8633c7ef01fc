// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::argument::OperationArgument;
use crate::executable::Executable;
use crate::type_algebra::{GraphType, TypeArena, stripped};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deprecation {
    pub reason: Option<String>,
}

/// One concrete way to satisfy an operation: a single executable with its
/// accepted arguments and the dispatch fingerprints it answers to.
#[derive(Debug)]
pub struct Resolver {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<Deprecation>,
    pub executable: Arc<dyn Executable>,
    pub arguments: Vec<OperationArgument>,
    /// Bounds-erased version of the executable's declared return type.
    pub return_type: GraphType,
    /// Whether the operation built from this resolver may be attached under
    /// any result of its source type, independent of the nesting trail.
    pub embeddable: bool,
}

impl Resolver {
    pub fn new(
        name: impl Into<String>,
        executable: Arc<dyn Executable>,
        arguments: Vec<OperationArgument>,
        arena: &TypeArena,
    ) -> Self {
        let return_type = stripped(arena, executable.return_type());
        Self {
            name: name.into(),
            description: None,
            deprecation: None,
            executable,
            arguments,
            return_type,
            embeddable: false,
        }
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn deprecation(mut self, deprecation: Option<Deprecation>) -> Self {
        self.deprecation = deprecation;
        self
    }

    pub fn embeddable(mut self, embeddable: bool) -> Self {
        self.embeddable = embeddable;
        self
    }

    /// Arguments bound to the parent operation's result.
    pub fn source_arguments(&self) -> impl Iterator<Item = &OperationArgument> {
        self.arguments.iter().filter(|arg| arg.resolver_source)
    }

    pub fn source_types(&self) -> Vec<&GraphType> {
        self.source_arguments().map(|arg| &arg.typ).collect()
    }

    /// The argument-name signatures this resolver answers to: one per
    /// possible excluded source argument, plus one excluding none. Context
    /// and paging arguments are never part of a fingerprint.
    pub fn fingerprints(&self) -> Vec<String> {
        self.fingerprints_excluding(&[])
    }

    /// Like [`Resolver::fingerprints`], with additional excluded names. The
    /// operation builder passes the names that any overload marks as
    /// context/paging, so the exclusion holds across the whole operation.
    pub fn fingerprints_excluding(&self, excluded: &[&str]) -> Vec<String> {
        let base: Vec<&str> = self
            .arguments
            .iter()
            .filter(|arg| arg.fingerprint_relevant() && !excluded.contains(&arg.name.as_str()))
            .map(|arg| arg.name.as_str())
            .collect();

        let mut fingerprints = vec![fingerprint_of(base.iter().copied())];
        for source in self.source_arguments() {
            fingerprints.push(fingerprint_of(
                base.iter().copied().filter(|name| *name != source.name),
            ));
        }
        fingerprints
    }

    pub fn supports_paged_requests(&self) -> bool {
        self.arguments.iter().any(|arg| arg.paging)
    }

    /// A primary resolver's sole client-visible argument is an identity
    /// lookup.
    pub fn is_primary(&self) -> bool {
        let mut client_args = self
            .arguments
            .iter()
            .filter(|arg| arg.mappable && !arg.context && !arg.resolver_source);
        match (client_args.next(), client_args.next()) {
            (Some(only), None) => only.identity,
            _ => false,
        }
    }

    /// Identity is defined by the underlying executable.
    pub fn same_executable(&self, other: &Resolver) -> bool {
        self.executable.element().elements() == other.executable.element().elements()
    }
}

/// The dispatch key for a set of argument names: sorted and comma-joined.
pub fn fingerprint_of<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_unstable();
    names.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationMap;
    use crate::executable::{Handler, MethodExecutable};
    use crate::type_algebra::ClassDescriptor;
    use crate::typed_element::{ElementRef, TypedElement};
    use crate::value::Val;
    use multiplatform_test::multiplatform_test;

    fn resolver(arena: &mut TypeArena, arguments: Vec<OperationArgument>) -> Resolver {
        let user = arena.add_class(ClassDescriptor::new("User"));
        let element = TypedElement::new(
            "user",
            GraphType::class(user),
            ElementRef::new(user, 0),
            AnnotationMap::default(),
        );
        let executable = MethodExecutable::new(
            element,
            vec![],
            Handler::from_fn(|_, _| Ok(Val::Null)),
        );
        Resolver::new("user", Arc::new(executable), arguments, arena)
    }

    #[multiplatform_test]
    fn fingerprint_is_sorted_and_comma_joined() {
        assert_eq!(fingerprint_of(["b", "a", "c"]), "a,b,c");
        assert_eq!(fingerprint_of([]), "");
    }

    #[multiplatform_test]
    fn one_fingerprint_per_excluded_source_argument() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");
        let arguments = vec![
            OperationArgument::new("id", GraphType::class(int)),
            OperationArgument::new("parent", GraphType::class(int)).resolver_source(),
        ];
        let resolver = resolver(&mut arena, arguments);

        let fingerprints = resolver.fingerprints();
        assert_eq!(fingerprints, vec!["id,parent".to_string(), "id".to_string()]);
    }

    #[multiplatform_test]
    fn context_and_paging_arguments_are_excluded() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");
        let arguments = vec![
            OperationArgument::new("id", GraphType::class(int)),
            OperationArgument::new("ctx", GraphType::class(int)).context(),
            OperationArgument::new("page", GraphType::class(int)).paging(),
        ];
        let resolver = resolver(&mut arena, arguments);

        assert_eq!(resolver.fingerprints(), vec!["id".to_string()]);
    }

    #[multiplatform_test]
    fn primary_resolver_has_a_single_identity_argument() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");

        let primary = resolver(
            &mut arena,
            vec![OperationArgument::new("id", GraphType::class(int)).identity()],
        );
        assert!(primary.is_primary());

        let not_primary = resolver(
            &mut arena,
            vec![
                OperationArgument::new("id", GraphType::class(int)).identity(),
                OperationArgument::new("name", GraphType::class(int)),
            ],
        );
        assert!(!not_primary.is_primary());
    }
}
