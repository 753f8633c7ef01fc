// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Type-variable substitution: instantiating declared templates against the
//! type arguments of the declaring type.

use super::{
    GraphType, MemberDescriptor, ParameterDescriptor, TypeAlgebraError, TypeArena, TypeShape,
    TypeTemplate,
};

/// Instantiates `template` by replacing `Var(i)` with `args[i]`.
///
/// A variable with no corresponding argument is a discovery-time type error:
/// the declaring type was used raw even though the member's type depends on
/// its parameters.
pub fn substitute(
    template: &TypeTemplate,
    args: &[GraphType],
    arena: &TypeArena,
) -> Result<GraphType, TypeAlgebraError> {
    match template {
        TypeTemplate::Var(index) => {
            args.get(*index)
                .cloned()
                .ok_or_else(|| TypeAlgebraError::UnresolvableTypeVariable {
                    index: *index,
                    in_type: template_display(template, arena),
                })
        }
        TypeTemplate::Class(id) => Ok(GraphType::class(*id)),
        TypeTemplate::Parameterized { raw, args: t_args } => {
            let args = t_args
                .iter()
                .map(|t| substitute(t, args, arena))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GraphType::parameterized(*raw, args))
        }
        TypeTemplate::Array(component) => {
            Ok(GraphType::array(substitute(component, args, arena)?))
        }
    }
}

/// Like [`substitute`], but erases unresolvable variables to an unbounded
/// wildcard instead of failing. Used while walking supertype hierarchies,
/// where a raw usage of a generic type must not abort the walk.
pub(super) fn substitute_lenient(
    template: &TypeTemplate,
    args: &[GraphType],
    arena: &TypeArena,
) -> GraphType {
    match template {
        TypeTemplate::Var(index) => args
            .get(*index)
            .cloned()
            .unwrap_or_else(|| GraphType::bounded([])),
        TypeTemplate::Class(id) => GraphType::class(*id),
        TypeTemplate::Parameterized { raw, args: t_args } => GraphType::parameterized(
            *raw,
            t_args.iter().map(|t| substitute_lenient(t, args, arena)),
        ),
        TypeTemplate::Array(component) => {
            GraphType::array(substitute_lenient(component, args, arena))
        }
    }
}

/// Resolves a member's declared type against the declaring type.
pub fn resolve_member_type(
    member: &MemberDescriptor,
    declaring: &GraphType,
    arena: &TypeArena,
) -> Result<GraphType, TypeAlgebraError> {
    substitute(&member.typ, declaring_args(declaring), arena)
}

/// Resolves a parameter's declared type against the declaring type.
pub fn resolve_parameter_type(
    parameter: &ParameterDescriptor,
    declaring: &GraphType,
    arena: &TypeArena,
) -> Result<GraphType, TypeAlgebraError> {
    substitute(&parameter.typ, declaring_args(declaring), arena)
}

fn declaring_args(declaring: &GraphType) -> &[GraphType] {
    match &declaring.shape {
        TypeShape::Parameterized { args, .. } => args,
        _ => &[],
    }
}

fn template_display(template: &TypeTemplate, arena: &TypeArena) -> String {
    match template {
        TypeTemplate::Var(index) => format!("#{index}"),
        TypeTemplate::Class(id) => arena[*id].name.clone(),
        TypeTemplate::Parameterized { raw, args } => {
            let args = args
                .iter()
                .map(|arg| template_display(arg, arena))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}<{}>", arena[*raw].name, args)
        }
        TypeTemplate::Array(component) => format!("[{}]", template_display(component, arena)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_algebra::ClassDescriptor;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn substitutes_variables_positionally() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");
        let list = arena.add_class(ClassDescriptor::new("List").type_param("T"));
        let map = arena.add_class(ClassDescriptor::new("Map").type_param("K").type_param("V"));

        let template = TypeTemplate::parameterized(
            map,
            [
                TypeTemplate::Var(0),
                TypeTemplate::parameterized(list, [TypeTemplate::Var(1)]),
            ],
        );
        let string = arena.primitive("String");

        let resolved = substitute(
            &template,
            &[GraphType::class(string), GraphType::class(int)],
            &arena,
        )
        .unwrap();

        assert_eq!(resolved.key(&arena), "Map<String, List<Int>>");
    }

    #[multiplatform_test]
    fn missing_argument_is_an_error() {
        let arena = TypeArena::new();
        let result = substitute(&TypeTemplate::Var(0), &[], &arena);

        assert!(matches!(
            result,
            Err(TypeAlgebraError::UnresolvableTypeVariable { index: 0, .. })
        ));
    }

    #[multiplatform_test]
    fn member_types_resolve_against_declaring_type() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");
        let list = arena.add_class(ClassDescriptor::new("List").type_param("T"));

        let member = MemberDescriptor::method("first", TypeTemplate::Var(0));
        let declaring = GraphType::parameterized(list, [GraphType::class(int)]);

        let resolved = resolve_member_type(&member, &declaring, &arena).unwrap();
        assert_eq!(resolved.key(&arena), "Int");

        // raw usage of the generic declaring type cannot resolve the member
        let raw_declaring = GraphType::class(list);
        assert!(resolve_member_type(&member, &raw_declaring, &arena).is_err());
    }
}
