// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The facts a schema builder needs per operation (name, arguments, resolved
//! type) rendered as graph-schema definitions.

use async_graphql_parser::{
    Pos, Positioned,
    types::{BaseType, ConstDirective, FieldDefinition, InputValueDefinition, Type},
};
use async_graphql_value::{ConstValue, Name};

use crate::argument::OperationArgument;
use crate::operation::Operation;
use crate::type_algebra::{ANY_TYPE, GraphType, TypeArena, TypeShape};

pub fn default_positioned<T>(value: T) -> Positioned<T> {
    Positioned::new(value, Pos::default())
}

pub fn default_positioned_name(value: &str) -> Positioned<Name> {
    default_positioned(Name::new(value))
}

/// Schema-facing rendering of a resolved type. Arrays map to lists; every
/// other shape is referenced by its raw type name (the schema layer maps
/// unions and bounds through its own type registry).
pub fn schema_type(typ: &GraphType, arena: &TypeArena) -> Type {
    match &typ.shape {
        TypeShape::Array(component) => Type {
            base: BaseType::List(Box::new(schema_type(component, arena))),
            nullable: true,
        },
        _ => {
            let name = typ
                .raw()
                .map(|id| arena[id].name.clone())
                .unwrap_or_else(|| ANY_TYPE.to_string());
            Type {
                base: BaseType::Named(Name::new(name)),
                nullable: true,
            }
        }
    }
}

pub fn input_value_definition(
    argument: &OperationArgument,
    arena: &TypeArena,
) -> InputValueDefinition {
    let default_value = argument
        .default_value
        .to_val()
        .and_then(|val| ConstValue::try_from(val).ok())
        .map(default_positioned);

    InputValueDefinition {
        description: argument.description.clone().map(default_positioned),
        name: default_positioned_name(&argument.name),
        ty: default_positioned(schema_type(&argument.typ, arena)),
        default_value,
        directives: vec![],
    }
}

pub fn field_definition(operation: &Operation, arena: &TypeArena) -> FieldDefinition {
    let directives = operation
        .deprecation
        .as_ref()
        .map(|deprecation| {
            let arguments = deprecation
                .reason
                .as_ref()
                .map(|reason| {
                    vec![(
                        default_positioned_name("reason"),
                        default_positioned(ConstValue::String(reason.clone())),
                    )]
                })
                .unwrap_or_default();
            default_positioned(ConstDirective {
                name: default_positioned_name("deprecated"),
                arguments,
            })
        })
        .into_iter()
        .collect();

    FieldDefinition {
        description: operation.description.clone().map(default_positioned),
        name: default_positioned_name(&operation.name),
        arguments: operation
            .arguments
            .iter()
            .filter(|argument| argument.mappable && !argument.context)
            .map(|argument| default_positioned(input_value_definition(argument, arena)))
            .collect(),
        ty: default_positioned(schema_type(&operation.typ, arena)),
        directives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::annotation::AnnotationMap;
    use crate::argument::DefaultValue;
    use crate::executable::{Handler, MethodExecutable};
    use crate::operation::OperationKind;
    use crate::resolver::{Deprecation, Resolver};
    use crate::type_algebra::ClassDescriptor;
    use crate::typed_element::{ElementRef, TypedElement};
    use crate::value::{Val, ValNumber};
    use multiplatform_test::multiplatform_test;

    fn sample_operation(arena: &mut TypeArena) -> Operation {
        let user = arena.add_class(ClassDescriptor::new("User"));
        let int = arena.primitive("Int");

        let element = TypedElement::new(
            "user",
            GraphType::class(user),
            ElementRef::new(user, 0),
            AnnotationMap::default(),
        );
        let resolver = Resolver::new(
            "user",
            Arc::new(MethodExecutable::new(
                element,
                vec![],
                Handler::from_fn(|_, _| Ok(Val::Null)),
            )),
            vec![
                OperationArgument::new("id", GraphType::class(int))
                    .default_value(DefaultValue::Value(Val::Number(ValNumber::I64(5)))),
                OperationArgument::new("ctx", GraphType::class(int)).context(),
            ],
            arena,
        );
        let resolver = Arc::new(resolver);

        Operation {
            name: "user".to_string(),
            kind: OperationKind::Query,
            description: Some("Look up one user".to_string()),
            deprecation: Some(Deprecation {
                reason: Some("use `person`".to_string()),
            }),
            typ: GraphType::class(user),
            arguments: resolver.arguments.clone(),
            sortable_arguments: vec![],
            by_fingerprint: HashMap::from([("id".to_string(), resolver.clone())]),
            resolvers: vec![resolver],
            source_types: vec![],
            embeddable: false,
        }
    }

    #[multiplatform_test]
    fn field_definition_carries_name_arguments_and_deprecation() {
        let mut arena = TypeArena::new();
        let operation = sample_operation(&mut arena);

        let definition = field_definition(&operation, &arena);

        assert_eq!(definition.name.node.as_str(), "user");
        // context argument is not client-visible
        assert_eq!(definition.arguments.len(), 1);
        assert_eq!(definition.arguments[0].node.name.node.as_str(), "id");
        assert!(definition.arguments[0].node.default_value.is_some());
        assert_eq!(definition.directives.len(), 1);
        assert_eq!(definition.directives[0].node.name.node.as_str(), "deprecated");
    }

    #[multiplatform_test]
    fn arrays_render_as_lists() {
        let mut arena = TypeArena::new();
        let int = arena.primitive("Int");

        let rendered = schema_type(&GraphType::array(GraphType::class(int)), &arena);
        assert!(matches!(rendered.base, BaseType::List(_)));
    }
}
