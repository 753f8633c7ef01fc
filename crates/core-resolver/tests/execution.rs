// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use ingraph_core_model::annotation::{Annotation, names};
use ingraph_core_model::executable::{Handler, InvocationError};
use ingraph_core_model::mapping::MappingError;
use ingraph_core_model::operation::OperationKind;
use ingraph_core_model::type_algebra::{
    ClassDescriptor, GraphType, MemberDescriptor, ParameterDescriptor, TypeArena, TypeTemplate,
};
use ingraph_core_model::value::{Val, ValNumber};
use ingraph_core_model_builder::builder::operation_repository::OperationRegistry;
use ingraph_core_model_builder::builder::source_repository::OperationSourceRepository;
use ingraph_core_model_builder::config::BuildConfig;
use ingraph_core_resolver::converter::{OutputConverter, OutputConverterChain};
use ingraph_core_resolver::environment::ResolutionEnvironment;
use ingraph_core_resolver::{RequestContext, ResolutionError, SystemResolver};

fn build_system() -> SystemResolver {
    let mut arena = TypeArena::new();
    let int = arena.primitive("Int");
    let string = arena.primitive("String");
    let auth = arena.add_class(ClassDescriptor::new("AuthContext"));

    let user = arena.declare("User");
    arena.define(
        user,
        ClassDescriptor::new("User").member(
            MemberDescriptor::method("friends", TypeTemplate::array(TypeTemplate::Class(user)))
                .annotation(Annotation::new(names::QUERY))
                .param(
                    ParameterDescriptor::new("parent", TypeTemplate::Class(user))
                        .annotation(Annotation::new(names::SOURCE)),
                )
                // echo the injected parent back, so tests can observe it
                .handler(Handler::from_fn(|_, args| {
                    Ok(args.into_iter().next().unwrap_or(Val::Null))
                })),
        ),
    );

    let service = arena.add_class(
        ClassDescriptor::new("UserService")
            .member(
                MemberDescriptor::method("user_by_id", TypeTemplate::Class(user))
                    .annotation(Annotation::with_value(names::QUERY, "user"))
                    .param(ParameterDescriptor::new("id", TypeTemplate::Class(int)))
                    .handler(Handler::from_fn(|_, args| {
                        Ok(Val::Object(HashMap::from([
                            ("id".to_string(), args[0].clone()),
                            ("via".to_string(), Val::String("id".to_string())),
                        ])))
                    })),
            )
            .member(
                MemberDescriptor::method("user_by_name", TypeTemplate::Class(user))
                    .annotation(Annotation::with_value(names::QUERY, "user"))
                    .param(ParameterDescriptor::new("name", TypeTemplate::Class(string)))
                    .handler(Handler::from_fn(|_, args| {
                        Ok(Val::Object(HashMap::from([
                            ("name".to_string(), args[0].clone()),
                            ("via".to_string(), Val::String("name".to_string())),
                        ])))
                    })),
            )
            .member(
                MemberDescriptor::method("ping", TypeTemplate::Class(string))
                    .annotation(Annotation::new(names::QUERY))
                    .param(ParameterDescriptor::new("tag", TypeTemplate::Class(string)))
                    .handler(Handler::from_fn(|_, args| {
                        Ok(args.into_iter().next().unwrap_or(Val::Null))
                    })),
            )
            .member(
                MemberDescriptor::method("whoami", TypeTemplate::Class(string))
                    .annotation(Annotation::new(names::QUERY))
                    .param(
                        ParameterDescriptor::new("auth", TypeTemplate::Class(auth))
                            .annotation(Annotation::new(names::CONTEXT)),
                    )
                    .handler(Handler::from_fn(|_, args| Ok(args[0].clone()))),
            )
            .member(
                MemberDescriptor::method("greet", TypeTemplate::Class(string))
                    .annotation(Annotation::new(names::QUERY))
                    .handler(Handler::from_fn(|_, _| {
                        Ok(Val::String("hi".to_string()))
                    })),
            )
            .member(
                MemberDescriptor::method("limit", TypeTemplate::Class(int))
                    .annotation(Annotation::new(names::QUERY))
                    .param(
                        ParameterDescriptor::new("max", TypeTemplate::Class(int)).annotation(
                            Annotation::new(names::DEFAULT)
                                .param("value", Val::Number(ValNumber::I64(5))),
                        ),
                    )
                    .handler(Handler::from_fn(|_, args| Ok(args[0].clone()))),
            )
            .member(
                MemberDescriptor::method("boom", TypeTemplate::Class(string))
                    .annotation(Annotation::new(names::QUERY))
                    .handler(Handler::from_fn(|_, _| {
                        Err(InvocationError::failed("boom", "user code blew up"))
                    })),
            ),
    );

    let mut sources = OperationSourceRepository::new();
    sources.add_root(GraphType::class(service));
    sources.add_nested(GraphType::class(user));

    let registry = OperationRegistry::build(&sources, &arena, &BuildConfig::default()).unwrap();
    SystemResolver::new(registry, arena)
}

fn args(entries: &[(&str, Val)]) -> IndexMap<String, Val> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn overloads_dispatch_by_non_null_argument_names() {
    let system = build_system();
    let context = RequestContext::new();

    let by_id = system
        .resolve(
            &[],
            "user",
            OperationKind::Query,
            args(&[("id", Val::Number(ValNumber::I64(7)))]),
            None,
            &context,
        )
        .await
        .unwrap();
    assert_eq!(by_id.get("via"), Some(&Val::String("id".to_string())));
    assert_eq!(by_id.get("id"), Some(&Val::Number(ValNumber::I64(7))));

    let by_name = system
        .resolve(
            &[],
            "user",
            OperationKind::Query,
            args(&[("name", Val::String("x".to_string()))]),
            None,
            &context,
        )
        .await
        .unwrap();
    assert_eq!(by_name.get("via"), Some(&Val::String("name".to_string())));
}

#[tokio::test]
async fn dispatch_misses_are_unresolved_operation_errors() {
    let system = build_system();
    let context = RequestContext::new();

    let neither = system
        .resolve(&[], "user", OperationKind::Query, args(&[]), None, &context)
        .await;
    assert!(matches!(
        neither,
        Err(ResolutionError::UnresolvedOperation { .. })
    ));

    let both = system
        .resolve(
            &[],
            "user",
            OperationKind::Query,
            args(&[
                ("id", Val::Number(ValNumber::I64(7))),
                ("name", Val::String("x".to_string())),
            ]),
            None,
            &context,
        )
        .await;
    assert!(matches!(
        both,
        Err(ResolutionError::UnresolvedOperation { .. })
    ));

    // a null-valued argument does not count as supplied
    let null_name = system
        .resolve(
            &[],
            "user",
            OperationKind::Query,
            args(&[
                ("id", Val::Number(ValNumber::I64(7))),
                ("name", Val::Null),
            ]),
            None,
            &context,
        )
        .await
        .unwrap();
    assert_eq!(null_name.get("via"), Some(&Val::String("id".to_string())));
}

#[tokio::test]
async fn single_resolver_operations_dispatch_unconditionally() {
    let system = build_system();
    let context = RequestContext::new();

    // an unrelated argument name still selects the only resolver
    let result = system
        .resolve(
            &[],
            "ping",
            OperationKind::Query,
            args(&[("unrelated", Val::Bool(true))]),
            None,
            &context,
        )
        .await
        .unwrap();
    assert_eq!(result, Val::Null);

    let empty = system
        .resolve(&[], "ping", OperationKind::Query, args(&[]), None, &context)
        .await
        .unwrap();
    assert_eq!(empty, Val::Null);
}

#[tokio::test]
async fn nested_operations_receive_the_parent_result() {
    let system = build_system();
    let context = RequestContext::new();

    let parent = system
        .resolve(
            &[],
            "user",
            OperationKind::Query,
            args(&[("id", Val::Number(ValNumber::I64(7)))]),
            None,
            &context,
        )
        .await
        .unwrap();

    // the `parent` source argument is not part of the dispatch signature,
    // but the handler must receive the upstream object through injection
    let echoed = system
        .resolve(
            &["user"],
            "friends",
            OperationKind::Query,
            args(&[]),
            Some(&parent),
            &context,
        )
        .await
        .unwrap();
    assert_eq!(echoed, parent);
}

#[test_log::test(tokio::test)]
async fn context_arguments_bind_from_the_request_context() {
    let system = build_system();

    let context = RequestContext::new()
        .with("AuthContext", serde_json::json!({ "subject": "alice" }).into());
    let result = system
        .resolve(&[], "whoami", OperationKind::Query, args(&[]), None, &context)
        .await
        .unwrap();
    assert_eq!(
        result.get("subject"),
        Some(&Val::String("alice".to_string()))
    );

    let missing = system
        .resolve(
            &[],
            "whoami",
            OperationKind::Query,
            args(&[]),
            None,
            &RequestContext::new(),
        )
        .await;
    assert!(matches!(missing, Err(ResolutionError::Injection { .. })));
}

#[tokio::test]
async fn absent_arguments_fall_back_to_their_default() {
    let system = build_system();
    let context = RequestContext::new();

    let defaulted = system
        .resolve(&[], "limit", OperationKind::Query, args(&[]), None, &context)
        .await
        .unwrap();
    assert_eq!(defaulted, Val::Number(ValNumber::I64(5)));

    let supplied = system
        .resolve(
            &[],
            "limit",
            OperationKind::Query,
            args(&[("max", Val::Number(ValNumber::I64(9)))]),
            None,
            &context,
        )
        .await
        .unwrap();
    assert_eq!(supplied, Val::Number(ValNumber::I64(9)));
}

struct UppercaseConverter;

impl OutputConverter for UppercaseConverter {
    fn supports(&self, typ: &GraphType, arena: &TypeArena) -> bool {
        typ.raw().map(|id| arena[id].name == "String").unwrap_or(false)
    }

    fn convert_output(
        &self,
        original: Val,
        _typ: &GraphType,
        _env: &ResolutionEnvironment<'_>,
    ) -> Result<Val, MappingError> {
        match original {
            Val::String(s) => Ok(Val::String(s.to_uppercase())),
            other => Ok(other),
        }
    }
}

#[tokio::test]
async fn output_converters_run_first_match_wins() {
    let system = build_system()
        .with_output_converters(OutputConverterChain::new(vec![Arc::new(UppercaseConverter)]));
    let context = RequestContext::new();

    let result = system
        .resolve(&[], "greet", OperationKind::Query, args(&[]), None, &context)
        .await
        .unwrap();
    assert_eq!(result, Val::String("HI".to_string()));
}

#[test_log::test(tokio::test)]
async fn invocation_failures_are_wrapped_with_their_cause() {
    let system = build_system();
    let context = RequestContext::new();

    let error = system
        .resolve(&[], "boom", OperationKind::Query, args(&[]), None, &context)
        .await
        .unwrap_err();

    match &error {
        ResolutionError::Invocation { operation, source } => {
            assert_eq!(operation, "boom");
            assert!(std::error::Error::source(source).is_some());
        }
        other => panic!("expected an invocation error, got {other}"),
    }
}

#[tokio::test]
async fn unknown_operations_and_trails_are_not_found() {
    let system = build_system();
    let context = RequestContext::new();

    let missing = system
        .resolve(&[], "nope", OperationKind::Query, args(&[]), None, &context)
        .await;
    assert!(matches!(
        missing,
        Err(ResolutionError::OperationNotFound { .. })
    ));

    let bad_trail = system
        .resolve(
            &["nope"],
            "friends",
            OperationKind::Query,
            args(&[]),
            None,
            &context,
        )
        .await;
    assert!(matches!(
        bad_trail,
        Err(ResolutionError::OperationNotFound { .. })
    ));
}
