// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The uniform invocation contract behind every resolver.
//!
//! A method-backed executable delegates to the [`Handler`] registered on the
//! member descriptor; a field-backed executable ignores the argument array
//! and reads the named field from the source object.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::type_algebra::{GraphType, ParameterDescriptor};
use crate::typed_element::TypedElement;
use crate::value::Val;

#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Invocation of `{member}` failed")]
    Failed {
        member: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No handler registered for `{0}`")]
    NoHandler(String),

    #[error("Field `{0}` requires an object source value")]
    NoSource(String),
}

impl InvocationError {
    pub fn failed(
        member: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        InvocationError::Failed {
            member: member.into(),
            cause: cause.into(),
        }
    }
}

type HandlerFn =
    dyn Fn(Option<Val>, Vec<Val>) -> BoxFuture<'static, Result<Val, InvocationError>>
        + Send
        + Sync;

/// Invocation closure attached to a method descriptor. The first parameter is
/// the bound source value (the parent result for nested operations, absent
/// for root services that close over their own state).
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new(
        f: impl Fn(Option<Val>, Vec<Val>) -> BoxFuture<'static, Result<Val, InvocationError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Handler(Arc::new(f))
    }

    /// Adapts a synchronous closure.
    pub fn from_fn(
        f: impl Fn(Option<Val>, Vec<Val>) -> Result<Val, InvocationError> + Send + Sync + 'static,
    ) -> Self {
        Handler(Arc::new(move |source, args| {
            let result = f(source, args);
            Box::pin(async move { result })
        }))
    }

    pub fn invoke(
        &self,
        source: Option<Val>,
        args: Vec<Val>,
    ) -> BoxFuture<'static, Result<Val, InvocationError>> {
        (self.0)(source, args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

#[async_trait]
pub trait Executable: Send + Sync + fmt::Debug {
    /// Invokes the underlying member. Failures from user code propagate as
    /// [`InvocationError::Failed`] with the original cause attached.
    async fn execute(&self, source: Option<&Val>, args: Vec<Val>) -> Result<Val, InvocationError>;

    fn element(&self) -> &TypedElement;

    fn parameters(&self) -> &[ParameterDescriptor];

    fn return_type(&self) -> &GraphType {
        &self.element().typ
    }

    fn parameter_count(&self) -> usize {
        self.parameters().len()
    }
}

#[derive(Debug)]
pub struct MethodExecutable {
    element: TypedElement,
    params: Vec<ParameterDescriptor>,
    handler: Handler,
}

impl MethodExecutable {
    pub fn new(element: TypedElement, params: Vec<ParameterDescriptor>, handler: Handler) -> Self {
        Self {
            element,
            params,
            handler,
        }
    }
}

#[async_trait]
impl Executable for MethodExecutable {
    async fn execute(&self, source: Option<&Val>, args: Vec<Val>) -> Result<Val, InvocationError> {
        self.handler.invoke(source.cloned(), args).await
    }

    fn element(&self) -> &TypedElement {
        &self.element
    }

    fn parameters(&self) -> &[ParameterDescriptor] {
        &self.params
    }
}

/// Zero-argument accessor over a field of an object-shaped source value.
#[derive(Debug)]
pub struct FieldExecutable {
    element: TypedElement,
}

impl FieldExecutable {
    pub fn new(element: TypedElement) -> Self {
        Self { element }
    }
}

#[async_trait]
impl Executable for FieldExecutable {
    async fn execute(&self, source: Option<&Val>, _args: Vec<Val>) -> Result<Val, InvocationError> {
        match source {
            Some(source @ Val::Object(_)) => Ok(source
                .get(&self.element.name)
                .cloned()
                .unwrap_or(Val::Null)),
            _ => Err(InvocationError::NoSource(self.element.name.clone())),
        }
    }

    fn element(&self) -> &TypedElement {
        &self.element
    }

    fn parameters(&self) -> &[ParameterDescriptor] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationMap;
    use crate::type_algebra::{ClassDescriptor, GraphType, TypeArena};
    use crate::typed_element::ElementRef;

    fn element(arena: &mut TypeArena, name: &str) -> TypedElement {
        let user = arena.add_class(ClassDescriptor::new("User"));
        let string = arena.primitive("String");
        TypedElement::new(
            name,
            GraphType::class(string),
            ElementRef::new(user, 0),
            AnnotationMap::default(),
        )
    }

    #[tokio::test]
    async fn field_executable_reads_the_source_object() {
        let mut arena = TypeArena::new();
        let executable = FieldExecutable::new(element(&mut arena, "name"));

        let source: Val = serde_json::json!({ "name": "x" }).into();
        let result = executable.execute(Some(&source), vec![]).await.unwrap();
        assert_eq!(result, Val::String("x".to_string()));

        let missing = executable
            .execute(Some(&serde_json::json!({}).into()), vec![])
            .await
            .unwrap();
        assert_eq!(missing, Val::Null);

        assert!(executable.execute(None, vec![]).await.is_err());
    }

    #[tokio::test]
    async fn method_executable_delegates_to_the_handler() {
        let mut arena = TypeArena::new();
        let handler = Handler::from_fn(|_, args| Ok(args.into_iter().next().unwrap_or(Val::Null)));
        let executable = MethodExecutable::new(element(&mut arena, "echo"), vec![], handler);

        let result = executable
            .execute(None, vec![Val::String("in".to_string())])
            .await
            .unwrap();
        assert_eq!(result, Val::String("in".to_string()));
    }

    #[tokio::test]
    async fn handler_failures_carry_the_original_cause() {
        let mut arena = TypeArena::new();
        let handler =
            Handler::from_fn(|_, _| Err(InvocationError::failed("boom", "user code failure")));
        let executable = MethodExecutable::new(element(&mut arena, "boom"), vec![], handler);

        let error = executable.execute(None, vec![]).await.unwrap_err();
        assert!(matches!(error, InvocationError::Failed { .. }));
        assert!(std::error::Error::source(&error).is_some());
    }
}
