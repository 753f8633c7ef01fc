// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Request phase: fingerprint dispatch, argument injection, invocation, and
//! output conversion over the immutable model built by the builder crate.

pub mod converter;
pub mod environment;
pub mod error;
pub mod executor;
pub mod injector;
pub mod request_context;
pub mod system_resolver;

pub use error::{InjectionError, ResolutionError};
pub use request_context::RequestContext;
pub use system_resolver::SystemResolver;
