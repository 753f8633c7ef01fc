// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use heck::ToLowerCamelCase;

use ingraph_core_model::annotation::names;
use ingraph_core_model::type_algebra::MemberDescriptor;

/// Derives the client-visible operation name for a discovered member.
///
/// The `kind` participates in structural strategy equality: two strategy
/// instances with the same generator and argument-builder kinds are
/// considered the same strategy.
pub trait OperationNameGenerator: Send + Sync {
    fn kind(&self) -> &'static str;

    fn operation_name(&self, member: &MemberDescriptor) -> String;
}

/// Explicit name-annotation override, falling back to the member's own name.
#[derive(Debug, Default)]
pub struct MemberNameGenerator;

impl OperationNameGenerator for MemberNameGenerator {
    fn kind(&self) -> &'static str {
        "member"
    }

    fn operation_name(&self, member: &MemberDescriptor) -> String {
        member
            .annotations
            .string_value(names::NAME)
            .map(str::to_string)
            .unwrap_or_else(|| member.name.clone())
    }
}

/// Bean convention: `getUser`/`get_user`/`isActive` expose as `user`/`active`;
/// setters keep the property name on the mutation side.
#[derive(Debug, Default)]
pub struct BeanNameGenerator;

impl BeanNameGenerator {
    pub fn property_name(member_name: &str) -> Option<String> {
        let stripped = ["get_", "set_", "is_", "get", "set", "is"]
            .iter()
            .find_map(|prefix| member_name.strip_prefix(prefix))?;
        // "getter" and the like are not bean accessors
        let first = stripped.chars().next()?;
        if first.is_lowercase() && !member_name.contains('_') {
            return None;
        }
        Some(stripped.to_lower_camel_case())
    }
}

impl OperationNameGenerator for BeanNameGenerator {
    fn kind(&self) -> &'static str {
        "bean"
    }

    fn operation_name(&self, member: &MemberDescriptor) -> String {
        member
            .annotations
            .string_value(names::NAME)
            .map(str::to_string)
            .or_else(|| BeanNameGenerator::property_name(&member.name))
            .unwrap_or_else(|| member.name.clone())
    }
}
