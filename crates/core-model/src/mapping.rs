// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Value mapping: the narrow interface through which default-value literals
//! are materialized and complex input objects are (de)serialized. The
//! engine only needs these three operations; richer mappers plug in from
//! the outside.

use thiserror::Error;

use crate::type_algebra::{GraphType, TypeArena};
use crate::value::Val;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Could not map `{value}` as `{typ}`")]
    Unmappable { value: String, typ: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub trait ValueMapper: Send + Sync {
    /// Materializes a client-supplied value against a declared type.
    fn from_input(
        &self,
        raw: &Val,
        typ: &GraphType,
        arena: &TypeArena,
    ) -> Result<Val, MappingError>;

    /// Parses a literal (e.g. an annotation-supplied default) against a
    /// declared type.
    fn from_string(
        &self,
        literal: &str,
        typ: &GraphType,
        arena: &TypeArena,
    ) -> Result<Val, MappingError>;

    fn to_string(&self, value: &Val) -> Result<String, MappingError>;
}

/// serde_json-backed mapper: inputs pass through unchanged, literals parse
/// as JSON with a bare-string fallback.
#[derive(Debug, Default)]
pub struct JsonValueMapper;

impl ValueMapper for JsonValueMapper {
    fn from_input(
        &self,
        raw: &Val,
        _typ: &GraphType,
        _arena: &TypeArena,
    ) -> Result<Val, MappingError> {
        Ok(raw.clone())
    }

    fn from_string(
        &self,
        literal: &str,
        _typ: &GraphType,
        _arena: &TypeArena,
    ) -> Result<Val, MappingError> {
        match serde_json::from_str::<serde_json::Value>(literal) {
            Ok(value) => Ok(value.into()),
            // an unquoted literal is a plain string
            Err(_) => Ok(Val::String(literal.to_string())),
        }
    }

    fn to_string(&self, value: &Val) -> Result<String, MappingError> {
        let json: serde_json::Value = value.clone().try_into()?;
        Ok(json.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn literals_parse_as_json_with_string_fallback() {
        let arena = TypeArena::new();
        let typ = arena.any_type();
        let mapper = JsonValueMapper;

        assert_eq!(
            mapper.from_string("5", &typ, &arena).unwrap(),
            Val::Number(crate::value::ValNumber::I64(5))
        );
        assert_eq!(
            mapper.from_string("null", &typ, &arena).unwrap(),
            Val::Null
        );
        assert_eq!(
            mapper.from_string("plain text", &typ, &arena).unwrap(),
            Val::String("plain text".to_string())
        );
    }

    #[multiplatform_test]
    fn to_string_round_trips_through_json() {
        let mapper = JsonValueMapper;
        let val: Val = serde_json::json!({ "id": 7 }).into();

        assert_eq!(mapper.to_string(&val).unwrap(), r#"{"id":7}"#);
    }
}
