// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Least-common-supertype and union computation over [`GraphType`]s.
//!
//! The unification walks raw-class hierarchies to find candidate common
//! ancestors (universal roots excluded unless they are the only commonality),
//! unifies type arguments position by position, unifies array components, and
//! merges annotation sets at every level. A visited set of type-pair keys
//! guards against self-referential generic structures: a revisited pair
//! resolves to the raw candidate instead of recursing forever.

use std::collections::{HashSet, VecDeque};

use crate::annotation::AnnotationMap;

use super::substitution::substitute_lenient;
use super::{GraphType, TypeAlgebraError, TypeArena, TypeId, TypeShape, template_raw};

pub fn common_supertype(
    arena: &TypeArena,
    types: &[GraphType],
) -> Result<GraphType, TypeAlgebraError> {
    common_supertype_with_fallback(arena, types, None)
}

/// Folds `types` into their most-specific common supertype.
///
/// When the only commonality is a universal root (and the inputs are not
/// themselves that root), the types are considered incompatible: the
/// `fallback` is returned if supplied, otherwise an error.
pub fn common_supertype_with_fallback(
    arena: &TypeArena,
    types: &[GraphType],
    fallback: Option<&GraphType>,
) -> Result<GraphType, TypeAlgebraError> {
    let mut iter = types.iter();
    let first = iter
        .next()
        .ok_or_else(|| TypeAlgebraError::NoCommonSupertype {
            types: String::new(),
        })?;

    let mut seen = HashSet::new();
    let mut acc = first.clone();
    for typ in iter {
        acc = unify(arena, &acc, typ, &mut seen);
    }

    let universal = acc
        .raw()
        .map(|id| arena[id].universal)
        .unwrap_or(false);
    let degenerate =
        universal && types.iter().any(|typ| typ.key(arena) != acc.key(arena));

    if degenerate {
        match fallback {
            Some(fallback) => Ok(fallback.clone()),
            None => Err(TypeAlgebraError::NoCommonSupertype {
                types: types
                    .iter()
                    .map(|typ| typ.key(arena))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    } else {
        Ok(acc)
    }
}

/// Order-preserving union, de-duplicated by underlying raw type.
pub fn union_of(arena: &TypeArena, types: &[GraphType]) -> GraphType {
    let mut members: Vec<GraphType> = vec![];
    let mut keys: Vec<String> = vec![];
    let mut annotations = AnnotationMap::default();

    let push = |typ: &GraphType,
                members: &mut Vec<GraphType>,
                keys: &mut Vec<String>,
                annotations: &mut AnnotationMap| {
        annotations.merge(&typ.annotations);
        let key = typ
            .raw()
            .map(|id| arena[id].name.clone())
            .unwrap_or_else(|| typ.key(arena));
        if !keys.contains(&key) {
            keys.push(key);
            members.push(typ.clone());
        }
    };

    for typ in types {
        match &typ.shape {
            TypeShape::Union(nested) => {
                for member in nested {
                    push(member, &mut members, &mut keys, &mut annotations);
                }
            }
            _ => push(typ, &mut members, &mut keys, &mut annotations),
        }
    }

    if members.len() == 1 {
        let mut only = members.into_iter().next().unwrap();
        only.annotations.merge(&annotations);
        only
    } else {
        GraphType {
            shape: TypeShape::Union(members),
            annotations,
        }
    }
}

/// Bounds-erased view of a type: wildcard-like bounds are replaced by their
/// first upper bound (the universal root when unbounded), recursively.
pub fn stripped(arena: &TypeArena, typ: &GraphType) -> GraphType {
    let annotations = typ.annotations.clone();
    match &typ.shape {
        TypeShape::Bounded { uppers } => {
            let mut upper = uppers
                .first()
                .map(|upper| stripped(arena, upper))
                .unwrap_or_else(|| arena.any_type());
            upper.annotations.merge(&annotations);
            upper
        }
        TypeShape::Class(_) => typ.clone(),
        TypeShape::Parameterized { raw, args } => GraphType {
            shape: TypeShape::Parameterized {
                raw: *raw,
                args: args.iter().map(|arg| stripped(arena, arg)).collect(),
            },
            annotations,
        },
        TypeShape::Array(component) => GraphType {
            shape: TypeShape::Array(Box::new(stripped(arena, component))),
            annotations,
        },
        TypeShape::Union(members) => GraphType {
            shape: TypeShape::Union(
                members.iter().map(|member| stripped(arena, member)).collect(),
            ),
            annotations,
        },
    }
}

/// All (raw class, type arguments) instantiations reachable from `typ`,
/// breadth first, the type itself first. The universal root is an implicit
/// ancestor of every class-shaped type.
fn instantiations(arena: &TypeArena, typ: &GraphType) -> Vec<(TypeId, Vec<GraphType>)> {
    let Some(start) = decompose(typ) else {
        return vec![];
    };

    let mut out: Vec<(TypeId, Vec<GraphType>)> = vec![];
    let mut queue = VecDeque::from([start]);

    while let Some((id, args)) = queue.pop_front() {
        if out.iter().any(|(seen, _)| *seen == id) {
            continue;
        }
        for template in &arena[id].supertypes {
            if let Some(sup_raw) = template_raw(template) {
                let instantiated = substitute_lenient(template, &args, arena);
                let sup_args = match instantiated.shape {
                    TypeShape::Parameterized { args, .. } => args,
                    _ => vec![],
                };
                queue.push_back((sup_raw, sup_args));
            }
        }
        out.push((id, args));
    }

    if !out.iter().any(|(id, _)| *id == arena.any()) {
        out.push((arena.any(), vec![]));
    }
    out
}

fn decompose(typ: &GraphType) -> Option<(TypeId, Vec<GraphType>)> {
    match &typ.shape {
        TypeShape::Class(id) => Some((*id, vec![])),
        TypeShape::Parameterized { raw, args } => Some((*raw, args.clone())),
        TypeShape::Bounded { uppers } => uppers.first().and_then(decompose),
        TypeShape::Array(_) | TypeShape::Union(_) => None,
    }
}

fn unify(
    arena: &TypeArena,
    a: &GraphType,
    b: &GraphType,
    seen: &mut HashSet<(String, String)>,
) -> GraphType {
    let key_a = a.key(arena);
    let key_b = b.key(arena);

    if key_a == key_b {
        return merge_same(a, b);
    }

    match (&a.shape, &b.shape) {
        (TypeShape::Array(left), TypeShape::Array(right)) => {
            let mut unified = GraphType::array(unify(arena, left, right, seen));
            unified.annotations = a.annotations.clone().merged(&b.annotations);
            unified
        }
        (TypeShape::Union(_), _) | (_, TypeShape::Union(_)) => {
            union_of(arena, &[a.clone(), b.clone()])
        }
        _ => {
            let (Some(_), Some(_)) = (decompose(a), decompose(b)) else {
                // array vs class and the like: only the universal root is common
                let mut any = arena.any_type();
                any.annotations = a.annotations.clone().merged(&b.annotations);
                return any;
            };

            let insts_a = instantiations(arena, a);
            let insts_b = instantiations(arena, b);

            let candidates: Vec<TypeId> = insts_a
                .iter()
                .map(|(id, _)| *id)
                .filter(|id| insts_b.iter().any(|(other, _)| other == id))
                .collect();

            let non_universal: Vec<TypeId> = candidates
                .iter()
                .copied()
                .filter(|id| !arena[*id].universal)
                .collect();
            let pool = if non_universal.is_empty() {
                candidates
            } else {
                non_universal
            };

            // most specific: drop candidates that are strict supertypes of another
            let minimal: Vec<TypeId> = pool
                .iter()
                .copied()
                .filter(|candidate| {
                    !pool
                        .iter()
                        .any(|other| other != candidate && arena.is_subtype(*other, *candidate))
                })
                .collect();
            let chosen = *minimal.first().unwrap_or(&arena.any());

            let annotations = a.annotations.clone().merged(&b.annotations);

            let erased = !seen.insert((key_a, key_b));
            let args_a = args_of(&insts_a, chosen);
            let args_b = args_of(&insts_b, chosen);

            let shape = if erased || args_a.is_empty() || args_a.len() != args_b.len() {
                TypeShape::Class(chosen)
            } else {
                TypeShape::Parameterized {
                    raw: chosen,
                    args: args_a
                        .iter()
                        .zip(args_b.iter())
                        .map(|(left, right)| unify(arena, left, right, seen))
                        .collect(),
                }
            };

            GraphType { shape, annotations }
        }
    }
}

fn args_of(insts: &[(TypeId, Vec<GraphType>)], id: TypeId) -> Vec<GraphType> {
    insts
        .iter()
        .find(|(candidate, _)| *candidate == id)
        .map(|(_, args)| args.clone())
        .unwrap_or_default()
}

/// Merge of two structurally identical types: annotation union at every level.
fn merge_same(a: &GraphType, b: &GraphType) -> GraphType {
    let annotations = a.annotations.clone().merged(&b.annotations);
    let shape = match (&a.shape, &b.shape) {
        (
            TypeShape::Parameterized { raw, args: left },
            TypeShape::Parameterized { args: right, .. },
        ) if left.len() == right.len() => TypeShape::Parameterized {
            raw: *raw,
            args: left
                .iter()
                .zip(right.iter())
                .map(|(l, r)| merge_same(l, r))
                .collect(),
        },
        (TypeShape::Array(left), TypeShape::Array(right)) => {
            TypeShape::Array(Box::new(merge_same(left, right)))
        }
        (TypeShape::Union(left), TypeShape::Union(right)) if left.len() == right.len() => {
            TypeShape::Union(
                left.iter()
                    .zip(right.iter())
                    .map(|(l, r)| merge_same(l, r))
                    .collect(),
            )
        }
        (TypeShape::Bounded { uppers: left }, TypeShape::Bounded { uppers: right })
            if left.len() == right.len() =>
        {
            TypeShape::Bounded {
                uppers: left
                    .iter()
                    .zip(right.iter())
                    .map(|(l, r)| merge_same(l, r))
                    .collect(),
            }
        }
        _ => a.shape.clone(),
    };
    GraphType { shape, annotations }
}
