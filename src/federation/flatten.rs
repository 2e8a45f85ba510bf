//! The planner's flattening pre-pass.
//!
//! Normalizes a validated selection set so that planning sees a canonical
//! shape: under object parents every response alias appears exactly once
//! with merged sub-selections; under abstract parents every concrete member
//! is materialized as one inline fragment; no named fragment spreads remain.
//! The pass is idempotent: normalizing a normalized set reproduces it.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::{
    ast::{Field, Fragment, InlineFragment, Selection},
    parser::Spanning,
    schema::{meta::MetaType, model::SchemaType},
};

use super::planner::PlanError;

pub(crate) fn normalize<'a>(
    schema: &SchemaType,
    fragments: &HashMap<&'a str, &'a Fragment<'a>>,
    parent: &MetaType,
    selections: &[Selection<'a>],
) -> Result<Vec<Selection<'a>>, PlanError> {
    if parent.is_abstract() {
        normalize_abstract(schema, fragments, parent, selections)
    } else {
        normalize_object(schema, fragments, parent, selections)
    }
}

fn normalize_object<'a>(
    schema: &SchemaType,
    fragments: &HashMap<&'a str, &'a Fragment<'a>>,
    parent: &MetaType,
    selections: &[Selection<'a>],
) -> Result<Vec<Selection<'a>>, PlanError> {
    let mut merged: IndexMap<&'a str, Field<'a>> = IndexMap::new();
    let mut seen_fragments = HashSet::new();

    collect_object_fields(
        schema,
        fragments,
        parent,
        selections,
        &mut merged,
        &mut seen_fragments,
    )?;

    merged
        .into_values()
        .map(|mut field| {
            if let Some(children) = field.selection_set.take() {
                let inner = crate::executor::lookup_field(parent, field.name.item)
                    .and_then(|f| schema.concrete_type_by_name(f.field_type.innermost_name()));
                field.selection_set = Some(match inner {
                    Some(inner) => normalize(schema, fragments, inner, &children)?,
                    None => children,
                });
            }
            Ok(Selection::Field(Spanning::unlocated(field)))
        })
        .collect()
}

fn collect_object_fields<'a>(
    schema: &SchemaType,
    fragments: &HashMap<&'a str, &'a Fragment<'a>>,
    parent: &MetaType,
    selections: &[Selection<'a>],
    merged: &mut IndexMap<&'a str, Field<'a>>,
    seen_fragments: &mut HashSet<(&'a str, String)>,
) -> Result<(), PlanError> {
    for selection in selections {
        match selection {
            Selection::Field(field) => {
                let alias = field.item.response_name();
                match merged.get_mut(alias) {
                    Some(existing) => {
                        if existing.name.item != field.item.name.item
                            || !arguments_agree(existing, &field.item)
                        {
                            return Err(PlanError::ConflictingFields(alias.into()));
                        }
                        if let Some(children) = &field.item.selection_set {
                            existing
                                .selection_set
                                .get_or_insert_with(Vec::new)
                                .extend(children.iter().cloned());
                        }
                    }
                    None => {
                        merged.insert(alias, field.item.clone());
                    }
                }
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.item.name.item;
                if !seen_fragments.insert((name, parent.name().to_string())) {
                    return Err(PlanError::DuplicateFragment(name.into()));
                }
                if let Some(fragment) = fragments.get(name) {
                    if schema.is_named_subtype(parent.name(), fragment.type_condition.item) {
                        collect_object_fields(
                            schema,
                            fragments,
                            parent,
                            &fragment.selection_set,
                            merged,
                            seen_fragments,
                        )?;
                    }
                }
            }
            Selection::InlineFragment(inline) => {
                let applies = inline
                    .item
                    .type_condition
                    .map(|cond| schema.is_named_subtype(parent.name(), cond.item))
                    .unwrap_or(true);
                if applies {
                    collect_object_fields(
                        schema,
                        fragments,
                        parent,
                        &inline.item.selection_set,
                        merged,
                        seen_fragments,
                    )?;
                }
            }
        }
    }

    Ok(())
}

// Under an abstract parent every concrete member becomes one inline
// fragment; the runtime discriminator travels as a plain `__typename`.
fn normalize_abstract<'a>(
    schema: &SchemaType,
    fragments: &HashMap<&'a str, &'a Fragment<'a>>,
    parent: &MetaType,
    selections: &[Selection<'a>],
) -> Result<Vec<Selection<'a>>, PlanError> {
    let mut result = vec![Selection::Field(Spanning::unlocated(Field {
        alias: None,
        name: Spanning::unlocated("__typename"),
        arguments: None,
        directives: None,
        selection_set: None,
    }))];

    for member in schema.possible_types(parent) {
        let member_selections = normalize_object(schema, fragments, member, selections)?;

        let has_content = member_selections
            .iter()
            .any(|s| !matches!(s, Selection::Field(f) if f.item.name.item == "__typename"));
        if !has_content {
            continue;
        }

        result.push(Selection::InlineFragment(Spanning::unlocated(
            InlineFragment {
                type_condition: Some(Spanning::unlocated(leak_member_name(member.name()))),
                directives: None,
                selection_set: member_selections,
            },
        )));
    }

    Ok(result)
}

// Synthesized type conditions must outlive the query source they sit next
// to. Member names are interned once per process; the table is bounded by
// the schema's type count.
fn leak_member_name(name: &arcstr::ArcStr) -> &'static str {
    use std::sync::{Mutex, OnceLock};

    static INTERNED: OnceLock<Mutex<HashMap<String, &'static str>>> = OnceLock::new();
    let mut interned = INTERNED
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap();

    interned
        .entry(name.to_string())
        .or_insert_with(|| Box::leak(name.to_string().into_boxed_str()))
}

fn arguments_agree(a: &Field<'_>, b: &Field<'_>) -> bool {
    let empty = vec![];
    let args_a = a.arguments.as_ref().map(|a| &a.item.items).unwrap_or(&empty);
    let args_b = b.arguments.as_ref().map(|a| &a.item.items).unwrap_or(&empty);

    args_a.len() == args_b.len()
        && args_a.iter().all(|(name_a, value_a)| {
            args_b.iter().any(|(name_b, value_b)| {
                name_a.item == name_b.item && value_a.item.unlocated_eq(&value_b.item)
            })
        })
}
