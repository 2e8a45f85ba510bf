//! Selection-set flattening.
//!
//! Before an object's selections resolve, fragment spreads and inline
//! fragments matching the runtime type are inlined, selections sharing a
//! response alias collapse into one merged selection, and directive
//! evaluation (`@skip`, `@include`, and user filter directives) drops vetoed
//! selections. Flattening a flattened set again yields the same set.
//!
//! The input is assumed validated: fragment cycles and alias collisions with
//! differing arguments are rejected before execution.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{
    ast::{Arguments as AstArguments, Directive, Fragment, Selection},
    executor::{FieldError, FieldResult, Variables, arguments},
    parser::{SourcePosition, Spanning},
    schema::model::SchemaType,
};

/// One merged field of a flattened selection set.
#[derive(Clone, Debug)]
pub(crate) struct FlatField<'a> {
    pub alias: &'a str,
    pub name: &'a str,
    pub position: SourcePosition,
    /// Arguments of the first occurrence; merged occurrences agree on them
    /// by validation.
    pub arguments: Option<&'a Spanning<AstArguments<'a>>>,
    /// Concatenated sub-selections of every merged occurrence.
    pub selections: Vec<&'a Selection<'a>>,
}

pub(crate) fn flatten_selection_set<'a>(
    schema: &SchemaType,
    fragments: &HashMap<&'a str, &'a Fragment<'a>>,
    variables: &Variables,
    concrete_type: &str,
    selections: &[&'a Selection<'a>],
) -> FieldResult<Vec<FlatField<'a>>> {
    let mut out = IndexMap::new();
    collect(schema, fragments, variables, concrete_type, selections, &mut out)?;
    Ok(out.into_values().collect())
}

fn collect<'a>(
    schema: &SchemaType,
    fragments: &HashMap<&'a str, &'a Fragment<'a>>,
    variables: &Variables,
    concrete_type: &str,
    selections: &[&'a Selection<'a>],
    out: &mut IndexMap<&'a str, FlatField<'a>>,
) -> FieldResult<()> {
    for &selection in selections {
        match selection {
            Selection::Field(field) => {
                if is_excluded(schema, &field.item.directives, variables)? {
                    continue;
                }

                let alias = field.item.response_name();
                let children = field
                    .item
                    .selection_set
                    .as_ref()
                    .map(|s| s.iter().collect::<Vec<_>>())
                    .unwrap_or_default();

                match out.get_mut(alias) {
                    Some(existing) => {
                        existing.selections.extend(children);
                    }
                    None => {
                        out.insert(
                            alias,
                            FlatField {
                                alias,
                                name: field.item.name.item,
                                position: field.span.start,
                                arguments: field.item.arguments.as_ref(),
                                selections: children,
                            },
                        );
                    }
                }
            }
            Selection::FragmentSpread(spread) => {
                if is_excluded(schema, &spread.item.directives, variables)? {
                    continue;
                }

                let fragment = fragments.get(spread.item.name.item).ok_or_else(|| {
                    FieldError::from(format!(
                        "unknown fragment {:?}",
                        spread.item.name.item,
                    ))
                })?;

                if type_condition_applies(schema, concrete_type, fragment.type_condition.item) {
                    let children = fragment.selection_set.iter().collect::<Vec<_>>();
                    collect(schema, fragments, variables, concrete_type, &children, out)?;
                }
            }
            Selection::InlineFragment(inline) => {
                if is_excluded(schema, &inline.item.directives, variables)? {
                    continue;
                }

                let applies = inline
                    .item
                    .type_condition
                    .map(|cond| type_condition_applies(schema, concrete_type, cond.item))
                    .unwrap_or(true);

                if applies {
                    let children = inline.item.selection_set.iter().collect::<Vec<_>>();
                    collect(schema, fragments, variables, concrete_type, &children, out)?;
                }
            }
        }
    }

    Ok(())
}

/// A type condition matches the runtime object when it names the concrete
/// type itself, or an abstract type the concrete type satisfies.
fn type_condition_applies(schema: &SchemaType, concrete_type: &str, condition: &str) -> bool {
    schema.is_named_subtype(concrete_type, condition)
}

/// Evaluates the directives of a selection, deciding whether it is dropped.
pub(crate) fn is_excluded(
    schema: &SchemaType,
    directives: &Option<Vec<Spanning<Directive<'_>>>>,
    variables: &Variables,
) -> FieldResult<bool> {
    let Some(directives) = directives else {
        return Ok(false);
    };

    for directive in directives {
        let name = directive.item.name.item;
        match name {
            "skip" => {
                if directive_if_value(directive, variables)? {
                    return Ok(true);
                }
            }
            "include" => {
                if !directive_if_value(directive, variables)? {
                    return Ok(true);
                }
            }
            _ => {
                let Some(declared) = schema.directive_by_name(name) else {
                    continue;
                };
                if let Some(filter) = &declared.filter_fn {
                    let args = arguments::build_arguments(
                        schema,
                        Some(&declared.arguments),
                        directive.item.arguments.as_ref(),
                        variables,
                    )?;
                    if !filter(&args) {
                        return Ok(true);
                    }
                }
            }
        }
    }

    Ok(false)
}

fn directive_if_value(
    directive: &Spanning<Directive<'_>>,
    variables: &Variables,
) -> FieldResult<bool> {
    directive
        .item
        .arguments
        .as_ref()
        .and_then(|args| args.item.get("if"))
        .and_then(|v| v.item.clone().into_const(variables))
        .and_then(|v| v.as_boolean_value())
        .ok_or_else(|| {
            FieldError::from(format!(
                "@{} requires a Boolean \"if\" argument",
                directive.item.name.item,
            ))
        })
}
