use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::{
    ast::{Definition, Document, Field, Fragment, OperationType, Selection, Type},
    executor::lookup_field,
    parser::{SourcePosition, Spanning},
    schema::meta::MetaType,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "OverlappingFieldsCanBeMerged";

pub fn factory<'a>() -> OverlappingFieldsCanBeMerged<'a> {
    OverlappingFieldsCanBeMerged {
        reported: HashSet::new(),
    }
}

/// Runs after the fragment graph is known to be acyclic; spreads are
/// expanded freely while collecting fields.
pub struct OverlappingFieldsCanBeMerged<'a> {
    reported: HashSet<(Vec<SourcePosition>, &'a str)>,
}

#[derive(Clone)]
struct CollectedField<'a> {
    field: &'a Spanning<Field<'a>>,
    parent_type: Option<&'a MetaType>,
}

type FieldGroups<'a> = IndexMap<&'a str, Vec<CollectedField<'a>>>;

impl<'a> Visitor<'a> for OverlappingFieldsCanBeMerged<'a> {
    fn exit_document(&mut self, ctx: &mut ValidatorContext<'a>, doc: &'a Document<'a>) {
        let mut fragments = HashMap::new();
        for def in doc {
            if let Definition::Fragment(f) = def {
                fragments.insert(f.item.name.item, &f.item);
            }
        }

        let mut checker = Checker {
            ctx,
            fragments,
            reported: &mut self.reported,
        };

        for def in doc {
            match def {
                Definition::Operation(op) => {
                    let root = match op.item.operation_type {
                        OperationType::Query => Some(checker.ctx.schema.query_type()),
                        OperationType::Mutation => checker.ctx.schema.mutation_type(),
                        OperationType::Subscription => checker.ctx.schema.subscription_type(),
                    };
                    checker.check_selections(
                        op.item.selection_set.iter().map(|s| (s, root)),
                    );
                }
                Definition::Fragment(f) => {
                    let cond = checker
                        .ctx
                        .schema
                        .concrete_type_by_name(f.item.type_condition.item);
                    checker.check_selections(
                        f.item.selection_set.iter().map(|s| (s, cond)),
                    );
                }
            }
        }
    }
}

struct Checker<'c, 'a> {
    ctx: &'c mut ValidatorContext<'a>,
    fragments: HashMap<&'a str, &'a Fragment<'a>>,
    reported: &'c mut HashSet<(Vec<SourcePosition>, &'a str)>,
}

impl<'a> Checker<'_, 'a> {
    /// Collects the provided selections into response-name groups and checks
    /// every group pairwise, then recurses into the merged sub-selections.
    fn check_selections(
        &mut self,
        selections: impl Iterator<Item = (&'a Selection<'a>, Option<&'a MetaType>)>,
    ) {
        let mut groups = FieldGroups::new();
        let mut visited_fragments = HashSet::new();
        for (selection, parent) in selections {
            self.collect_fields(
                std::slice::from_ref(selection),
                parent,
                &mut groups,
                &mut visited_fragments,
            );
        }

        for (response_name, group) in &groups {
            for i in 0..group.len() {
                for j in (i + 1)..group.len() {
                    self.check_pair(response_name, &group[i], &group[j]);
                }
            }
        }

        // Merged sub-selections must themselves merge.
        for group in groups.values() {
            let nested = group
                .iter()
                .flat_map(|c| {
                    let inner = self.inner_type_of(c);
                    c.field
                        .item
                        .selection_set
                        .as_deref()
                        .unwrap_or_default()
                        .iter()
                        .map(move |s| (s, inner))
                })
                .collect::<Vec<_>>();

            if !nested.is_empty() {
                self.check_selections(nested.into_iter());
            }
        }
    }

    fn inner_type_of(&self, collected: &CollectedField<'a>) -> Option<&'a MetaType> {
        collected
            .parent_type
            .and_then(|t| lookup_field(t, collected.field.item.name.item))
            .and_then(|f| {
                self.ctx
                    .schema
                    .concrete_type_by_name(f.field_type.innermost_name())
            })
    }

    fn collect_fields(
        &self,
        selections: &'a [Selection<'a>],
        parent_type: Option<&'a MetaType>,
        groups: &mut FieldGroups<'a>,
        visited_fragments: &mut HashSet<&'a str>,
    ) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    groups
                        .entry(field.item.response_name())
                        .or_default()
                        .push(CollectedField { field, parent_type });
                }
                Selection::InlineFragment(inline) => {
                    let inner_parent = inline
                        .item
                        .type_condition
                        .as_ref()
                        .and_then(|c| self.ctx.schema.concrete_type_by_name(c.item))
                        .or(parent_type);
                    self.collect_fields(
                        &inline.item.selection_set,
                        inner_parent,
                        groups,
                        visited_fragments,
                    );
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.item.name.item;
                    if !visited_fragments.insert(name) {
                        continue;
                    }
                    if let Some(fragment) = self.fragments.get(name) {
                        let inner_parent = self
                            .ctx
                            .schema
                            .concrete_type_by_name(fragment.type_condition.item)
                            .or(parent_type);
                        self.collect_fields(
                            &fragment.selection_set,
                            inner_parent,
                            groups,
                            visited_fragments,
                        );
                    }
                }
            }
        }
    }

    fn check_pair(
        &mut self,
        response_name: &'a str,
        a: &CollectedField<'a>,
        b: &CollectedField<'a>,
    ) {
        let name_a = a.field.item.name.item;
        let name_b = b.field.item.name.item;

        let reason = if name_a != name_b {
            Some(format!("\"{name_a}\" and \"{name_b}\" are different fields"))
        } else if !arguments_equal(a.field, b.field) {
            Some("they have differing arguments".into())
        } else {
            let type_a = self.declared_type(a);
            let type_b = self.declared_type(b);
            match (type_a, type_b) {
                (Some(ta), Some(tb)) if !self.types_compatible(ta, tb) => Some(format!(
                    "they return conflicting types \"{ta}\" and \"{tb}\"",
                )),
                _ => None,
            }
        };

        if let Some(reason) = reason {
            let positions = vec![a.field.span.start, b.field.span.start];
            if self.reported.insert((positions.clone(), response_name)) {
                self.ctx
                    .report_error(RULE, &error_message(response_name, &reason), &positions);
            }
        }
    }

    fn declared_type(&self, collected: &CollectedField<'a>) -> Option<&'a Type<'static>> {
        collected
            .parent_type
            .and_then(|t| lookup_field(t, collected.field.item.name.item))
            .map(|f| &f.field_type)
    }

    // Unwrap list and non-null layers symmetrically; leaves must be equal,
    // composites merge through their sub-selections.
    fn types_compatible(&self, a: &Type<'_>, b: &Type<'_>) -> bool {
        match (a, b) {
            (Type::NonNullNamed(na), Type::NonNullNamed(nb))
            | (Type::Named(na), Type::Named(nb)) => self.names_compatible(na, nb),
            (Type::NonNullList(la), Type::NonNullList(lb))
            | (Type::List(la), Type::List(lb)) => self.types_compatible(la, lb),
            _ => false,
        }
    }

    fn names_compatible(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match (
            self.ctx.schema.concrete_type_by_name(a),
            self.ctx.schema.concrete_type_by_name(b),
        ) {
            (Some(ta), Some(tb)) => !ta.is_leaf() && !tb.is_leaf(),
            _ => false,
        }
    }
}

fn arguments_equal(a: &Spanning<Field<'_>>, b: &Spanning<Field<'_>>) -> bool {
    let empty = vec![];
    let args_a = a.item.arguments.as_ref().map(|a| &a.item.items).unwrap_or(&empty);
    let args_b = b.item.arguments.as_ref().map(|a| &a.item.items).unwrap_or(&empty);

    if args_a.len() != args_b.len() {
        return false;
    }

    args_a.iter().all(|(name_a, value_a)| {
        args_b.iter().any(|(name_b, value_b)| {
            name_a.item == name_b.item && value_a.item.unlocated_eq(&value_b.item)
        })
    })
}

fn error_message(response_name: &str, reason: &str) -> String {
    format!("Fields \"{response_name}\" conflict because {reason}")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn unique_fields_pass() {
        expect_passes_rule(factory, "{ dog { name nickname } }");
    }

    #[test]
    fn identical_fields_and_args_merge() {
        expect_passes_rule(factory, "{ dog { name name } }");
        expect_passes_rule(
            factory,
            "{ dog { doesKnowCommand(dogCommand: SIT) doesKnowCommand(dogCommand: SIT) } }",
        );
    }

    #[test]
    fn identical_variable_arguments_merge() {
        expect_passes_rule(
            factory,
            "query Q($v: DogCommand) { dog { doesKnowCommand(dogCommand: $v) doesKnowCommand(dogCommand: $v) } }",
        );
    }

    #[test]
    fn aliased_different_fields_pass() {
        expect_passes_rule(factory, "{ dog { otherName: name nickname } }");
    }

    #[test]
    fn same_alias_different_fields_conflict() {
        expect_fails_rule(
            factory,
            "{ dog { fido: name fido: nickname } }",
            &[RuleError::new(
                RULE,
                &error_message("fido", "\"name\" and \"nickname\" are different fields"),
                &[SourcePosition::new(8, 0, 8), SourcePosition::new(19, 0, 19)],
            )],
        );
    }

    #[test]
    fn different_arguments_conflict() {
        expect_fails_rule(
            factory,
            "{ dog { doesKnowCommand(dogCommand: SIT) doesKnowCommand(dogCommand: HEEL) } }",
            &[RuleError::new(
                RULE,
                &error_message("doesKnowCommand", "they have differing arguments"),
                &[SourcePosition::new(8, 0, 8), SourcePosition::new(41, 0, 41)],
            )],
        );
    }

    #[test]
    fn conflict_reachable_through_fragments() {
        expect_fails_rule(
            factory,
            "{ dog { ...NameFrag ...NickFrag } } fragment NameFrag on Dog { fido: name } fragment NickFrag on Dog { fido: nickname }",
            &[RuleError::new(
                RULE,
                &error_message("fido", "\"name\" and \"nickname\" are different fields"),
                &[SourcePosition::new(63, 0, 63), SourcePosition::new(103, 0, 103)],
            )],
        );
    }

    #[test]
    fn deep_conflict() {
        expect_fails_rule(
            factory,
            "{ dog { name: nickname } dog { name } }",
            &[RuleError::new(
                RULE,
                &error_message("name", "\"nickname\" and \"name\" are different fields"),
                &[SourcePosition::new(8, 0, 8), SourcePosition::new(31, 0, 31)],
            )],
        );
    }
}
