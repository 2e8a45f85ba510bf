use std::collections::{HashMap, HashSet};

use crate::{
    ast::{Document, Fragment, FragmentSpread, Operation, Type, VariableDefinition},
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

use super::Scope;

pub const RULE: &str = "VariablesInAllowedPosition";

pub fn factory<'a>() -> VariablesInAllowedPosition<'a> {
    VariablesInAllowedPosition {
        spreads: HashMap::new(),
        variable_usages: HashMap::new(),
        variable_defs: HashMap::new(),
        current_scope: None,
    }
}

pub struct VariablesInAllowedPosition<'a> {
    spreads: HashMap<Scope<'a>, HashSet<&'a str>>,
    variable_usages: HashMap<Scope<'a>, Vec<(Spanning<&'a str>, Type<'a>)>>,
    variable_defs: HashMap<Scope<'a>, Vec<&'a (Spanning<&'a str>, VariableDefinition<'a>)>>,
    current_scope: Option<Scope<'a>>,
}

impl<'a> VariablesInAllowedPosition<'a> {
    fn collect_incorrect_usages(
        &self,
        from: &Scope<'a>,
        var_defs: &[&'a (Spanning<&'a str>, VariableDefinition<'a>)],
        ctx: &mut ValidatorContext<'a>,
        visited: &mut HashSet<Scope<'a>>,
    ) {
        if visited.contains(from) {
            return;
        }

        visited.insert(from.clone());

        if let Some(usages) = self.variable_usages.get(from) {
            for (var_name, expected_type) in usages {
                let Some((var_def_name, var_def)) = var_defs
                    .iter()
                    .find(|(n, _)| n.item == var_name.item)
                    .map(|(n, d)| (n, d))
                else {
                    continue;
                };

                // A `null`able variable with a declared default may flow
                // into a non-`null` position.
                let effective_type = if var_def.default_value.is_some()
                    && !var_def.var_type.item.is_non_null()
                {
                    match var_def.var_type.item.clone() {
                        Type::Named(n) => Type::NonNullNamed(n),
                        Type::List(l) => Type::NonNullList(l),
                        t => t,
                    }
                } else {
                    var_def.var_type.item.clone()
                };

                if !ctx.schema.is_subtype(&effective_type, expected_type) {
                    ctx.report_error(
                        RULE,
                        &error_message(
                            var_name.item,
                            &var_def.var_type.item.to_string(),
                            &expected_type.to_string(),
                        ),
                        &[var_def_name.span.start, var_name.span.start],
                    );
                }
            }
        }

        if let Some(spreads) = self.spreads.get(from) {
            for spread in spreads {
                self.collect_incorrect_usages(
                    &Scope::Fragment(*spread),
                    var_defs,
                    ctx,
                    visited,
                );
            }
        }
    }
}

impl<'a> Visitor<'a> for VariablesInAllowedPosition<'a> {
    fn exit_document(&mut self, ctx: &mut ValidatorContext<'a>, _: &'a Document<'a>) {
        for (op_scope, var_defs) in &self.variable_defs {
            let mut visited = HashSet::new();
            self.collect_incorrect_usages(op_scope, var_defs, ctx, &mut visited);
        }
    }

    fn enter_fragment_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        fragment: &'a Spanning<Fragment<'a>>,
    ) {
        self.current_scope = Some(Scope::Fragment(fragment.item.name.item));
    }

    fn enter_operation_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        op: &'a Spanning<Operation<'a>>,
    ) {
        self.current_scope = Some(Scope::Operation(op.item.name.map(|s| s.item)));
    }

    fn enter_fragment_spread(
        &mut self,
        _: &mut ValidatorContext<'a>,
        spread: &'a Spanning<FragmentSpread<'a>>,
    ) {
        if let Some(scope) = &self.current_scope {
            self.spreads
                .entry(scope.clone())
                .or_default()
                .insert(spread.item.name.item);
        }
    }

    fn enter_variable_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        def: &'a (Spanning<&'a str>, VariableDefinition<'a>),
    ) {
        if let Some(scope) = &self.current_scope {
            self.variable_defs
                .entry(scope.clone())
                .or_default()
                .push(def);
        }
    }

    fn enter_variable_value(&mut self, ctx: &mut ValidatorContext<'a>, var_name: Spanning<&'a str>) {
        if let (Some(scope), Some(input_type)) =
            (&self.current_scope, ctx.current_input_type_literal())
        {
            self.variable_usages
                .entry(scope.clone())
                .or_default()
                .push((var_name, input_type.clone()));
        }
    }
}

fn error_message(var_name: &str, type_name: &str, expected_type_name: &str) -> String {
    format!(
        "Variable \"${var_name}\" of type \"{type_name}\" used in position expecting type \"{expected_type_name}\"",
    )
}
