use std::collections::{HashMap, HashSet};

use crate::{
    ast::{Document, Fragment, FragmentSpread, Operation, VariableDefinition},
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

use super::Scope;

pub const RULE: &str = "NoUnusedVariables";

pub fn factory<'a>() -> NoUnusedVariables<'a> {
    NoUnusedVariables {
        defined_variables: HashMap::new(),
        used_variables: HashMap::new(),
        current_scope: None,
        spreads: HashMap::new(),
    }
}

pub struct NoUnusedVariables<'a> {
    defined_variables: HashMap<Option<&'a str>, HashSet<&'a Spanning<&'a str>>>,
    used_variables: HashMap<Scope<'a>, Vec<&'a str>>,
    current_scope: Option<Scope<'a>>,
    spreads: HashMap<Scope<'a>, Vec<&'a str>>,
}

impl<'a> NoUnusedVariables<'a> {
    fn find_used_vars(
        &self,
        from: &Scope<'a>,
        used: &mut HashSet<&'a str>,
        visited: &mut HashSet<Scope<'a>>,
    ) {
        if visited.contains(from) {
            return;
        }

        visited.insert(from.clone());

        if let Some(used_vars) = self.used_variables.get(from) {
            used.extend(used_vars);
        }

        if let Some(spreads) = self.spreads.get(from) {
            for spread in spreads {
                self.find_used_vars(&Scope::Fragment(*spread), used, visited);
            }
        }
    }
}

impl<'a> Visitor<'a> for NoUnusedVariables<'a> {
    fn exit_document(&mut self, ctx: &mut ValidatorContext<'a>, _: &'a Document<'a>) {
        for (op_name, def_vars) in &self.defined_variables {
            let mut used = HashSet::new();
            let mut visited = HashSet::new();
            self.find_used_vars(&Scope::Operation(*op_name), &mut used, &mut visited);

            for var in def_vars.iter().filter(|v| !used.contains(&v.item)) {
                ctx.report_error(
                    RULE,
                    &error_message(var.item, *op_name),
                    &[var.span.start],
                );
            }
        }
    }

    fn enter_operation_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        op: &'a Spanning<Operation<'a>>,
    ) {
        let op_name = op.item.name.map(|s| s.item);
        self.current_scope = Some(Scope::Operation(op_name));
        self.defined_variables.insert(op_name, HashSet::new());
    }

    fn enter_fragment_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        f: &'a Spanning<Fragment<'a>>,
    ) {
        self.current_scope = Some(Scope::Fragment(f.item.name.item));
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
                .push(spread.item.name.item);
        }
    }

    fn enter_variable_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        (var_name, _): &'a (Spanning<&'a str>, VariableDefinition<'a>),
    ) {
        if let Some(Scope::Operation(op_name)) = &self.current_scope {
            if let Some(vars) = self.defined_variables.get_mut(op_name) {
                vars.insert(var_name);
            }
        }
    }

    fn enter_variable_value(&mut self, _: &mut ValidatorContext<'a>, var_name: Spanning<&'a str>) {
        if let Some(scope) = &self.current_scope {
            self.used_variables
                .entry(scope.clone())
                .or_default()
                .push(var_name.item);
        }
    }
}

fn error_message(var_name: &str, op_name: Option<&str>) -> String {
    if let Some(op_name) = op_name {
        format!("Variable \"${var_name}\" is not used by operation \"{op_name}\"")
    } else {
        format!("Variable \"${var_name}\" is not used")
    }
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn uses_all_variables() {
        expect_passes_rule(
            factory,
            "query Q($a: String) { complicatedArgs { stringArgField(stringArg: $a) } }",
        );
    }

    #[test]
    fn uses_variable_through_fragment() {
        expect_passes_rule(
            factory,
            "query Q($a: String) { complicatedArgs { ...FragA } } fragment FragA on ComplicatedArgs { stringArgField(stringArg: $a) }",
        );
    }

    #[test]
    fn variable_not_used() {
        expect_fails_rule(
            factory,
            "query Q($a: String, $b: String) { complicatedArgs { stringArgField(stringArg: $a) } }",
            &[RuleError::new(
                RULE,
                &error_message("b", Some("Q")),
                &[SourcePosition::new(20, 0, 20)],
            )],
        );
    }
}
