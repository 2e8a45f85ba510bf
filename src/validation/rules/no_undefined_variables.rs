use std::collections::{HashMap, HashSet};

use crate::{
    ast::{Document, Fragment, FragmentSpread, InputValue, Operation, VariableDefinition},
    parser::{SourcePosition, Spanning},
    validation::{ValidatorContext, Visitor},
};

use super::Scope;

pub const RULE: &str = "NoUndefinedVariables";

pub fn factory<'a>() -> NoUndefinedVariables<'a> {
    NoUndefinedVariables {
        defined_variables: HashMap::new(),
        used_variables: HashMap::new(),
        current_scope: None,
        spreads: HashMap::new(),
    }
}

pub struct NoUndefinedVariables<'a> {
    defined_variables: HashMap<Option<&'a str>, (SourcePosition, HashSet<&'a str>)>,
    used_variables: HashMap<Scope<'a>, Vec<Spanning<&'a str>>>,
    current_scope: Option<Scope<'a>>,
    spreads: HashMap<Scope<'a>, Vec<&'a str>>,
}

impl<'a> NoUndefinedVariables<'a> {
    fn find_undef_vars(
        &self,
        scope: &Scope<'a>,
        defined: &HashSet<&'a str>,
        unused: &mut Vec<Spanning<&'a str>>,
        visited: &mut HashSet<Scope<'a>>,
    ) {
        if visited.contains(scope) {
            return;
        }

        visited.insert(scope.clone());

        if let Some(usages) = self.used_variables.get(scope) {
            for var in usages {
                if !defined.contains(&var.item) {
                    unused.push(*var);
                }
            }
        }

        if let Some(spreads) = self.spreads.get(scope) {
            for spread in spreads {
                self.find_undef_vars(&Scope::Fragment(*spread), defined, unused, visited);
            }
        }
    }
}

impl<'a> Visitor<'a> for NoUndefinedVariables<'a> {
    fn exit_document(&mut self, ctx: &mut ValidatorContext<'a>, _: &'a Document<'a>) {
        for (op_name, (op_pos, def_vars)) in &self.defined_variables {
            let mut unused = Vec::new();
            let mut visited = HashSet::new();
            self.find_undef_vars(
                &Scope::Operation(*op_name),
                def_vars,
                &mut unused,
                &mut visited,
            );

            for var in unused {
                ctx.report_error(
                    RULE,
                    &error_message(var.item, *op_name),
                    &[var.span.start, *op_pos],
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
        self.defined_variables
            .insert(op_name, (op.span.start, HashSet::new()));
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
            if let Some((_, vars)) = self.defined_variables.get_mut(op_name) {
                vars.insert(var_name.item);
            }
        }
    }

    fn enter_variable_value(&mut self, _: &mut ValidatorContext<'a>, var_name: Spanning<&'a str>) {
        if let Some(scope) = &self.current_scope {
            self.used_variables
                .entry(scope.clone())
                .or_default()
                .push(var_name);
        }
    }
}

fn error_message(var_name: &str, op_name: Option<&str>) -> String {
    if let Some(op_name) = op_name {
        format!("Variable \"${var_name}\" is not defined by operation \"{op_name}\"")
    } else {
        format!("Variable \"${var_name}\" is not defined")
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
    fn all_variables_defined() {
        expect_passes_rule(
            factory,
            "query Foo($a: String) { complicatedArgs { stringArgField(stringArg: $a) } }",
        );
    }

    #[test]
    fn variable_used_in_fragment_defined_by_operation() {
        expect_passes_rule(
            factory,
            "query Foo($a: String) { complicatedArgs { ...FragA } } fragment FragA on ComplicatedArgs { stringArgField(stringArg: $a) }",
        );
    }

    #[test]
    fn variable_not_defined() {
        expect_fails_rule(
            factory,
            "query Foo($a: String) { complicatedArgs { stringArgField(stringArg: $b) } }",
            &[RuleError::new(
                RULE,
                &error_message("b", Some("Foo")),
                &[SourcePosition::new(68, 0, 68), SourcePosition::new(0, 0, 0)],
            )],
        );
    }

    #[test]
    fn variable_in_fragment_not_defined_by_operation() {
        expect_fails_rule(
            factory,
            "query Foo { complicatedArgs { ...FragA } } fragment FragA on ComplicatedArgs { stringArgField(stringArg: $a) }",
            &[RuleError::new(
                RULE,
                &error_message("a", Some("Foo")),
                &[
                    SourcePosition::new(105, 0, 105),
                    SourcePosition::new(0, 0, 0),
                ],
            )],
        );
    }
}
