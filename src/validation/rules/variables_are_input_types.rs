use crate::{
    ast::VariableDefinition,
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "VariablesAreInputTypes";

pub fn factory() -> VariablesAreInputTypes {
    VariablesAreInputTypes
}

pub struct VariablesAreInputTypes;

impl<'a> Visitor<'a> for VariablesAreInputTypes {
    fn enter_variable_definition(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        (var_name, var_def): &'a (Spanning<&'a str>, VariableDefinition<'a>),
    ) {
        if let Some(var_type) = ctx
            .schema
            .concrete_type_by_name(var_def.var_type.item.innermost_name())
        {
            if !var_type.is_input() {
                ctx.report_error(
                    RULE,
                    &error_message(var_name.item, &var_def.var_type.item.to_string()),
                    &[var_def.var_type.span.start],
                );
            }
        }
    }
}

fn error_message(var_name: &str, type_name: &str) -> String {
    format!("Variable \"${var_name}\" cannot be of non-input type \"{type_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn input_types_are_valid() {
        expect_passes_rule(
            factory,
            "query Q($a: String, $b: [Boolean!], $c: ComplexInput, $d: FurColor) { dog { name } }",
        );
    }

    #[test]
    fn output_types_are_invalid() {
        expect_fails_rule(
            factory,
            "query Q($a: Dog, $b: [[CatOrDog!]]!, $c: Pet) { dog { name } }",
            &[
                RuleError::new(
                    RULE,
                    &error_message("a", "Dog"),
                    &[SourcePosition::new(12, 0, 12)],
                ),
                RuleError::new(
                    RULE,
                    &error_message("b", "[[CatOrDog!]]!"),
                    &[SourcePosition::new(21, 0, 21)],
                ),
                RuleError::new(
                    RULE,
                    &error_message("c", "Pet"),
                    &[SourcePosition::new(41, 0, 41)],
                ),
            ],
        );
    }
}
