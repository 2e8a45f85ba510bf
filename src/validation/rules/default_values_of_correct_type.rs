use crate::{
    ast::VariableDefinition,
    parser::Spanning,
    validation::{ValidatorContext, Visitor, input_value::is_valid_literal_value},
};

pub const RULE: &str = "DefaultValuesOfCorrectType";

pub fn factory() -> DefaultValuesOfCorrectType {
    DefaultValuesOfCorrectType
}

pub struct DefaultValuesOfCorrectType;

impl<'a> Visitor<'a> for DefaultValuesOfCorrectType {
    fn enter_variable_definition(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        (var_name, var_def): &'a (Spanning<&'a str>, VariableDefinition<'a>),
    ) {
        let Some(default) = &var_def.default_value else {
            return;
        };

        if var_def.var_type.item.is_non_null() {
            ctx.report_error(
                RULE,
                &non_null_error_message(var_name.item, &var_def.var_type.item.to_string()),
                &[default.span.start],
            );
            return;
        }

        let meta_type = ctx.schema.make_type(&var_def.var_type.item);

        if !is_valid_literal_value(ctx.schema, &meta_type, &default.item) {
            ctx.report_error(
                RULE,
                &type_error_message(var_name.item, &var_def.var_type.item.to_string()),
                &[default.span.start],
            );
        }
    }
}

fn non_null_error_message(var_name: &str, type_name: &str) -> String {
    format!(
        "Variable \"${var_name}\" of type \"{type_name}\" is required and will never use the default value. Perhaps you meant to use type \"{}\"",
        type_name.trim_end_matches('!'),
    )
}

fn type_error_message(var_name: &str, type_name: &str) -> String {
    format!("Invalid default value for \"${var_name}\", expected type \"{type_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, factory, non_null_error_message, type_error_message};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn variables_without_defaults_pass() {
        expect_passes_rule(
            factory,
            "query Q($a: Int, $b: String, $c: ComplexInput) { dog { name } }",
        );
    }

    #[test]
    fn valid_defaults_pass() {
        expect_passes_rule(
            factory,
            r#"query Q($a: Int = 1, $b: String = "ok", $c: ComplexInput = {requiredField: true}) { dog { name } }"#,
        );
    }

    #[test]
    fn no_default_on_required_variable() {
        expect_fails_rule(
            factory,
            "query Q($a: Int! = 3) { dog { name } }",
            &[RuleError::new(
                RULE,
                &non_null_error_message("a", "Int!"),
                &[SourcePosition::new(19, 0, 19)],
            )],
        );
    }

    #[test]
    fn mistyped_default_is_rejected() {
        expect_fails_rule(
            factory,
            r#"query Q($a: Int = "no") { dog { name } }"#,
            &[RuleError::new(
                RULE,
                &type_error_message("a", "Int"),
                &[SourcePosition::new(18, 0, 18)],
            )],
        );
    }
}
