use crate::{
    ast::{Fragment, InlineFragment, VariableDefinition},
    parser::{SourcePosition, Spanning},
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "KnownTypeNames";

pub fn factory() -> KnownTypeNames {
    KnownTypeNames
}

pub struct KnownTypeNames;

impl<'a> Visitor<'a> for KnownTypeNames {
    fn enter_inline_fragment(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        fragment: &'a Spanning<InlineFragment<'a>>,
    ) {
        if let Some(type_cond) = &fragment.item.type_condition {
            validate_type(ctx, type_cond.item, &type_cond.span.start);
        }
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        fragment: &'a Spanning<Fragment<'a>>,
    ) {
        let type_cond = &fragment.item.type_condition;
        validate_type(ctx, type_cond.item, &type_cond.span.start);
    }

    fn enter_variable_definition(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        (_, var_def): &'a (Spanning<&'a str>, VariableDefinition<'a>),
    ) {
        let type_name = var_def.var_type.item.innermost_name();
        validate_type(ctx, type_name, &var_def.var_type.span.start);
    }
}

fn validate_type(ctx: &mut ValidatorContext<'_>, type_name: &str, location: &SourcePosition) {
    if ctx.schema.concrete_type_by_name(type_name).is_none() {
        ctx.report_error(RULE, &error_message(type_name), &[*location]);
    }
}

fn error_message(type_name: &str) -> String {
    format!("Unknown type \"{type_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn known_type_names_are_valid() {
        expect_passes_rule(
            factory,
            "query Q($var: String, $list: [Boolean!]) { human(id: $var) { pets { ...PetFields } } } fragment PetFields on Pet { name }",
        );
    }

    #[test]
    fn unknown_type_names_are_invalid() {
        expect_fails_rule(
            factory,
            "query Q($var: JumbledUpLetters) { human(id: $var) { name ...on Badger { name } } }",
            &[
                RuleError::new(
                    RULE,
                    &error_message("JumbledUpLetters"),
                    &[SourcePosition::new(14, 0, 14)],
                ),
                RuleError::new(
                    RULE,
                    &error_message("Badger"),
                    &[SourcePosition::new(63, 0, 63)],
                ),
            ],
        );
    }
}
