use crate::{
    ast::Field,
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "ScalarLeafs";

pub fn factory() -> ScalarLeafs {
    ScalarLeafs
}

pub struct ScalarLeafs;

impl<'a> Visitor<'a> for ScalarLeafs {
    fn enter_field(&mut self, ctx: &mut ValidatorContext<'a>, field: &'a Spanning<Field<'a>>) {
        let field_name = field.item.name.item;

        let Some(field_type) = ctx.current_type() else {
            return;
        };

        let has_selection = field.item.selection_set.is_some();

        if field_type.is_leaf() && has_selection {
            ctx.report_error(
                RULE,
                &no_allowed_error_message(field_name, field_type.name()),
                &[field.span.start],
            );
        } else if !field_type.is_leaf() && !has_selection {
            ctx.report_error(
                RULE,
                &required_error_message(field_name, field_type.name()),
                &[field.span.start],
            );
        }
    }
}

fn no_allowed_error_message(field_name: &str, type_name: &str) -> String {
    format!(
        "Field \"{field_name}\" must not have a selection since type \"{type_name}\" has no subfields",
    )
}

fn required_error_message(field_name: &str, type_name: &str) -> String {
    format!(
        "Field \"{field_name}\" of type \"{type_name}\" must have a selection of subfields. Did you mean \"{field_name} {{ ... }}\"?",
    )
}

#[cfg(test)]
mod tests {
    use super::{RULE, factory, no_allowed_error_message, required_error_message};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn valid_leaf_and_composite_selections() {
        expect_passes_rule(factory, "{ dog { name barkVolume } }");
        expect_passes_rule(factory, "{ pet { name } catOrDog { ...on Dog { name } } }");
    }

    #[test]
    fn selection_on_scalar_is_rejected() {
        expect_fails_rule(
            factory,
            "{ dog { barkVolume { sinceWhen } } }",
            &[RuleError::new(
                RULE,
                &no_allowed_error_message("barkVolume", "Int"),
                &[SourcePosition::new(8, 0, 8)],
            )],
        );
    }

    #[test]
    fn selection_on_enum_is_rejected() {
        expect_fails_rule(
            factory,
            "{ cat { furColor { inHexdec } } }",
            &[RuleError::new(
                RULE,
                &no_allowed_error_message("furColor", "FurColor"),
                &[SourcePosition::new(8, 0, 8)],
            )],
        );
    }

    #[test]
    fn missing_selection_on_composite_is_rejected() {
        expect_fails_rule(
            factory,
            "{ human }",
            &[RuleError::new(
                RULE,
                &required_error_message("human", "Human"),
                &[SourcePosition::new(2, 0, 2)],
            )],
        );
    }
}
