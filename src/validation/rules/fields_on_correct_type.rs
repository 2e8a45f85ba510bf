use crate::{
    ast::Field,
    executor::lookup_field,
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "FieldsOnCorrectType";

pub fn factory() -> FieldsOnCorrectType {
    FieldsOnCorrectType
}

pub struct FieldsOnCorrectType;

impl<'a> Visitor<'a> for FieldsOnCorrectType {
    fn enter_field(&mut self, ctx: &mut ValidatorContext<'a>, field: &'a Spanning<Field<'a>>) {
        let Some(parent_type) = ctx.parent_type() else {
            return;
        };

        let field_name = field.item.name.item;

        // `__typename`, `__schema`, and `__type` are synthetic and valid on
        // any composite parent.
        if lookup_field(parent_type, field_name).is_some() && parent_type.is_composite() {
            return;
        }

        ctx.report_error(
            RULE,
            &error_message(field_name, parent_type.name()),
            &[field.item.name.span.start],
        );
    }
}

fn error_message(field: &str, type_name: &str) -> String {
    format!("Unknown field \"{field}\" on type \"{type_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn object_field_selection() {
        expect_passes_rule(factory, "{ dog { name barkVolume } }");
    }

    #[test]
    fn interface_field_selection_and_typename() {
        expect_passes_rule(factory, "{ pet { __typename name } }");
    }

    #[test]
    fn introspection_fields_on_any_composite() {
        expect_passes_rule(factory, "{ dog { __schema { queryType { name } } } }");
        expect_passes_rule(factory, "{ catOrDog { __typename } }");
    }

    #[test]
    fn unknown_field_on_object() {
        expect_fails_rule(
            factory,
            "{ dog { meowVolume } }",
            &[RuleError::new(
                RULE,
                &error_message("meowVolume", "Dog"),
                &[SourcePosition::new(8, 0, 8)],
            )],
        );
    }

    #[test]
    fn plain_field_on_union_is_rejected() {
        expect_fails_rule(
            factory,
            "{ catOrDog { name } }",
            &[RuleError::new(
                RULE,
                &error_message("name", "CatOrDog"),
                &[SourcePosition::new(13, 0, 13)],
            )],
        );
    }

    #[test]
    fn deep_unknown_field() {
        expect_fails_rule(
            factory,
            "{ human { pets { unknown } } }",
            &[RuleError::new(
                RULE,
                &error_message("unknown", "Pet"),
                &[SourcePosition::new(17, 0, 17)],
            )],
        );
    }
}
