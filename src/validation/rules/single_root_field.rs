use crate::{
    ast::{Operation, OperationType, Selection},
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "SingleRootField";

pub fn factory() -> SingleRootField {
    SingleRootField
}

pub struct SingleRootField;

impl<'a> Visitor<'a> for SingleRootField {
    fn enter_operation_definition(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        op: &'a Spanning<Operation<'a>>,
    ) {
        if op.item.operation_type != OperationType::Subscription {
            return;
        }

        if op.item.selection_set.len() > 1 {
            let extra_positions = op.item.selection_set[1..]
                .iter()
                .map(|s| match s {
                    Selection::Field(f) => f.span.start,
                    Selection::FragmentSpread(s) => s.span.start,
                    Selection::InlineFragment(f) => f.span.start,
                })
                .collect::<Vec<_>>();

            ctx.report_error(
                RULE,
                &error_message(op.item.name.map(|n| n.item)),
                &extra_positions,
            );
        }
    }
}

fn error_message(op_name: Option<&str>) -> String {
    if let Some(name) = op_name {
        format!("Subscription \"{name}\" must select only one top level field")
    } else {
        "Anonymous subscription must select only one top level field".into()
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
    fn single_field_subscription_passes() {
        expect_passes_rule(factory, "subscription S { newMessage }");
    }

    #[test]
    fn queries_are_not_limited() {
        expect_passes_rule(factory, "{ dog { name } cat { name } }");
    }

    #[test]
    fn multiple_root_fields_are_rejected() {
        expect_fails_rule(
            factory,
            "subscription S { newMessage disturbance }",
            &[RuleError::new(
                RULE,
                &error_message(Some("S")),
                &[SourcePosition::new(28, 0, 28)],
            )],
        );
    }
}
