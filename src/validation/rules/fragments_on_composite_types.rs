use crate::{
    ast::{Fragment, InlineFragment},
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "FragmentsOnCompositeTypes";

pub fn factory() -> FragmentsOnCompositeTypes {
    FragmentsOnCompositeTypes
}

pub struct FragmentsOnCompositeTypes;

impl<'a> Visitor<'a> for FragmentsOnCompositeTypes {
    fn enter_fragment_definition(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        f: &'a Spanning<Fragment<'a>>,
    ) {
        {
            if let Some(current_type) = ctx.current_type() {
                if !current_type.is_composite() {
                    let type_name = f.item.type_condition.item;

                    ctx.report_error(
                        RULE,
                        &error_message(Some(f.item.name.item), type_name),
                        &[f.item.type_condition.span.start],
                    );
                }
            }
        }
    }

    fn enter_inline_fragment(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        f: &'a Spanning<InlineFragment<'a>>,
    ) {
        {
            if let Some(current_type) = ctx.current_type() {
                if !current_type.is_composite() {
                    if let Some(type_cond) = &f.item.type_condition {
                        ctx.report_error(
                            RULE,
                            &error_message(None, type_cond.item),
                            &[type_cond.span.start],
                        );
                    }
                }
            }
        }
    }
}

fn error_message(fragment_name: Option<&str>, on_type: &str) -> String {
    if let Some(name) = fragment_name {
        format!("Fragment \"{name}\" cannot condition on non composite type \"{on_type}\"")
    } else {
        format!("Fragment cannot condition on non composite type \"{on_type}\"")
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
    fn fragments_on_objects_interfaces_and_unions() {
        expect_passes_rule(factory, "fragment onObject on Dog { name } { dog { ...onObject } }");
        expect_passes_rule(factory, "fragment onIface on Pet { name } { pet { ...onIface } }");
        expect_passes_rule(
            factory,
            "fragment onUnion on CatOrDog { ...on Dog { name } } { catOrDog { ...onUnion } }",
        );
    }

    #[test]
    fn fragment_on_scalar_is_rejected() {
        expect_fails_rule(
            factory,
            "fragment scalarFrag on Boolean { bad } { dog { ...scalarFrag } }",
            &[RuleError::new(
                RULE,
                &error_message(Some("scalarFrag"), "Boolean"),
                &[SourcePosition::new(23, 0, 23)],
            )],
        );
    }

    #[test]
    fn inline_fragment_on_enum_is_rejected() {
        expect_fails_rule(
            factory,
            "{ cat { ...on FurColor { bad } } }",
            &[RuleError::new(
                RULE,
                &error_message(None, "FurColor"),
                &[SourcePosition::new(14, 0, 14)],
            )],
        );
    }
}
