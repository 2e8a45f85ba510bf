use std::collections::HashMap;

use crate::{
    ast::{Definition, Document, Fragment, FragmentSpread, InlineFragment},
    parser::Spanning,
    schema::meta::MetaType,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "PossibleFragmentSpreads";

pub fn factory<'a>() -> PossibleFragmentSpreads<'a> {
    PossibleFragmentSpreads {
        fragment_types: HashMap::new(),
    }
}

pub struct PossibleFragmentSpreads<'a> {
    fragment_types: HashMap<&'a str, &'a str>,
}

impl<'a> Visitor<'a> for PossibleFragmentSpreads<'a> {
    fn enter_document(&mut self, _: &mut ValidatorContext<'a>, defs: &'a Document<'a>) {
        for def in defs {
            if let Definition::Fragment(f) = def {
                self.fragment_types
                    .insert(f.item.name.item, f.item.type_condition.item);
            }
        }
    }

    fn enter_inline_fragment(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        frag: &'a Spanning<InlineFragment<'a>>,
    ) {
        let (Some(parent_type), Some(frag_type)) = (
            ctx.parent_type(),
            frag.item
                .type_condition
                .as_ref()
                .and_then(|s| ctx.schema.concrete_type_by_name(s.item)),
        ) else {
            return;
        };

        if !can_spread(ctx, parent_type, frag_type) {
            ctx.report_error(
                RULE,
                &inline_error_message(frag_type.name(), parent_type.name()),
                &[frag.span.start],
            );
        }
    }

    fn enter_fragment_spread(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        spread: &'a Spanning<FragmentSpread<'a>>,
    ) {
        let (Some(parent_type), Some(frag_type)) = (
            ctx.parent_type(),
            self.fragment_types
                .get(spread.item.name.item)
                .and_then(|name| ctx.schema.concrete_type_by_name(name)),
        ) else {
            return;
        };

        if !can_spread(ctx, parent_type, frag_type) {
            ctx.report_error(
                RULE,
                &spread_error_message(spread.item.name.item, frag_type.name(), parent_type.name()),
                &[spread.span.start],
            );
        }
    }
}

// A spread is possible when the parent and the condition share at least one
// concrete type.
fn can_spread(ctx: &ValidatorContext<'_>, parent: &MetaType, condition: &MetaType) -> bool {
    if !parent.is_composite() || !condition.is_composite() {
        return true;
    }
    ctx.schema.type_overlap(parent, condition)
}

fn inline_error_message(frag_type: &str, parent_type: &str) -> String {
    format!(
        "Fragment cannot be spread here as objects of type \"{parent_type}\" can never be of type \"{frag_type}\"",
    )
}

fn spread_error_message(frag_name: &str, frag_type: &str, parent_type: &str) -> String {
    format!(
        "Fragment \"{frag_name}\" cannot be spread here as objects of type \"{parent_type}\" can never be of type \"{frag_type}\"",
    )
}

#[cfg(test)]
mod tests {
    use super::{RULE, factory, inline_error_message, spread_error_message};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn same_object_and_compatible_abstract_spreads() {
        expect_passes_rule(factory, "{ dog { ...on Dog { barkVolume } } }");
        expect_passes_rule(factory, "{ pet { ...on Dog { barkVolume } } }");
        expect_passes_rule(factory, "{ catOrDog { ...on Cat { meowVolume } } }");
        expect_passes_rule(
            factory,
            "{ dog { ...PetFrag } } fragment PetFrag on Pet { name }",
        );
    }

    #[test]
    fn incompatible_object_into_object() {
        expect_fails_rule(
            factory,
            "{ cat { ...on Dog { barkVolume } } }",
            &[RuleError::new(
                RULE,
                &inline_error_message("Dog", "Cat"),
                &[SourcePosition::new(8, 0, 8)],
            )],
        );
    }

    #[test]
    fn incompatible_fragment_spread() {
        expect_fails_rule(
            factory,
            "{ humanOrAlien { ...DogFrag } } fragment DogFrag on Dog { barkVolume }",
            &[RuleError::new(
                RULE,
                &spread_error_message("DogFrag", "Dog", "HumanOrAlien"),
                &[SourcePosition::new(17, 0, 17)],
            )],
        );
    }
}
