use crate::{
    ast::FragmentSpread,
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "KnownFragmentNames";

pub fn factory() -> KnownFragmentNames {
    KnownFragmentNames
}

pub struct KnownFragmentNames;

impl<'a> Visitor<'a> for KnownFragmentNames {
    fn enter_fragment_spread(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        spread: &'a Spanning<FragmentSpread<'a>>,
    ) {
        let spread_name = spread.item.name.item;
        if !ctx.is_known_fragment(spread_name) {
            ctx.report_error(
                RULE,
                &error_message(spread_name),
                &[spread.item.name.span.start],
            );
        }
    }
}

fn error_message(frag_name: &str) -> String {
    format!("Unknown fragment \"{frag_name}\"")
}
