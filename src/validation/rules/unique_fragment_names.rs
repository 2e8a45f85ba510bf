use std::collections::hash_map::{Entry, HashMap};

use crate::{
    ast::Fragment,
    parser::{SourcePosition, Spanning},
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "UniqueFragmentNames";

pub fn factory<'a>() -> UniqueFragmentNames<'a> {
    UniqueFragmentNames {
        names: HashMap::new(),
    }
}

pub struct UniqueFragmentNames<'a> {
    names: HashMap<&'a str, SourcePosition>,
}

impl<'a> Visitor<'a> for UniqueFragmentNames<'a> {
    fn enter_fragment_definition(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        f: &'a Spanning<Fragment<'a>>,
    ) {
        match self.names.entry(f.item.name.item) {
            Entry::Occupied(e) => {
                ctx.report_error(
                    RULE,
                    &error_message(f.item.name.item),
                    &[*e.get(), f.item.name.span.start],
                );
            }
            Entry::Vacant(e) => {
                e.insert(f.item.name.span.start);
            }
        }
    }
}

fn error_message(frag_name: &str) -> String {
    format!("There can only be one fragment named \"{frag_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn distinct_fragment_names_pass() {
        expect_passes_rule(
            factory,
            "{ dog { ...FragA ...FragB } } fragment FragA on Dog { name } fragment FragB on Dog { nickname }",
        );
    }

    #[test]
    fn duplicate_fragment_names_are_rejected() {
        expect_fails_rule(
            factory,
            "fragment F on Dog { name } fragment F on Dog { nickname }",
            &[RuleError::new(
                RULE,
                &error_message("F"),
                &[SourcePosition::new(9, 0, 9), SourcePosition::new(36, 0, 36)],
            )],
        );
    }
}
