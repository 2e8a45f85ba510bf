use std::collections::hash_map::{Entry, HashMap};

use crate::{
    ast::{Directive, Field, InputValue},
    parser::{SourcePosition, Spanning},
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "UniqueArgumentNames";

pub fn factory<'a>() -> UniqueArgumentNames<'a> {
    UniqueArgumentNames {
        known_names: HashMap::new(),
    }
}

pub struct UniqueArgumentNames<'a> {
    known_names: HashMap<&'a str, SourcePosition>,
}

impl<'a> Visitor<'a> for UniqueArgumentNames<'a> {
    fn enter_directive(&mut self, _: &mut ValidatorContext<'a>, _: &'a Spanning<Directive<'a>>) {
        self.known_names = HashMap::new();
    }

    fn enter_field(&mut self, _: &mut ValidatorContext<'a>, _: &'a Spanning<Field<'a>>) {
        self.known_names = HashMap::new();
    }

    fn enter_argument(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        (arg_name, _): &'a (Spanning<&'a str>, Spanning<InputValue>),
    ) {
        match self.known_names.entry(arg_name.item) {
            Entry::Occupied(e) => {
                ctx.report_error(
                    RULE,
                    &error_message(arg_name.item),
                    &[*e.get(), arg_name.span.start],
                );
            }
            Entry::Vacant(e) => {
                e.insert(arg_name.span.start);
            }
        }
    }
}

fn error_message(arg_name: &str) -> String {
    format!("There can only be one argument named \"{arg_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn distinct_argument_names_pass() {
        expect_passes_rule(factory, "{ dog { isAtLocation(x: 1, y: 2) } }");
    }

    #[test]
    fn duplicate_field_arguments_are_rejected() {
        expect_fails_rule(
            factory,
            "{ dog { isAtLocation(x: 1, x: 2) } }",
            &[RuleError::new(
                RULE,
                &error_message("x"),
                &[SourcePosition::new(21, 0, 21), SourcePosition::new(27, 0, 27)],
            )],
        );
    }

    #[test]
    fn duplicate_directive_arguments_are_rejected() {
        expect_fails_rule(
            factory,
            "{ dog { name @include(if: true, if: true) } }",
            &[RuleError::new(
                RULE,
                &error_message("if"),
                &[SourcePosition::new(22, 0, 22), SourcePosition::new(32, 0, 32)],
            )],
        );
    }
}
