use std::collections::hash_map::{Entry, HashMap};

use crate::{
    ast::Directive,
    parser::{SourcePosition, Spanning},
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "UniqueDirectivesPerLocation";

pub fn factory<'a>() -> UniqueDirectivesPerLocation<'a> {
    UniqueDirectivesPerLocation {
        known_names: HashMap::new(),
    }
}

pub struct UniqueDirectivesPerLocation<'a> {
    known_names: HashMap<&'a str, SourcePosition>,
}

impl<'a> Visitor<'a> for UniqueDirectivesPerLocation<'a> {
    // Every annotatable node resets the set; directives are visited directly
    // after their carrier is entered.
    fn enter_field(&mut self, _: &mut ValidatorContext<'a>, _: &'a Spanning<crate::ast::Field<'a>>) {
        self.known_names = HashMap::new();
    }

    fn enter_fragment_spread(
        &mut self,
        _: &mut ValidatorContext<'a>,
        _: &'a Spanning<crate::ast::FragmentSpread<'a>>,
    ) {
        self.known_names = HashMap::new();
    }

    fn enter_inline_fragment(
        &mut self,
        _: &mut ValidatorContext<'a>,
        _: &'a Spanning<crate::ast::InlineFragment<'a>>,
    ) {
        self.known_names = HashMap::new();
    }

    fn enter_fragment_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        _: &'a Spanning<crate::ast::Fragment<'a>>,
    ) {
        self.known_names = HashMap::new();
    }

    fn enter_operation_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        _: &'a Spanning<crate::ast::Operation<'a>>,
    ) {
        self.known_names = HashMap::new();
    }

    fn enter_directive(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        directive: &'a Spanning<Directive<'a>>,
    ) {
        let name = directive.item.name.item;
        match self.known_names.entry(name) {
            Entry::Occupied(e) => {
                ctx.report_error(
                    RULE,
                    &error_message(name),
                    &[*e.get(), directive.span.start],
                );
            }
            Entry::Vacant(e) => {
                e.insert(directive.span.start);
            }
        }
    }
}

fn error_message(directive_name: &str) -> String {
    format!("The directive \"{directive_name}\" can only be used once at this location")
}
