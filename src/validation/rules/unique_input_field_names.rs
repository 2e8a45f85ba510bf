use std::collections::hash_map::{Entry, HashMap};

use crate::{
    ast::InputValue,
    parser::{SourcePosition, Spanning},
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "UniqueInputFieldNames";

pub fn factory<'a>() -> UniqueInputFieldNames<'a> {
    UniqueInputFieldNames {
        known_name_stack: Vec::new(),
    }
}

pub struct UniqueInputFieldNames<'a> {
    known_name_stack: Vec<HashMap<&'a str, SourcePosition>>,
}

impl<'a> Visitor<'a> for UniqueInputFieldNames<'a> {
    fn enter_object_value(
        &mut self,
        _: &mut ValidatorContext<'a>,
        _: Spanning<&'a Vec<(Spanning<String>, Spanning<InputValue>)>>,
    ) {
        self.known_name_stack.push(HashMap::new());
    }

    fn exit_object_value(
        &mut self,
        _: &mut ValidatorContext<'a>,
        _: Spanning<&'a Vec<(Spanning<String>, Spanning<InputValue>)>>,
    ) {
        self.known_name_stack.pop();
    }

    fn enter_object_field(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        (field_name, _): &'a (Spanning<String>, Spanning<InputValue>),
    ) {
        if let Some(known_names) = self.known_name_stack.last_mut() {
            match known_names.entry(field_name.item.as_str()) {
                Entry::Occupied(e) => {
                    ctx.report_error(
                        RULE,
                        &error_message(&field_name.item),
                        &[*e.get(), field_name.span.start],
                    );
                }
                Entry::Vacant(e) => {
                    e.insert(field_name.span.start);
                }
            }
        }
    }
}

fn error_message(field_name: &str) -> String {
    format!("There can only be one input field named \"{field_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn unique_input_fields_pass() {
        expect_passes_rule(
            factory,
            "{ complicatedArgs { complexArgField(complexArg: {requiredField: true, intField: 2}) } }",
        );
    }

    #[test]
    fn duplicate_input_fields_are_rejected() {
        expect_fails_rule(
            factory,
            "{ complicatedArgs { complexArgField(complexArg: {intField: 1, intField: 2}) } }",
            &[RuleError::new(
                RULE,
                &error_message("intField"),
                &[SourcePosition::new(49, 0, 49), SourcePosition::new(62, 0, 62)],
            )],
        );
    }
}
