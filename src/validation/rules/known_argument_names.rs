use crate::{
    ast::{Directive, Field, InputValue},
    executor::lookup_field,
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "KnownArgumentNames";

pub fn factory<'a>() -> KnownArgumentNames<'a> {
    KnownArgumentNames { current_args: None }
}

#[derive(Debug)]
enum ArgumentPosition<'a> {
    Directive(&'a str),
    Field(&'a str, String),
}

pub struct KnownArgumentNames<'a> {
    current_args: Option<(ArgumentPosition<'a>, Vec<&'a str>)>,
}

impl<'a> Visitor<'a> for KnownArgumentNames<'a> {
    fn enter_directive(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        directive: &'a Spanning<Directive<'a>>,
    ) {
        self.current_args = ctx
            .schema
            .directive_by_name(directive.item.name.item)
            .map(|d| {
                (
                    ArgumentPosition::Directive(directive.item.name.item),
                    d.arguments.iter().map(|a| a.name.as_str()).collect(),
                )
            });
    }

    fn exit_directive(&mut self, _: &mut ValidatorContext<'a>, _: &'a Spanning<Directive<'a>>) {
        self.current_args = None;
    }

    fn enter_field(&mut self, ctx: &mut ValidatorContext<'a>, field: &'a Spanning<Field<'a>>) {
        self.current_args = ctx
            .parent_type()
            .and_then(|t| {
                lookup_field(t, field.item.name.item).map(|f| (t.name().as_str(), f))
            })
            .map(|(parent, f)| {
                (
                    ArgumentPosition::Field(field.item.name.item, parent.into()),
                    f.arguments
                        .as_ref()
                        .map(|args| args.iter().map(|a| a.name.as_str()).collect())
                        .unwrap_or_default(),
                )
            });
    }

    fn exit_field(&mut self, _: &mut ValidatorContext<'a>, _: &'a Spanning<Field<'a>>) {
        self.current_args = None;
    }

    fn enter_argument(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        (arg_name, _): &'a (Spanning<&'a str>, Spanning<InputValue>),
    ) {
        if let Some((pos, args)) = &self.current_args {
            if !args.contains(&arg_name.item) {
                let message = match pos {
                    ArgumentPosition::Field(field_name, type_name) => {
                        field_error_message(arg_name.item, field_name, type_name)
                    }
                    ArgumentPosition::Directive(directive_name) => {
                        directive_error_message(arg_name.item, directive_name)
                    }
                };

                ctx.report_error(RULE, &message, &[arg_name.span.start]);
            }
        }
    }
}

fn field_error_message(arg_name: &str, field_name: &str, type_name: &str) -> String {
    format!("Unknown argument \"{arg_name}\" on field \"{field_name}\" of type \"{type_name}\"")
}

fn directive_error_message(arg_name: &str, directive_name: &str) -> String {
    format!("Unknown argument \"{arg_name}\" on directive \"@{directive_name}\"")
}

#[cfg(test)]
mod tests {
    use super::{RULE, directive_error_message, factory, field_error_message};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn known_arguments_pass() {
        expect_passes_rule(factory, "{ dog { isHousetrained(atOtherHomes: true) } }");
        expect_passes_rule(factory, "{ dog { name @include(if: true) } }");
    }

    #[test]
    fn unknown_field_argument() {
        expect_fails_rule(
            factory,
            "{ dog { doesKnowCommand(command: SIT) } }",
            &[RuleError::new(
                RULE,
                &field_error_message("command", "doesKnowCommand", "Dog"),
                &[SourcePosition::new(24, 0, 24)],
            )],
        );
    }

    #[test]
    fn unknown_directive_argument() {
        expect_fails_rule(
            factory,
            "{ dog { name @include(unless: false) } }",
            &[RuleError::new(
                RULE,
                &directive_error_message("unless", "include"),
                &[SourcePosition::new(22, 0, 22)],
            )],
        );
    }
}
