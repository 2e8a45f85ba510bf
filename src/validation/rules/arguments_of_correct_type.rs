use crate::{
    ast::InputValue,
    parser::Spanning,
    validation::{ValidatorContext, Visitor, input_value::is_valid_literal_value},
};

pub const RULE: &str = "ArgumentsOfCorrectType";

pub fn factory() -> ArgumentsOfCorrectType {
    ArgumentsOfCorrectType
}

pub struct ArgumentsOfCorrectType;

impl<'a> Visitor<'a> for ArgumentsOfCorrectType {
    fn enter_argument(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        (arg_name, arg_value): &'a (Spanning<&'a str>, Spanning<InputValue>),
    ) {
        let Some(argument_type) = ctx.current_input_type_literal().cloned() else {
            return;
        };

        let meta_type = ctx.schema.make_type(&argument_type);

        if !is_valid_literal_value(ctx.schema, &meta_type, &arg_value.item) {
            ctx.report_error(
                RULE,
                &error_message(arg_name.item, &argument_type.to_string()),
                &[arg_value.span.start],
            );
        }
    }
}

fn error_message(arg_name: &str, type_name: &str) -> String {
    format!("Invalid value for argument \"{arg_name}\", expected type \"{type_name}\"")
}
