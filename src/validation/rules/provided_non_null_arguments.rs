use crate::{
    ast::{Directive, Field},
    executor::lookup_field,
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

pub const RULE: &str = "ProvidedNonNullArguments";

pub fn factory() -> ProvidedNonNullArguments {
    ProvidedNonNullArguments
}

pub struct ProvidedNonNullArguments;

impl<'a> Visitor<'a> for ProvidedNonNullArguments {
    fn enter_field(&mut self, ctx: &mut ValidatorContext<'a>, field: &'a Spanning<Field<'a>>) {
        let field_name = field.item.name.item;

        let Some(meta_field) = ctx
            .parent_type()
            .and_then(|t| lookup_field(t, field_name))
        else {
            return;
        };

        if let Some(meta_args) = &meta_field.arguments {
            for meta_arg in meta_args {
                if meta_arg.arg_type.is_non_null()
                    && meta_arg.default_value.is_none()
                    && field
                        .item
                        .arguments
                        .as_ref()
                        .and_then(|args| args.item.get(&meta_arg.name))
                        .is_none()
                {
                    ctx.report_error(
                        RULE,
                        &field_error_message(
                            field_name,
                            &meta_arg.name,
                            &meta_arg.arg_type.to_string(),
                        ),
                        &[field.span.start],
                    );
                }
            }
        }
    }

    fn enter_directive(
        &mut self,
        ctx: &mut ValidatorContext<'a>,
        directive: &'a Spanning<Directive<'a>>,
    ) {
        let directive_name = directive.item.name.item;

        if let Some(directive_type) = ctx.schema.directive_by_name(directive_name) {
            for meta_arg in &directive_type.arguments {
                if meta_arg.arg_type.is_non_null()
                    && meta_arg.default_value.is_none()
                    && directive
                        .item
                        .arguments
                        .as_ref()
                        .and_then(|args| args.item.get(&meta_arg.name))
                        .is_none()
                {
                    ctx.report_error(
                        RULE,
                        &directive_error_message(
                            directive_name,
                            &meta_arg.name,
                            &meta_arg.arg_type.to_string(),
                        ),
                        &[directive.span.start],
                    );
                }
            }
        }
    }
}

fn field_error_message(field_name: &str, arg_name: &str, type_name: &str) -> String {
    format!(
        "Field \"{field_name}\" argument \"{arg_name}\" of type \"{type_name}\" is required but not provided",
    )
}

fn directive_error_message(directive_name: &str, arg_name: &str, type_name: &str) -> String {
    format!(
        "Directive \"@{directive_name}\" argument \"{arg_name}\" of type \"{type_name}\" is required but not provided",
    )
}
