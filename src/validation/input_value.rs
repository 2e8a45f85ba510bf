use std::{collections::HashSet, fmt};

use crate::{
    ast::{InputValue, Operation, VariableDefinitions},
    executor::Variables,
    parser::{SourcePosition, Spanning},
    schema::{
        meta::{EnumMeta, InputObjectMeta, MetaType, ScalarMeta},
        model::{SchemaType, TypeType},
    },
    validation::RuleError,
};

const RULE: &str = "VariablesOfCorrectType";

#[derive(Debug)]
enum Path<'a> {
    Root,
    ArrayElement(usize, &'a Path<'a>),
    ObjectField(&'a str, &'a Path<'a>),
}

/// Validates the provided variable values against the selected operation's
/// declared variable types.
///
/// Runs when the query is bound to concrete variables, after the static
/// rules pass. Only the operation that will execute is checked; variable
/// declarations of other operations in the document don't constrain this
/// request.
pub fn validate_input_values(
    values: &Variables,
    operation: &Spanning<Operation<'_>>,
    schema: &SchemaType,
) -> Vec<RuleError> {
    let mut errs = vec![];

    if let Some(vars) = &operation.item.variable_definitions {
        validate_var_defs(values, &vars.item, schema, &mut errs);
    }

    errs.sort();
    errs
}

fn validate_var_defs(
    values: &Variables,
    var_defs: &VariableDefinitions<'_>,
    schema: &SchemaType,
    errors: &mut Vec<RuleError>,
) {
    for (name, def) in var_defs.iter() {
        let raw_type_name = def.var_type.item.innermost_name();
        match schema.concrete_type_by_name(raw_type_name) {
            Some(t) if t.is_input() => {
                let ct = schema.make_type(&def.var_type.item);

                let provided = values.get(name.item);
                let has_default = def.default_value.is_some();

                if def.var_type.item.is_non_null()
                    && is_absent_or_null(provided)
                    && !has_default
                {
                    errors.push(RuleError::new(
                        RULE,
                        &format!(
                            r#"Variable "${}" of required type "{}" was not provided."#,
                            name.item, def.var_type.item,
                        ),
                        &[name.span.start],
                    ));
                } else if let Some(v) = provided {
                    unify_value(name.item, &name.span.start, v, &ct, schema, errors, Path::Root);
                }
            }
            _ => errors.push(RuleError::new(
                RULE,
                &format!(
                    r#"Variable "${}" expected value of type "{}" which cannot be used as an input type."#,
                    name.item, def.var_type.item,
                ),
                &[name.span.start],
            )),
        }
    }
}

fn unify_value<'a>(
    var_name: &str,
    var_pos: &SourcePosition,
    value: &InputValue,
    meta_type: &TypeType<'a>,
    schema: &SchemaType,
    errors: &mut Vec<RuleError>,
    path: Path<'a>,
) {
    match meta_type {
        TypeType::NonNull(inner) => {
            if value.is_null() {
                push_unification_error(
                    errors,
                    var_name,
                    var_pos,
                    &path,
                    &format!(r#"Expected "{meta_type}", found null"#),
                );
            } else {
                unify_value(var_name, var_pos, value, inner, schema, errors, path);
            }
        }

        TypeType::List(inner) => {
            if value.is_null() {
                return;
            }

            match value.to_list_value() {
                Some(l) => {
                    for (i, v) in l.iter().enumerate() {
                        unify_value(
                            var_name,
                            var_pos,
                            v,
                            inner,
                            schema,
                            errors,
                            Path::ArrayElement(i, &path),
                        );
                    }
                }
                // A single value is promoted to a one-element list.
                _ => unify_value(var_name, var_pos, value, inner, schema, errors, path),
            }
        }

        TypeType::Concrete(mt) => {
            if value.is_null() {
                return;
            }

            match mt {
                MetaType::Scalar(sm) => unify_scalar(var_name, var_pos, value, sm, errors, &path),
                MetaType::Enum(em) => unify_enum(var_name, var_pos, value, em, errors, &path),
                MetaType::InputObject(iom) => {
                    unify_input_object(var_name, var_pos, value, iom, schema, errors, &path)
                }
                _ => unreachable!("input type variables are checked above"),
            }
        }
    }
}

fn unify_scalar(
    var_name: &str,
    var_pos: &SourcePosition,
    value: &InputValue,
    meta: &ScalarMeta,
    errors: &mut Vec<RuleError>,
    path: &Path<'_>,
) {
    match value {
        InputValue::List(_) => push_unification_error(
            errors,
            var_name,
            var_pos,
            path,
            &format!(r#"Expected "{}", found list"#, meta.name),
        ),
        InputValue::Object(_) if meta.name != "Map" => push_unification_error(
            errors,
            var_name,
            var_pos,
            path,
            &format!(r#"Expected "{}", found object"#, meta.name),
        ),
        _ => {
            if let Err(e) = (meta.parse_input_fn)(value) {
                push_unification_error(errors, var_name, var_pos, path, e.message());
            }
        }
    }
}

fn unify_enum(
    var_name: &str,
    var_pos: &SourcePosition,
    value: &InputValue,
    meta: &EnumMeta,
    errors: &mut Vec<RuleError>,
    path: &Path<'_>,
) {
    match value {
        InputValue::String(name) | InputValue::Enum(name) => {
            if !meta.values.iter().any(|ev| ev.name == name.as_str()) {
                push_unification_error(
                    errors,
                    var_name,
                    var_pos,
                    path,
                    &format!(r#"Invalid value for enum "{}""#, meta.name),
                )
            }
        }
        _ => push_unification_error(
            errors,
            var_name,
            var_pos,
            path,
            &format!(r#"Expected "{}", found not a string or enum"#, meta.name),
        ),
    }
}

fn unify_input_object(
    var_name: &str,
    var_pos: &SourcePosition,
    value: &InputValue,
    meta: &InputObjectMeta,
    schema: &SchemaType,
    errors: &mut Vec<RuleError>,
    path: &Path<'_>,
) {
    if let Some(obj) = value.to_object_value() {
        let mut keys = obj.keys().copied().collect::<HashSet<_>>();

        for input_field in &meta.input_fields {
            let mut has_value = false;
            keys.remove(input_field.name.as_str());

            if let Some(value) = obj.get(input_field.name.as_str()) {
                if !value.is_null() {
                    has_value = true;

                    unify_value(
                        var_name,
                        var_pos,
                        value,
                        &schema.make_type(&input_field.arg_type),
                        schema,
                        errors,
                        Path::ObjectField(&input_field.name, path),
                    );
                }
            }

            if !has_value
                && input_field.arg_type.is_non_null()
                && input_field.default_value.is_none()
            {
                push_unification_error(
                    errors,
                    var_name,
                    var_pos,
                    &Path::ObjectField(&input_field.name, path),
                    &format!(r#"Expected "{}", found null"#, input_field.arg_type),
                );
            }
        }

        for key in keys {
            push_unification_error(
                errors,
                var_name,
                var_pos,
                &Path::ObjectField(key, path),
                "Unknown field",
            );
        }
    } else {
        push_unification_error(
            errors,
            var_name,
            var_pos,
            path,
            &format!(r#"Expected "{}", found not an object"#, meta.name),
        );
    }
}

fn is_absent_or_null(v: Option<&InputValue>) -> bool {
    v.is_none_or(InputValue::is_null)
}

fn push_unification_error(
    errors: &mut Vec<RuleError>,
    var_name: &str,
    var_pos: &SourcePosition,
    path: &Path<'_>,
    message: &str,
) {
    errors.push(RuleError::new(
        RULE,
        &format!(r#"Variable "${var_name}" got invalid value. {path}{message}."#),
        &[*var_pos],
    ));
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Root => write!(f, ""),
            Path::ArrayElement(idx, prev) => write!(f, "{prev}In element #{idx}: "),
            Path::ObjectField(name, prev) => write!(f, r#"{prev}In field "{name}": "#),
        }
    }
}

/// Whether a literal is acceptable for the provided declared type.
///
/// Variable references are accepted unconditionally; their types are
/// checked by the allowed-position rule.
pub(crate) fn is_valid_literal_value(
    schema: &SchemaType,
    arg_type: &TypeType<'_>,
    arg_value: &InputValue,
) -> bool {
    match arg_type {
        TypeType::NonNull(inner) => {
            if arg_value.is_null() {
                false
            } else {
                is_valid_literal_value(schema, inner, arg_value)
            }
        }
        TypeType::List(inner) => match arg_value {
            InputValue::Null | InputValue::Variable(_) => true,
            InputValue::List(items) => items
                .iter()
                .all(|i| is_valid_literal_value(schema, inner, &i.item)),
            v => is_valid_literal_value(schema, inner, v),
        },
        TypeType::Concrete(t) => {
            if matches!(arg_value, InputValue::Null | InputValue::Variable(_)) {
                return true;
            }
            match t {
                MetaType::Scalar(sm) => (sm.parse_literal_fn)(arg_value).is_ok(),
                MetaType::Enum(em) => arg_value
                    .as_enum_value()
                    .is_some_and(|name| em.values.iter().any(|v| v.name == name)),
                MetaType::InputObject(iom) => {
                    let Some(obj) = arg_value.to_object_value() else {
                        return false;
                    };

                    let mut remaining = obj.keys().copied().collect::<HashSet<_>>();
                    for input_field in &iom.input_fields {
                        remaining.remove(input_field.name.as_str());
                        match obj.get(input_field.name.as_str()) {
                            Some(v) => {
                                let field_type = schema.make_type(&input_field.arg_type);
                                if !is_valid_literal_value(schema, &field_type, v) {
                                    return false;
                                }
                            }
                            None => {
                                if input_field.arg_type.is_non_null()
                                    && input_field.default_value.is_none()
                                {
                                    return false;
                                }
                            }
                        }
                    }
                    remaining.is_empty()
                }
                _ => false,
            }
        }
    }
}
