//! Coerced field arguments.

use indexmap::IndexMap;

use crate::{
    ast::{Arguments as AstArguments, InputValue, Type},
    executor::{FieldError, FieldResult, Variables},
    parser::Spanning,
    schema::{
        meta::{Argument, MetaType},
        model::SchemaType,
    },
    value::Value,
};

/// The arguments a resolver receives: declared defaults applied, variables
/// substituted, and enum literals mapped to their internal values.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    args: IndexMap<String, InputValue>,
}

impl Arguments {
    /// Creates an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    #[doc(hidden)]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, InputValue)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    /// Gets the value of the provided argument, if present.
    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.args.get(name)
    }

    /// Gets the provided argument as an integer.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(InputValue::as_int_value)
    }

    /// Gets the provided argument as a string slice.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(InputValue::as_string_value)
    }

    /// Gets the provided argument as a boolean.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(InputValue::as_boolean_value)
    }

    /// Iterates over all argument name/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of arguments present.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether no arguments are present.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Builds the [`Arguments`] map a resolver sees for one field invocation.
pub(crate) fn build_arguments(
    schema: &SchemaType,
    meta_args: Option<&[Argument]>,
    ast_args: Option<&Spanning<AstArguments<'_>>>,
    variables: &Variables,
) -> FieldResult<Arguments> {
    let mut args = IndexMap::new();

    if let Some(ast_args) = ast_args {
        for (name, value) in ast_args.item.iter() {
            if let Some(value) = value.item.clone().into_const(variables) {
                args.insert(name.item.to_string(), value);
            }
        }
    }

    if let Some(meta_args) = meta_args {
        for meta_arg in meta_args {
            // An explicit `null` does not fall back to the default; only a
            // truly absent argument does.
            if !args.contains_key(meta_arg.name.as_str()) {
                if let Some(default) = &meta_arg.default_value {
                    args.insert(meta_arg.name.to_string(), default.clone());
                    continue;
                }
            }
            if let Some(value) = args.swap_remove(meta_arg.name.as_str()) {
                let coerced = coerce_input(schema, &meta_arg.arg_type, value)?;
                args.insert(meta_arg.name.to_string(), coerced);
            }
        }
    }

    Ok(Arguments { args })
}

/// Recursively shapes a constant input value against its declared type:
/// single values promote to one-element lists, enum names map through the
/// enum's forward map, and input-object field defaults apply.
fn coerce_input(
    schema: &SchemaType,
    ty: &Type<'_>,
    value: InputValue,
) -> FieldResult<InputValue> {
    if value.is_null() {
        return Ok(value);
    }

    match ty {
        Type::NonNullNamed(name) | Type::Named(name) => {
            let Some(meta) = schema.concrete_type_by_name(name) else {
                return Ok(value);
            };
            match meta {
                MetaType::Enum(enum_meta) => {
                    let enum_name = match &value {
                        InputValue::Enum(n) | InputValue::String(n) => n.as_str(),
                        _ => {
                            return Err(FieldError::from(format!(
                                "invalid value for enum {:?}",
                                enum_meta.name.as_str(),
                            )));
                        }
                    };
                    enum_meta
                        .value_for_name(enum_name)
                        .map(value_to_input)
                        .ok_or_else(|| {
                            FieldError::from(format!(
                                "invalid value {:?} for enum {:?}",
                                enum_name,
                                enum_meta.name.as_str(),
                            ))
                        })
                }
                MetaType::InputObject(input_meta) => {
                    let InputValue::Object(fields) = value else {
                        return Err(FieldError::from(format!(
                            "expected input object {:?}",
                            input_meta.name.as_str(),
                        )));
                    };

                    let mut coerced: Vec<(Spanning<String>, Spanning<InputValue>)> = fields
                        .into_iter()
                        .map(|(k, v)| {
                            let field_type = input_meta
                                .input_fields
                                .iter()
                                .find(|f| f.name == k.item.as_str())
                                .map(|f| &f.arg_type);
                            let item = match field_type {
                                Some(t) => coerce_input(schema, t, v.item)?,
                                None => v.item,
                            };
                            Ok((k, Spanning::unlocated(item)))
                        })
                        .collect::<FieldResult<_>>()?;

                    for input_field in &input_meta.input_fields {
                        let present = coerced
                            .iter()
                            .any(|(k, _)| k.item == input_field.name.as_str());
                        if !present {
                            if let Some(default) = &input_field.default_value {
                                coerced.push((
                                    Spanning::unlocated(input_field.name.to_string()),
                                    Spanning::unlocated(default.clone()),
                                ));
                            }
                        }
                    }

                    Ok(InputValue::Object(coerced))
                }
                _ => Ok(value),
            }
        }
        Type::NonNullList(inner) | Type::List(inner) => match value {
            InputValue::List(items) => Ok(InputValue::List(
                items
                    .into_iter()
                    .map(|v| {
                        let span = v.span;
                        coerce_input(schema, inner, v.item)
                            .map(|item| Spanning::new(span, item))
                    })
                    .collect::<FieldResult<_>>()?,
            )),
            // A single value is promoted to a one-element list.
            single => Ok(InputValue::list(vec![coerce_input(
                schema, inner, single,
            )?])),
        },
    }
}

pub(crate) fn value_to_input(value: &Value) -> InputValue {
    match value {
        Value::Null => InputValue::Null,
        Value::Int(i) => InputValue::Int(*i),
        Value::Float(f) => InputValue::Float(*f),
        Value::String(s) => InputValue::String(s.clone()),
        Value::Boolean(b) => InputValue::Boolean(*b),
        Value::List(l) => InputValue::list(l.iter().map(value_to_input).collect()),
        Value::Object(o) => InputValue::Object(
            o.iter()
                .map(|(k, v)| {
                    (
                        Spanning::unlocated(k.clone()),
                        Spanning::unlocated(value_to_input(v)),
                    )
                })
                .collect(),
        ),
    }
}
