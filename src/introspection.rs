//! Introspection meta types and their resolvers.
//!
//! `__Schema`, `__Type`, and friends are ordinary dynamic object types
//! registered into every schema's type table at build time; the executor
//! seeds `__schema`/`__type` selections with sources from this module and
//! resolution proceeds through the normal dispatch path.

use std::sync::{Arc, OnceLock};

use arcstr::ArcStr;
use fnv::FnvHashMap;

use crate::{
    ast::{InputValue, Type},
    executor::{FieldValue, ResolveInfo, Resolved},
    schema::{
        meta::{Argument, EnumMeta, EnumValue, Field, MetaType, ObjectMeta},
        model::{DirectiveLocation, SchemaType},
    },
    value::Value,
};

struct SchemaRef(Arc<SchemaType>);

struct TypeRef {
    schema: Arc<SchemaType>,
    ty: Type<'static>,
}

struct FieldRef {
    schema: Arc<SchemaType>,
    type_name: ArcStr,
    field_name: ArcStr,
}

struct InputValueRef {
    schema: Arc<SchemaType>,
    arg: Argument,
}

struct EnumValueRef(EnumValue);

struct DirectiveRef {
    schema: Arc<SchemaType>,
    name: ArcStr,
}

/// The source value the executor seeds a `__schema` selection with.
pub(crate) fn schema_source(schema: &Arc<SchemaType>) -> FieldValue {
    FieldValue::any(SchemaRef(schema.clone()))
}

/// The source value the executor seeds a `__type(name:)` selection with.
pub(crate) fn type_source(schema: &Arc<SchemaType>, name: &str) -> FieldValue {
    if schema.concrete_type_by_name(name).is_some() {
        FieldValue::any(TypeRef {
            schema: schema.clone(),
            ty: Type::Named(name.to_string().into()),
        })
    } else {
        FieldValue::Null
    }
}

/// Synthetic field metadata for the introspection entry points, valid on any
/// composite parent.
pub(crate) fn synthetic_field(name: &str) -> Option<&'static Field> {
    match name {
        "__typename" => Some(typename_meta_field()),
        "__schema" => Some(schema_meta_field()),
        "__type" => Some(type_meta_field()),
        _ => None,
    }
}

pub(crate) fn typename_meta_field() -> &'static Field {
    static FIELD: OnceLock<Field> = OnceLock::new();
    FIELD.get_or_init(|| Field::new("__typename", Type::NonNullNamed("String".into())))
}

pub(crate) fn schema_meta_field() -> &'static Field {
    static FIELD: OnceLock<Field> = OnceLock::new();
    FIELD.get_or_init(|| Field::new("__schema", Type::NonNullNamed("__Schema".into())))
}

pub(crate) fn type_meta_field() -> &'static Field {
    static FIELD: OnceLock<Field> = OnceLock::new();
    FIELD.get_or_init(|| {
        Field::new("__type", Type::Named("__Type".into()))
            .argument(Argument::new("name", Type::NonNullNamed("String".into())))
    })
}

fn type_ref_value(schema: &Arc<SchemaType>, ty: Type<'static>) -> FieldValue {
    FieldValue::any(TypeRef {
        schema: schema.clone(),
        ty,
    })
}

fn named_type_ref(schema: &Arc<SchemaType>, name: &str) -> FieldValue {
    type_ref_value(schema, Type::Named(name.to_string().into()))
}

fn resolver(
    f: impl Fn(&ResolveInfo) -> Result<FieldValue, crate::executor::FieldError>
        + Send
        + Sync
        + 'static,
) -> crate::executor::ResolveFn {
    Arc::new(move |info| Resolved::Value(f(&info)))
}

fn source_err(expected: &str) -> crate::executor::FieldError {
    format!("introspection resolver received an unexpected source, expected {expected}").into()
}

/// Registers the introspection meta types into a schema's type table.
pub(crate) fn install_meta_types(table: &mut FnvHashMap<String, MetaType>) {
    for meta in [
        schema_meta(),
        type_meta(),
        field_meta(),
        input_value_meta(),
        enum_value_meta(),
        directive_meta(),
        type_kind_meta(),
        directive_location_meta(),
    ] {
        table.insert(meta.name().to_string(), meta);
    }
}

fn schema_meta() -> MetaType {
    ObjectMeta::new(
        "__Schema",
        vec![
            Field::new("types", Type::NonNullList(Box::new(Type::NonNullNamed("__Type".into()))))
                .resolver(resolver(|info| {
                    let SchemaRef(schema) =
                        info.source.downcast_ref().ok_or_else(|| source_err("__Schema"))?;
                    Ok(FieldValue::List(
                        schema
                            .type_list()
                            .into_iter()
                            .map(|t| named_type_ref(schema, t.name()))
                            .collect(),
                    ))
                })),
            Field::new("queryType", Type::NonNullNamed("__Type".into())).resolver(resolver(
                |info| {
                    let SchemaRef(schema) =
                        info.source.downcast_ref().ok_or_else(|| source_err("__Schema"))?;
                    Ok(named_type_ref(schema, schema.query_type().name()))
                },
            )),
            Field::new("mutationType", Type::Named("__Type".into())).resolver(resolver(|info| {
                let SchemaRef(schema) =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Schema"))?;
                Ok(schema
                    .mutation_type()
                    .map_or(FieldValue::Null, |t| named_type_ref(schema, t.name())))
            })),
            Field::new("subscriptionType", Type::Named("__Type".into())).resolver(resolver(
                |info| {
                    let SchemaRef(schema) =
                        info.source.downcast_ref().ok_or_else(|| source_err("__Schema"))?;
                    Ok(schema
                        .subscription_type()
                        .map_or(FieldValue::Null, |t| named_type_ref(schema, t.name())))
                },
            )),
            Field::new(
                "directives",
                Type::NonNullList(Box::new(Type::NonNullNamed("__Directive".into()))),
            )
            .resolver(resolver(|info| {
                let SchemaRef(schema) =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Schema"))?;
                Ok(FieldValue::List(
                    schema
                        .directive_list()
                        .into_iter()
                        .map(|d| {
                            FieldValue::any(DirectiveRef {
                                schema: schema.clone(),
                                name: d.name.clone(),
                            })
                        })
                        .collect(),
                ))
            })),
        ],
    )
    .into_meta()
}

fn type_meta() -> MetaType {
    ObjectMeta::new(
        "__Type",
        vec![
            Field::new("kind", Type::NonNullNamed("__TypeKind".into())).resolver(resolver(
                |info| {
                    let type_ref: &TypeRef =
                        info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                    let kind = match &type_ref.ty {
                        Type::NonNullNamed(..) | Type::NonNullList(..) => "NON_NULL",
                        Type::List(..) => "LIST",
                        Type::Named(name) => {
                            match type_ref.schema.concrete_type_by_name(name) {
                                Some(MetaType::Scalar(..)) => "SCALAR",
                                Some(MetaType::Object(..)) => "OBJECT",
                                Some(MetaType::Interface(..)) => "INTERFACE",
                                Some(MetaType::Union(..)) => "UNION",
                                Some(MetaType::Enum(..)) => "ENUM",
                                Some(MetaType::InputObject(..)) => "INPUT_OBJECT",
                                None => return Err(format!("unknown type {name:?}").into()),
                            }
                        }
                    };
                    Ok(FieldValue::Value(Value::String(kind.into())))
                },
            )),
            Field::new("name", Type::Named("String".into())).resolver(resolver(|info| {
                let type_ref: &TypeRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                Ok(match &type_ref.ty {
                    Type::Named(name) => FieldValue::Value(Value::String(name.to_string())),
                    _ => FieldValue::Null,
                })
            })),
            Field::new("description", Type::Named("String".into())).resolver(resolver(|info| {
                let type_ref: &TypeRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                Ok(match &type_ref.ty {
                    Type::Named(name) => type_ref
                        .schema
                        .concrete_type_by_name(name)
                        .and_then(MetaType::description)
                        .map_or(FieldValue::Null, |d| {
                            FieldValue::Value(Value::String(d.to_string()))
                        }),
                    _ => FieldValue::Null,
                })
            })),
            Field::new("fields", Type::List(Box::new(Type::NonNullNamed("__Field".into()))))
                .argument(
                    Argument::new("includeDeprecated", Type::Named("Boolean".into()))
                        .default_value(InputValue::boolean(false)),
                )
                .resolver(resolver(|info| {
                    let type_ref: &TypeRef =
                        info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                    let include_deprecated = info.args.get_bool("includeDeprecated").unwrap_or(false);

                    let Type::Named(name) = &type_ref.ty else {
                        return Ok(FieldValue::Null);
                    };
                    let meta = type_ref
                        .schema
                        .concrete_type_by_name(name)
                        .ok_or_else(|| source_err("__Type"))?;
                    let fields = match meta {
                        MetaType::Object(o) => &o.fields,
                        MetaType::Interface(i) => &i.fields,
                        _ => return Ok(FieldValue::Null),
                    };
                    Ok(FieldValue::List(
                        fields
                            .iter()
                            .filter(|f| {
                                include_deprecated || !f.deprecation_status.is_deprecated()
                            })
                            .filter(|f| !f.is_builtin())
                            .map(|f| {
                                FieldValue::any(FieldRef {
                                    schema: type_ref.schema.clone(),
                                    type_name: meta.name().clone(),
                                    field_name: f.name.clone(),
                                })
                            })
                            .collect(),
                    ))
                })),
            Field::new(
                "interfaces",
                Type::List(Box::new(Type::NonNullNamed("__Type".into()))),
            )
            .resolver(resolver(|info| {
                let type_ref: &TypeRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                let Type::Named(name) = &type_ref.ty else {
                    return Ok(FieldValue::Null);
                };
                let interface_names = match type_ref.schema.concrete_type_by_name(name) {
                    Some(MetaType::Object(o)) => &o.interface_names,
                    Some(MetaType::Interface(i)) => &i.interface_names,
                    _ => return Ok(FieldValue::Null),
                };
                Ok(FieldValue::List(
                    interface_names
                        .iter()
                        .map(|n| named_type_ref(&type_ref.schema, n))
                        .collect(),
                ))
            })),
            Field::new(
                "possibleTypes",
                Type::List(Box::new(Type::NonNullNamed("__Type".into()))),
            )
            .resolver(resolver(|info| {
                let type_ref: &TypeRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                let Type::Named(name) = &type_ref.ty else {
                    return Ok(FieldValue::Null);
                };
                match type_ref.schema.concrete_type_by_name(name) {
                    Some(meta @ (MetaType::Interface(..) | MetaType::Union(..))) => {
                        Ok(FieldValue::List(
                            type_ref
                                .schema
                                .possible_types(meta)
                                .into_iter()
                                .map(|t| named_type_ref(&type_ref.schema, t.name()))
                                .collect(),
                        ))
                    }
                    _ => Ok(FieldValue::Null),
                }
            })),
            Field::new(
                "enumValues",
                Type::List(Box::new(Type::NonNullNamed("__EnumValue".into()))),
            )
            .argument(
                Argument::new("includeDeprecated", Type::Named("Boolean".into()))
                    .default_value(InputValue::boolean(false)),
            )
            .resolver(resolver(|info| {
                let type_ref: &TypeRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                let include_deprecated = info.args.get_bool("includeDeprecated").unwrap_or(false);
                let Type::Named(name) = &type_ref.ty else {
                    return Ok(FieldValue::Null);
                };
                match type_ref.schema.concrete_type_by_name(name) {
                    Some(MetaType::Enum(e)) => Ok(FieldValue::List(
                        e.values
                            .iter()
                            .filter(|v| {
                                include_deprecated || !v.deprecation_status.is_deprecated()
                            })
                            .map(|v| FieldValue::any(EnumValueRef(v.clone())))
                            .collect(),
                    )),
                    _ => Ok(FieldValue::Null),
                }
            })),
            Field::new(
                "inputFields",
                Type::List(Box::new(Type::NonNullNamed("__InputValue".into()))),
            )
            .resolver(resolver(|info| {
                let type_ref: &TypeRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                let Type::Named(name) = &type_ref.ty else {
                    return Ok(FieldValue::Null);
                };
                match type_ref.schema.concrete_type_by_name(name) {
                    Some(MetaType::InputObject(io)) => Ok(FieldValue::List(
                        io.input_fields
                            .iter()
                            .map(|arg| {
                                FieldValue::any(InputValueRef {
                                    schema: type_ref.schema.clone(),
                                    arg: arg.clone(),
                                })
                            })
                            .collect(),
                    )),
                    _ => Ok(FieldValue::Null),
                }
            })),
            Field::new("ofType", Type::Named("__Type".into())).resolver(resolver(|info| {
                let type_ref: &TypeRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Type"))?;
                Ok(match &type_ref.ty {
                    Type::Named(..) => FieldValue::Null,
                    Type::NonNullNamed(name) => {
                        type_ref_value(&type_ref.schema, Type::Named(name.clone()))
                    }
                    Type::NonNullList(inner) => {
                        type_ref_value(&type_ref.schema, Type::List(inner.clone()))
                    }
                    Type::List(inner) => type_ref_value(&type_ref.schema, (**inner).clone()),
                })
            })),
        ],
    )
    .into_meta()
}

fn field_meta() -> MetaType {
    ObjectMeta::new(
        "__Field",
        vec![
            Field::new("name", Type::NonNullNamed("String".into())).resolver(resolver(|info| {
                let field_ref: &FieldRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Field"))?;
                Ok(FieldValue::Value(Value::String(
                    field_ref.field_name.to_string(),
                )))
            })),
            Field::new("description", Type::Named("String".into())).resolver(resolver(|info| {
                let field = meta_field_of(&info.source)?;
                Ok(field
                    .1
                    .description
                    .as_ref()
                    .map_or(FieldValue::Null, |d| {
                        FieldValue::Value(Value::String(d.to_string()))
                    }))
            })),
            Field::new(
                "args",
                Type::NonNullList(Box::new(Type::NonNullNamed("__InputValue".into()))),
            )
            .resolver(resolver(|info| {
                let (field_ref, field) = meta_field_of(&info.source)?;
                Ok(FieldValue::List(
                    field
                        .arguments
                        .as_deref()
                        .unwrap_or_default()
                        .iter()
                        .map(|arg| {
                            FieldValue::any(InputValueRef {
                                schema: field_ref.schema.clone(),
                                arg: arg.clone(),
                            })
                        })
                        .collect(),
                ))
            })),
            Field::new("type", Type::NonNullNamed("__Type".into())).resolver(resolver(|info| {
                let (field_ref, field) = meta_field_of(&info.source)?;
                Ok(type_ref_value(&field_ref.schema, field.field_type.clone()))
            })),
            Field::new("isDeprecated", Type::NonNullNamed("Boolean".into())).resolver(resolver(
                |info| {
                    let (_, field) = meta_field_of(&info.source)?;
                    Ok(FieldValue::Value(Value::Boolean(
                        field.deprecation_status.is_deprecated(),
                    )))
                },
            )),
            Field::new("deprecationReason", Type::Named("String".into())).resolver(resolver(
                |info| {
                    let (_, field) = meta_field_of(&info.source)?;
                    Ok(field
                        .deprecation_status
                        .reason()
                        .map_or(FieldValue::Null, |r| {
                            FieldValue::Value(Value::String(r.into()))
                        }))
                },
            )),
        ],
    )
    .into_meta()
}

fn meta_field_of(
    source: &FieldValue,
) -> Result<(&FieldRef, &Field), crate::executor::FieldError> {
    let field_ref: &FieldRef = source.downcast_ref().ok_or_else(|| source_err("__Field"))?;
    let field = field_ref
        .schema
        .concrete_type_by_name(&field_ref.type_name)
        .and_then(|t| t.field_by_name(&field_ref.field_name))
        .ok_or_else(|| source_err("__Field"))?;
    Ok((field_ref, field))
}

fn input_value_meta() -> MetaType {
    ObjectMeta::new(
        "__InputValue",
        vec![
            Field::new("name", Type::NonNullNamed("String".into())).resolver(resolver(|info| {
                let input_ref: &InputValueRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__InputValue"))?;
                Ok(FieldValue::Value(Value::String(input_ref.arg.name.to_string())))
            })),
            Field::new("description", Type::Named("String".into())).resolver(resolver(|info| {
                let input_ref: &InputValueRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__InputValue"))?;
                Ok(input_ref.arg.description.as_ref().map_or(FieldValue::Null, |d| {
                    FieldValue::Value(Value::String(d.to_string()))
                }))
            })),
            Field::new("type", Type::NonNullNamed("__Type".into())).resolver(resolver(|info| {
                let input_ref: &InputValueRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__InputValue"))?;
                Ok(type_ref_value(&input_ref.schema, input_ref.arg.arg_type.clone()))
            })),
            Field::new("defaultValue", Type::Named("String".into())).resolver(resolver(|info| {
                let input_ref: &InputValueRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__InputValue"))?;
                Ok(input_ref
                    .arg
                    .default_value
                    .as_ref()
                    .map_or(FieldValue::Null, |v| {
                        FieldValue::Value(Value::String(v.to_string()))
                    }))
            })),
        ],
    )
    .into_meta()
}

fn enum_value_meta() -> MetaType {
    ObjectMeta::new(
        "__EnumValue",
        vec![
            Field::new("name", Type::NonNullNamed("String".into())).resolver(resolver(|info| {
                let EnumValueRef(v) =
                    info.source.downcast_ref().ok_or_else(|| source_err("__EnumValue"))?;
                Ok(FieldValue::Value(Value::String(v.name.to_string())))
            })),
            Field::new("description", Type::Named("String".into())).resolver(resolver(|info| {
                let EnumValueRef(v) =
                    info.source.downcast_ref().ok_or_else(|| source_err("__EnumValue"))?;
                Ok(v.description.as_ref().map_or(FieldValue::Null, |d| {
                    FieldValue::Value(Value::String(d.to_string()))
                }))
            })),
            Field::new("isDeprecated", Type::NonNullNamed("Boolean".into())).resolver(resolver(
                |info| {
                    let EnumValueRef(v) =
                        info.source.downcast_ref().ok_or_else(|| source_err("__EnumValue"))?;
                    Ok(FieldValue::Value(Value::Boolean(
                        v.deprecation_status.is_deprecated(),
                    )))
                },
            )),
            Field::new("deprecationReason", Type::Named("String".into())).resolver(resolver(
                |info| {
                    let EnumValueRef(v) =
                        info.source.downcast_ref().ok_or_else(|| source_err("__EnumValue"))?;
                    Ok(v.deprecation_status.reason().map_or(FieldValue::Null, |r| {
                        FieldValue::Value(Value::String(r.into()))
                    }))
                },
            )),
        ],
    )
    .into_meta()
}

fn directive_meta() -> MetaType {
    ObjectMeta::new(
        "__Directive",
        vec![
            Field::new("name", Type::NonNullNamed("String".into())).resolver(resolver(|info| {
                let directive_ref: &DirectiveRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Directive"))?;
                Ok(FieldValue::Value(Value::String(directive_ref.name.to_string())))
            })),
            Field::new("description", Type::Named("String".into())).resolver(resolver(|info| {
                let directive_ref: &DirectiveRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Directive"))?;
                Ok(directive_ref
                    .schema
                    .directive_by_name(&directive_ref.name)
                    .and_then(|d| d.description.as_ref())
                    .map_or(FieldValue::Null, |d| {
                        FieldValue::Value(Value::String(d.to_string()))
                    }))
            })),
            Field::new(
                "locations",
                Type::NonNullList(Box::new(Type::NonNullNamed("__DirectiveLocation".into()))),
            )
            .resolver(resolver(|info| {
                let directive_ref: &DirectiveRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Directive"))?;
                let directive = directive_ref
                    .schema
                    .directive_by_name(&directive_ref.name)
                    .ok_or_else(|| source_err("__Directive"))?;
                Ok(FieldValue::List(
                    directive
                        .locations
                        .iter()
                        .map(|l| FieldValue::Value(Value::String(location_name(*l).into())))
                        .collect(),
                ))
            })),
            Field::new(
                "args",
                Type::NonNullList(Box::new(Type::NonNullNamed("__InputValue".into()))),
            )
            .resolver(resolver(|info| {
                let directive_ref: &DirectiveRef =
                    info.source.downcast_ref().ok_or_else(|| source_err("__Directive"))?;
                let directive = directive_ref
                    .schema
                    .directive_by_name(&directive_ref.name)
                    .ok_or_else(|| source_err("__Directive"))?;
                Ok(FieldValue::List(
                    directive
                        .arguments
                        .iter()
                        .map(|arg| {
                            FieldValue::any(InputValueRef {
                                schema: directive_ref.schema.clone(),
                                arg: arg.clone(),
                            })
                        })
                        .collect(),
                ))
            })),
        ],
    )
    .into_meta()
}

fn location_name(location: DirectiveLocation) -> &'static str {
    match location {
        DirectiveLocation::Query => "QUERY",
        DirectiveLocation::Mutation => "MUTATION",
        DirectiveLocation::Subscription => "SUBSCRIPTION",
        DirectiveLocation::Field => "FIELD",
        DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
        DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
        DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
        DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
        DirectiveLocation::EnumValue => "ENUM_VALUE",
    }
}

fn type_kind_meta() -> MetaType {
    EnumMeta::new(
        "__TypeKind",
        [
            "SCALAR",
            "OBJECT",
            "INTERFACE",
            "UNION",
            "ENUM",
            "INPUT_OBJECT",
            "LIST",
            "NON_NULL",
        ]
        .into_iter()
        .map(EnumValue::new)
        .collect(),
    )
    .into_meta()
}

fn directive_location_meta() -> MetaType {
    EnumMeta::new(
        "__DirectiveLocation",
        [
            DirectiveLocation::Query,
            DirectiveLocation::Mutation,
            DirectiveLocation::Subscription,
            DirectiveLocation::Field,
            DirectiveLocation::FragmentDefinition,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
            DirectiveLocation::FieldDefinition,
            DirectiveLocation::EnumValue,
        ]
        .into_iter()
        .map(|l| EnumValue::new(location_name(l)))
        .collect(),
    )
    .into_meta()
}
