//! Types used to describe a GraphQL schema.

use std::{
    any::TypeId,
    fmt,
};

use arcstr::ArcStr;

use crate::{
    ast::{InputValue, Type},
    executor::{FieldError, FieldValue, InterceptorFn, ResolveFn, TypeResolveFn},
    value::Value,
};

/// Whether an item is deprecated, with context.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum DeprecationStatus {
    /// The field/variant is not deprecated.
    #[default]
    Current,
    /// The field/variant is deprecated, with an optional reason.
    Deprecated(Option<ArcStr>),
}

impl DeprecationStatus {
    /// If this deprecation status indicates the item is deprecated.
    pub fn is_deprecated(&self) -> bool {
        match self {
            Self::Current => false,
            Self::Deprecated(_) => true,
        }
    }

    /// An optional reason for the deprecation, or none if [`Current`].
    ///
    /// [`Current`]: DeprecationStatus::Current
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Deprecated(rsn) => rsn.as_deref(),
        }
    }
}

/// Shortcut for an [`InputValue`] acceptance function.
///
/// Returns [`Ok`] if the value is parsable as the scalar in question.
pub type InputValueParseFn = fn(&InputValue) -> Result<(), FieldError>;

/// Shortcut for a scalar output serialization function.
pub type SerializeFn = fn(&Value) -> Result<Value, FieldError>;

/// Scalar type metadata.
pub struct ScalarMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    pub(crate) parse_input_fn: InputValueParseFn,
    pub(crate) parse_literal_fn: InputValueParseFn,
    pub(crate) serialize_fn: SerializeFn,
}

/// Object type metadata.
pub struct ObjectMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<Field>,
    #[doc(hidden)]
    pub interface_names: Vec<ArcStr>,
    pub(crate) source_type: Option<TypeId>,
}

/// Enum type metadata.
pub struct EnumMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub values: Vec<EnumValue>,
}

/// Interface type metadata.
pub struct InterfaceMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<Field>,
    #[doc(hidden)]
    pub interface_names: Vec<ArcStr>,
    /// Concrete implementers, wired when the schema is built.
    pub possible_type_names: Vec<ArcStr>,
    pub(crate) resolve_type_fn: Option<TypeResolveFn>,
}

/// Union type metadata.
pub struct UnionMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub of_type_names: Vec<ArcStr>,
    pub(crate) resolve_type_fn: Option<TypeResolveFn>,
}

/// Input object metadata.
pub struct InputObjectMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub input_fields: Vec<Argument>,
}

/// Generic type metadata.
///
/// List and non-`null` wrappers are not metadata; they live in [`Type`]
/// literals and are resolved against this table through
/// [`SchemaType::make_type`].
///
/// [`SchemaType::make_type`]: crate::schema::model::SchemaType::make_type
#[expect(missing_docs, reason = "self-explanatory")]
pub enum MetaType {
    Scalar(ScalarMeta),
    Object(ObjectMeta),
    Enum(EnumMeta),
    Interface(InterfaceMeta),
    Union(UnionMeta),
    InputObject(InputObjectMeta),
}

/// Metadata for a field.
pub struct Field {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub arguments: Option<Vec<Argument>>,
    #[doc(hidden)]
    pub field_type: Type<'static>,
    #[doc(hidden)]
    pub deprecation_status: DeprecationStatus,
    pub(crate) resolver: Option<ResolveFn>,
    pub(crate) interceptors: Vec<InterceptorFn>,
}

impl Field {
    /// Creates a new [`Field`] of the provided return type, without a
    /// resolver.
    ///
    /// Fields without a resolver fall back to property lookup by name on the
    /// source value.
    pub fn new(name: impl Into<ArcStr>, field_type: Type<'static>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: None,
            field_type,
            deprecation_status: DeprecationStatus::Current,
            resolver: None,
            interceptors: Vec::new(),
        }
    }

    /// Sets the description of this [`Field`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an argument definition to this [`Field`].
    #[must_use]
    pub fn argument(mut self, arg: Argument) -> Self {
        self.arguments.get_or_insert_with(Vec::new).push(arg);
        self
    }

    /// Attaches the resolver invoked when this [`Field`] is selected.
    #[must_use]
    pub fn resolver(mut self, f: ResolveFn) -> Self {
        self.resolver = Some(f);
        self
    }

    /// Appends an interceptor to this [`Field`]'s chain.
    ///
    /// Interceptors run in attachment order before the resolver.
    #[must_use]
    pub fn interceptor(mut self, f: InterceptorFn) -> Self {
        self.interceptors.push(f);
        self
    }

    /// Marks this [`Field`] as deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }

    /// Returns true if the field is reserved by the introspection system.
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("__")
    }

    /// Looks up an argument definition by name.
    pub fn argument_by_name(&self, name: &str) -> Option<&Argument> {
        self.arguments
            .as_ref()
            .and_then(|args| args.iter().find(|a| a.name == name))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Metadata for an argument to a field, or for an input object field.
#[derive(Clone, Debug)]
pub struct Argument {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub arg_type: Type<'static>,
    #[doc(hidden)]
    pub default_value: Option<InputValue>,
}

impl Argument {
    /// Creates a new [`Argument`] of the provided type.
    pub fn new(name: impl Into<ArcStr>, arg_type: Type<'static>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arg_type,
            default_value: None,
        }
    }

    /// Sets the description of this [`Argument`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value applied when the argument is absent.
    #[must_use]
    pub fn default_value(mut self, default: InputValue) -> Self {
        self.default_value = Some(default);
        self
    }

    /// Returns true if the argument is reserved by the introspection system.
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// Metadata for a single value in an enum.
#[derive(Clone, Debug)]
pub struct EnumValue {
    /// The name of the enum value.
    ///
    /// This is the string literal representation of the enum in responses.
    pub name: ArcStr,
    /// The optional description of the enum value.
    ///
    /// Note: this is not the description of the enum itself; it's the
    /// description of this enum _value_.
    pub description: Option<ArcStr>,
    /// Whether the value is deprecated or not, with an optional reason.
    pub deprecation_status: DeprecationStatus,
    /// The internal value resolvers produce and receive for this name.
    pub value: Value,
}

impl EnumValue {
    /// Creates a new [`EnumValue`] whose internal value is its own name.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        let name = name.into();
        let value = Value::String(name.to_string());
        Self {
            name,
            description: None,
            deprecation_status: DeprecationStatus::Current,
            value,
        }
    }

    /// Creates a new [`EnumValue`] with a distinct internal value.
    pub fn with_value(name: impl Into<ArcStr>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation_status: DeprecationStatus::Current,
            value: value.into(),
        }
    }

    /// Sets the description of this [`EnumValue`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks this [`EnumValue`] as deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }
}

impl ScalarMeta {
    /// Creates a new [`ScalarMeta`] with the provided acceptance and
    /// serialization hooks.
    ///
    /// Literals parse through the same acceptance hook unless
    /// [`parse_literal`] overrides it.
    ///
    /// [`parse_literal`]: ScalarMeta::parse_literal
    pub fn new(
        name: impl Into<ArcStr>,
        parse_input_fn: InputValueParseFn,
        serialize_fn: SerializeFn,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            parse_input_fn,
            parse_literal_fn: parse_input_fn,
            serialize_fn,
        }
    }

    /// Sets the description of this [`ScalarMeta`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Overrides the hook literals parse through.
    #[must_use]
    pub fn parse_literal(mut self, f: InputValueParseFn) -> Self {
        self.parse_literal_fn = f;
        self
    }

    /// Wraps this [`ScalarMeta`] into a [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Scalar(self)
    }
}

impl ObjectMeta {
    /// Creates a new [`ObjectMeta`] with the provided fields.
    pub fn new(name: impl Into<ArcStr>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            interface_names: Vec::new(),
            source_type: None,
        }
    }

    /// Sets the description of this [`ObjectMeta`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares the interfaces this object implements.
    #[must_use]
    pub fn interfaces(mut self, names: &[&str]) -> Self {
        self.interface_names = names.iter().map(|n| (*n).into()).collect();
        self
    }

    /// Declares the Rust type whose values resolve into this object.
    ///
    /// When an abstract type has no explicit type-resolution hook, the engine
    /// picks the implementer whose declared source type matches the runtime
    /// type of the resolved value.
    #[must_use]
    pub fn source_type<T: 'static>(mut self) -> Self {
        self.source_type = Some(TypeId::of::<T>());
        self
    }

    /// Wraps this [`ObjectMeta`] into a [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Object(self)
    }
}

impl EnumMeta {
    /// Creates a new [`EnumMeta`] with the provided values.
    pub fn new(name: impl Into<ArcStr>, values: Vec<EnumValue>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values,
        }
    }

    /// Sets the description of this [`EnumMeta`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Forward lookup: maps an enum name to its internal value.
    pub fn value_for_name(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.name == name).map(|v| &v.value)
    }

    /// Reverse lookup: maps an internal value back to its enum name.
    pub fn name_for_value(&self, value: &Value) -> Option<&ArcStr> {
        self.values.iter().find(|v| &v.value == value).map(|v| &v.name)
    }

    /// Wraps this [`EnumMeta`] into a [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Enum(self)
    }
}

impl InterfaceMeta {
    /// Creates a new [`InterfaceMeta`] with the provided fields.
    ///
    /// The possible-types set is populated when the schema is built.
    pub fn new(name: impl Into<ArcStr>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            interface_names: Vec::new(),
            possible_type_names: Vec::new(),
            resolve_type_fn: None,
        }
    }

    /// Sets the description of this [`InterfaceMeta`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares the interfaces this interface itself implements.
    #[must_use]
    pub fn interfaces(mut self, names: &[&str]) -> Self {
        self.interface_names = names.iter().map(|n| (*n).into()).collect();
        self
    }

    /// Attaches a hook resolving the concrete type of a runtime value.
    #[must_use]
    pub fn resolve_type(mut self, f: TypeResolveFn) -> Self {
        self.resolve_type_fn = Some(f);
        self
    }

    /// Wraps this [`InterfaceMeta`] into a [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Interface(self)
    }
}

impl UnionMeta {
    /// Creates a new [`UnionMeta`] over the provided member type names.
    pub fn new(name: impl Into<ArcStr>, of_type_names: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            of_type_names: of_type_names.iter().map(|n| (*n).into()).collect(),
            resolve_type_fn: None,
        }
    }

    /// Sets the description of this [`UnionMeta`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a hook resolving the concrete type of a runtime value.
    #[must_use]
    pub fn resolve_type(mut self, f: TypeResolveFn) -> Self {
        self.resolve_type_fn = Some(f);
        self
    }

    /// Wraps this [`UnionMeta`] into a [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Union(self)
    }
}

impl InputObjectMeta {
    /// Creates a new [`InputObjectMeta`] with the provided input fields.
    pub fn new(name: impl Into<ArcStr>, input_fields: Vec<Argument>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_fields,
        }
    }

    /// Sets the description of this [`InputObjectMeta`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`InputObjectMeta`] into a [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::InputObject(self)
    }
}

impl MetaType {
    /// Accesses the name of the type.
    pub fn name(&self) -> &ArcStr {
        match self {
            Self::Scalar(ScalarMeta { name, .. })
            | Self::Object(ObjectMeta { name, .. })
            | Self::Enum(EnumMeta { name, .. })
            | Self::Interface(InterfaceMeta { name, .. })
            | Self::Union(UnionMeta { name, .. })
            | Self::InputObject(InputObjectMeta { name, .. }) => name,
        }
    }

    /// Accesses the description of the type, if any.
    pub fn description(&self) -> Option<&ArcStr> {
        match self {
            Self::Scalar(ScalarMeta { description, .. })
            | Self::Object(ObjectMeta { description, .. })
            | Self::Enum(EnumMeta { description, .. })
            | Self::Interface(InterfaceMeta { description, .. })
            | Self::Union(UnionMeta { description, .. })
            | Self::InputObject(InputObjectMeta { description, .. }) => description.as_ref(),
        }
    }

    /// Accesses a field's metadata given its name.
    ///
    /// Only objects and interfaces have fields. This method always returns
    /// [`None`] for other types.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        match self {
            Self::Object(ObjectMeta { fields, .. })
            | Self::Interface(InterfaceMeta { fields, .. }) => {
                fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    /// Accesses an input field's metadata given its name.
    ///
    /// Only input objects have input fields. This method always returns
    /// [`None`] for other types.
    pub fn input_field_by_name(&self, name: &str) -> Option<&Argument> {
        match self {
            Self::InputObject(InputObjectMeta { input_fields, .. }) => {
                input_fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    /// Constructs a non-`null` [`Type`] literal naming this type.
    pub fn as_type(&self) -> Type<'static> {
        Type::NonNullNamed(self.name().to_string().into())
    }

    /// Returns true if the type is a composite type.
    ///
    /// Objects, interfaces, and unions are composite.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Interface(_) | Self::Union(_))
    }

    /// Returns true if the type can occur in leaf positions in queries.
    ///
    /// Only enums and scalars are leaf types.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Enum(_) | Self::Scalar(_))
    }

    /// Returns true if the type is abstract.
    ///
    /// Only interfaces and unions are abstract types.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    /// Returns true if the type can be used in input positions, e.g.
    /// arguments or variables.
    ///
    /// Only scalars, enums, and input objects are input types.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    /// Resolves the concrete type name for a runtime `value` through this
    /// abstract type's resolution hook, if one is attached.
    pub(crate) fn resolve_type_hook(&self, value: &FieldValue) -> Option<ArcStr> {
        match self {
            Self::Interface(InterfaceMeta { resolve_type_fn, .. })
            | Self::Union(UnionMeta { resolve_type_fn, .. }) => {
                resolve_type_fn.as_ref().and_then(|f| f(value))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Scalar(..) => "Scalar",
            Self::Object(..) => "Object",
            Self::Enum(..) => "Enum",
            Self::Interface(..) => "Interface",
            Self::Union(..) => "Union",
            Self::InputObject(..) => "InputObject",
        };
        write!(f, "{kind}({:?})", self.name())
    }
}
