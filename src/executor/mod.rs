//! Resolve a validated document to response values.

use std::{
    any::Any,
    cmp::Ordering,
    collections::HashMap,
    fmt::{self, Debug, Display},
    panic::AssertUnwindSafe,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
};

use arcstr::ArcStr;
use futures::{
    FutureExt as _,
    future::BoxFuture,
    stream::{FuturesOrdered, StreamExt as _},
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::{
    GraphQLError,
    ast::{Definition, Document, Fragment, InputValue, Operation, OperationType, Selection},
    introspection,
    parser::{SourcePosition, Spanning},
    schema::{
        meta::{EnumMeta, Field as MetaField, MetaType, ObjectMeta, ScalarMeta},
        model::{SchemaType, TypeType},
    },
    value::{Object, Value},
};

pub(crate) mod arguments;
pub(crate) mod flatten;

pub use self::arguments::Arguments;
use self::flatten::{FlatField, flatten_selection_set};

/// The map of variables used for substitution during query execution.
pub type Variables = HashMap<String, InputValue>;

/// The result of resolving the value of a field of type `T`.
pub type FieldResult<T> = Result<T, FieldError>;

/// The result of resolving an unspecified field.
pub type ExecutionResult = Result<Value, FieldError>;

/// A dynamic value flowing between resolvers.
///
/// Resolvers receive the parent field's [`FieldValue`] as their source and
/// return the one handed to their children.
#[derive(Clone)]
pub enum FieldValue {
    /// The absence of a value.
    Null,
    /// Plain response data; scalars serialize straight out of it, and
    /// resolver-less fields are looked up in it by name.
    Value(Value),
    /// A sequence resolved element by element against the inner list type.
    List(Vec<FieldValue>),
    /// A shared host object, downcast by the resolvers that know it.
    Any(Arc<dyn Any + Send + Sync>),
    /// A value paired with the name of the concrete object type it satisfies,
    /// used to steer interface and union dispatch.
    Typed(ArcStr, Box<FieldValue>),
}

impl FieldValue {
    /// Constructs a [`FieldValue::Any`] from the provided host object.
    pub fn any<T: Any + Send + Sync>(value: T) -> Self {
        Self::Any(Arc::new(value))
    }

    /// Constructs a [`FieldValue::Typed`] naming the concrete object type of
    /// the provided value.
    pub fn typed(type_name: impl Into<ArcStr>, value: FieldValue) -> Self {
        Self::Typed(type_name.into(), Box::new(value))
    }

    /// Does this value represent `null`?
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Value(v) => v.is_null(),
            _ => false,
        }
    }

    /// Downcasts a [`FieldValue::Any`] source to a concrete host type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Any(any) => any.downcast_ref(),
            Self::Typed(_, inner) => inner.downcast_ref(),
            _ => None,
        }
    }
}

impl Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Value(v) => write!(f, "Value({v:?})"),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Any(..) => write!(f, "Any(..)"),
            Self::Typed(name, inner) => f.debug_tuple("Typed").field(name).field(inner).finish(),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

/// What a resolver hands back: a finished value, or a thunk the executor
/// drives once.
pub enum Resolved {
    /// An immediately available result.
    Value(FieldResult<FieldValue>),
    /// A lazily computed result; the executor awaits it exactly once.
    Thunk(BoxFuture<'static, FieldResult<FieldValue>>),
}

impl Resolved {
    /// Shortcut for an immediately available [`Ok`] value.
    pub fn ok(value: impl Into<FieldValue>) -> Self {
        Self::Value(Ok(value.into()))
    }

    /// Shortcut for an immediately available error.
    pub fn err(error: impl Into<FieldError>) -> Self {
        Self::Value(Err(error.into()))
    }
}

impl<T: Into<FieldValue>> From<T> for Resolved {
    fn from(v: T) -> Self {
        Self::Value(Ok(v.into()))
    }
}

/// Everything a resolver gets to see: the request context, the parent
/// source value, and the coerced arguments.
#[derive(Debug)]
pub struct ResolveInfo {
    /// The request-scoped context handle.
    pub context: RequestContext,
    /// The parent field's resolved source value.
    pub source: FieldValue,
    /// The field's arguments, with defaults applied and variables resolved.
    pub args: Arguments,
}

/// The uniform resolver shape: `(context, source, arguments)` in, value or
/// thunk out.
pub type ResolveFn = Arc<dyn Fn(ResolveInfo) -> Resolved + Send + Sync>;

/// A field interceptor; the chain runs in order before the resolver and may
/// rewrite arguments or veto the resolution with an error.
pub type InterceptorFn = Arc<dyn Fn(&mut ResolveInfo) -> FieldResult<()> + Send + Sync>;

/// Resolves the concrete object type name for an abstract type's runtime
/// value.
pub type TypeResolveFn = Arc<dyn Fn(&FieldValue) -> Option<ArcStr> + Send + Sync>;

/// A directive filter hook; returning `false` drops the annotated selection
/// during flattening.
pub type FilterFn = Arc<dyn Fn(&Arguments) -> bool + Send + Sync>;

/// Request-scoped context shared by every resolver of one execution.
///
/// Carries an optional user payload and the cancellation flag. Cloning is
/// cheap and shares the same request state.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

#[derive(Default)]
struct ContextInner {
    data: Option<Arc<dyn Any + Send + Sync>>,
    canceled: AtomicBool,
    cancel_reported: AtomicBool,
}

impl Debug for ContextInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextInner")
            .field("canceled", &self.canceled)
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context carrying the provided user payload.
    pub fn with_data<T: Any + Send + Sync>(data: T) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                data: Some(Arc::new(data)),
                canceled: AtomicBool::new(false),
                cancel_reported: AtomicBool::new(false),
            }),
        }
    }

    /// Downcasts the user payload, if one of the requested type is attached.
    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.data.as_ref().and_then(|d| d.downcast_ref())
    }

    /// Requests cancellation of the execution this context belongs to.
    ///
    /// Cancellation is not retroactive: fields that already completed stay
    /// in the response.
    pub fn cancel(&self) {
        self.inner.canceled.store(true, AtomicOrdering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(AtomicOrdering::SeqCst)
    }

    // The cancellation error is surfaced once per request.
    fn take_cancel_report(&self) -> bool {
        !self.inner.cancel_reported.swap(true, AtomicOrdering::SeqCst)
    }
}

/// Error type for errors that occur during field resolution.
///
/// Field errors are represented by a human-readable error message and an
/// optional [`Value`] of additional information.
///
/// They can be converted to from any type that implements [`Display`], which
/// makes error chaining with the `?` operator a breeze:
///
/// ```rust
/// # use arbor::FieldError;
/// fn get_string(data: Vec<u8>) -> Result<String, FieldError> {
///     let s = String::from_utf8(data)?;
///     Ok(s)
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    message: String,
    extensions: Value,
    // Null propagation bubbles through ancestors without re-reporting.
    propagated: bool,
}

impl<T: Display> From<T> for FieldError {
    fn from(e: T) -> Self {
        Self {
            message: e.to_string(),
            extensions: Value::Null,
            propagated: false,
        }
    }
}

impl FieldError {
    /// Constructs a new [`FieldError`] with additional data.
    ///
    /// The `extensions` value is serialized into the `"extensions"` field of
    /// the error object in the response. [`Value::Null`] attaches nothing.
    #[must_use]
    pub fn new<T: Display>(e: T, extensions: Value) -> Self {
        Self {
            message: e.to_string(),
            extensions,
            propagated: false,
        }
    }

    /// Returns the `"message"` field of this [`FieldError`].
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the `"extensions"` field of this [`FieldError`].
    #[must_use]
    pub fn extensions(&self) -> &Value {
        &self.extensions
    }

    fn propagated_null() -> Self {
        Self {
            message: String::new(),
            extensions: Value::Null,
            propagated: true,
        }
    }
}

/// Error type for errors that occur during query execution.
///
/// All execution errors contain the source position in the query of the
/// field that failed to resolve, as well as the response path leading to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError {
    location: SourcePosition,
    path: Vec<PathSegment>,
    error: FieldError,
}

/// One step of a response path: a field alias, or an index into a list.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum PathSegment {
    /// A field, keyed by its response alias.
    Field(String),
    /// A list element, keyed by its index.
    Index(usize),
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Field(name) => serializer.serialize_str(name),
            Self::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl<'de> serde::Deserialize<'de> for PathSegment {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SegmentVisitor;

        impl serde::de::Visitor<'_> for SegmentVisitor {
            type Value = PathSegment;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a field alias or a list index")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(PathSegment::Field(v.into()))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(PathSegment::Index(v as usize))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(PathSegment::Index(v as usize))
            }
        }

        deserializer.deserialize_any(SegmentVisitor)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Eq for ExecutionError {}

impl PartialOrd for ExecutionError {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExecutionError {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.location, &self.path, &self.error.message).cmp(&(
            &other.location,
            &other.path,
            &other.error.message,
        ))
    }
}

impl ExecutionError {
    /// Constructs a new execution error occurring at the beginning of the
    /// query.
    pub fn at_origin(error: FieldError) -> Self {
        Self {
            location: SourcePosition::new_origin(),
            path: Vec::new(),
            error,
        }
    }

    #[doc(hidden)]
    pub fn new(location: SourcePosition, path: Vec<PathSegment>, error: FieldError) -> Self {
        Self {
            location,
            path,
            error,
        }
    }

    /// The error message.
    pub fn error(&self) -> &FieldError {
        &self.error
    }

    /// The source location _in the query_ of the field that failed to
    /// resolve.
    pub fn location(&self) -> &SourcePosition {
        &self.location
    }

    /// The path of fields and list indices leading to the field that
    /// generated this error.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Prefixes this error's path, adopting it under the provided steps.
    #[must_use]
    pub fn prefixed(mut self, prefix: Vec<PathSegment>) -> Self {
        let mut path = prefix;
        path.append(&mut self.path);
        self.path = path;
        self
    }
}

impl Serialize for ExecutionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_extensions = !self.error.extensions.is_null();
        let mut map = serializer.serialize_map(Some(if has_extensions { 4 } else { 3 }))?;

        map.serialize_entry("message", self.error.message())?;
        map.serialize_entry(
            "locations",
            &[Location {
                line: self.location.line() + 1,
                column: self.location.column() + 1,
            }],
        )?;
        map.serialize_entry("path", &self.path)?;
        if has_extensions {
            map.serialize_entry("extensions", &self.error.extensions)?;
        }
        map.end()
    }
}

#[derive(serde::Serialize)]
struct Location {
    line: usize,
    column: usize,
}

#[derive(Clone)]
enum FieldPath<'a> {
    Root(SourcePosition),
    Field(&'a str, SourcePosition, Arc<FieldPath<'a>>),
    Index(usize, Arc<FieldPath<'a>>),
}

impl FieldPath<'_> {
    fn construct_path(&self, acc: &mut Vec<PathSegment>) {
        match self {
            Self::Root(_) => (),
            Self::Field(name, _, parent) => {
                parent.construct_path(acc);
                acc.push(PathSegment::Field((*name).into()));
            }
            Self::Index(index, parent) => {
                parent.construct_path(acc);
                acc.push(PathSegment::Index(*index));
            }
        }
    }

    fn location(&self) -> &SourcePosition {
        match self {
            Self::Root(pos) | Self::Field(_, pos, _) => pos,
            Self::Index(_, parent) => parent.location(),
        }
    }
}

/// Query execution engine.
///
/// The executor helps drive the query execution in a schema. It keeps track
/// of the fragment table, variables, the per-request error sink, and the
/// current field path. Each child selection derives its own executor from
/// its parent's; path state is never shared mutably across concurrently
/// running selections.
///
/// `'r` is the lifetime of the request-scoped state, `'a` the lifetime of
/// the parsed document.
#[derive(Clone)]
pub struct Executor<'r, 'a: 'r> {
    schema: &'r Arc<SchemaType>,
    fragments: &'r HashMap<&'a str, &'a Fragment<'a>>,
    variables: &'r Variables,
    context: &'r RequestContext,
    errors: &'r RwLock<Vec<ExecutionError>>,
    field_path: Arc<FieldPath<'a>>,
}

impl<'r, 'a: 'r> Executor<'r, 'a> {
    /// The currently executing schema.
    pub fn schema(&self) -> &SchemaType {
        self.schema
    }

    /// The variables the operation is bound to.
    pub fn variables(&self) -> &'r Variables {
        self.variables
    }

    /// Looks up a fragment definition by name.
    pub fn fragment_by_name(&self, name: &str) -> Option<&'a Fragment<'a>> {
        self.fragments.get(name).copied()
    }

    /// The current location of the executor.
    pub fn location(&self) -> &SourcePosition {
        self.field_path.location()
    }

    /// Adds an error at the current executor location.
    pub fn push_error(&self, error: FieldError) {
        self.push_error_at(error, *self.location());
    }

    /// Adds an error at a specific location.
    pub fn push_error_at(&self, error: FieldError, location: SourcePosition) {
        let mut path = Vec::new();
        self.field_path.construct_path(&mut path);

        let mut errors = self.errors.write().unwrap();
        errors.push(ExecutionError {
            location,
            path,
            error,
        });
    }

    fn field_sub_executor(
        &self,
        field_alias: &'a str,
        location: SourcePosition,
    ) -> Executor<'r, 'a> {
        Executor {
            field_path: Arc::new(FieldPath::Field(
                field_alias,
                location,
                Arc::clone(&self.field_path),
            )),
            ..self.clone()
        }
    }

    fn index_sub_executor(&self, index: usize) -> Executor<'r, 'a> {
        Executor {
            field_path: Arc::new(FieldPath::Index(index, Arc::clone(&self.field_path))),
            ..self.clone()
        }
    }

    /// Resolves a value of the provided wrapped type from `source`.
    ///
    /// Errors are returned, not pushed; the enclosing field or list element
    /// records them.
    fn resolve_value(
        &self,
        ty: TypeType<'r>,
        source: FieldValue,
        selections: Vec<&'a Selection<'a>>,
    ) -> BoxFuture<'r, ExecutionResult> {
        let this = self.clone();
        Box::pin(async move {
            match ty {
                // Nullability is enforced where the value is collected.
                TypeType::NonNull(inner) => this.resolve_value(*inner, source, selections).await,
                TypeType::List(inner) => this.resolve_list(*inner, source, selections).await,
                TypeType::Concrete(meta) => {
                    if source.is_null() {
                        return Ok(Value::Null);
                    }
                    match meta {
                        MetaType::Scalar(scalar) => resolve_scalar(scalar, &source),
                        MetaType::Enum(enum_meta) => resolve_enum(enum_meta, &source),
                        MetaType::Object(object) => {
                            this.resolve_object(meta, object, source, &selections, false).await
                        }
                        MetaType::Interface(..) | MetaType::Union(..) => {
                            let concrete = this.concrete_object_for(meta, &source)?;
                            let MetaType::Object(object) = concrete else {
                                unreachable!("possible types are objects");
                            };
                            this.resolve_object(concrete, object, source, &selections, false)
                                .await
                        }
                        MetaType::InputObject(..) => {
                            Err("input object used in output position".into())
                        }
                    }
                }
            }
        })
    }

    async fn resolve_list(
        &self,
        inner: TypeType<'r>,
        source: FieldValue,
        selections: Vec<&'a Selection<'a>>,
    ) -> ExecutionResult {
        let elements = match source {
            FieldValue::Null => return Ok(Value::Null),
            FieldValue::List(l) => l,
            FieldValue::Value(Value::Null) => return Ok(Value::Null),
            FieldValue::Value(Value::List(l)) => {
                l.into_iter().map(FieldValue::Value).collect()
            }
            _ => return Err("expected a list value".into()),
        };

        let element_non_null = inner.is_non_null();

        let mut futures = FuturesOrdered::new();
        for (index, element) in elements.into_iter().enumerate() {
            let sub = self.index_sub_executor(index);
            let inner = inner.clone();
            let selections = selections.clone();
            futures.push_back(async move {
                (sub.clone(), sub.resolve_value(inner, element, selections).await)
            });
        }

        let mut values = Vec::with_capacity(futures.len());
        while let Some((sub, result)) = futures.next().await {
            match result {
                Ok(v) if element_non_null && v.is_null() => {
                    sub.push_error("cannot return null for non-nullable list element".into());
                    return Err(FieldError::propagated_null());
                }
                Ok(v) => values.push(v),
                Err(e) => {
                    if !e.propagated {
                        sub.push_error(e);
                    }
                    if element_non_null {
                        return Err(FieldError::propagated_null());
                    }
                    values.push(Value::Null);
                }
            }
        }

        Ok(Value::List(values))
    }

    /// Resolves the concrete object type an abstract `meta` dispatches to
    /// for the runtime `source`.
    fn concrete_object_for(
        &self,
        meta: &'r MetaType,
        source: &FieldValue,
    ) -> FieldResult<&'r MetaType> {
        let resolved_name = meta.resolve_type_hook(source).or_else(|| {
            if let FieldValue::Typed(name, ..) = source {
                Some(name.clone())
            } else {
                None
            }
        });

        let possible = self.schema.possible_types(meta);

        if let Some(name) = resolved_name {
            let concrete = possible
                .iter()
                .find(|t| *t.name() == name)
                .copied()
                .ok_or_else(|| {
                    FieldError::from(format!(
                        "runtime type {:?} is not a possible type of {:?}",
                        name.as_str(),
                        meta.name().as_str(),
                    ))
                })?;
            return Ok(concrete);
        }

        // No hook: match the runtime Rust type against the implementers'
        // declared source types.
        if let FieldValue::Any(any) = source {
            let type_id = (**any).type_id();
            if let Some(concrete) = possible.iter().find(|t| {
                matches!(t, MetaType::Object(ObjectMeta { source_type, .. })
                    if *source_type == Some(type_id))
            }) {
                return Ok(concrete);
            }
        }

        Err(format!(
            "could not resolve the concrete type of abstract type {:?}",
            meta.name().as_str(),
        )
        .into())
    }

    /// Resolves an object's selection set, running the flattened selections
    /// concurrently unless `serial` is set.
    async fn resolve_object(
        &self,
        meta: &'r MetaType,
        object: &'r ObjectMeta,
        source: FieldValue,
        selections: &[&'a Selection<'a>],
        serial: bool,
    ) -> ExecutionResult {
        let source = match source {
            FieldValue::Typed(_, inner) => *inner,
            other => other,
        };

        let flattened = flatten_selection_set(
            self.schema,
            self.fragments,
            self.variables,
            object.name.as_str(),
            selections,
        )?;

        let mut result = Object::with_capacity(flattened.len());
        let mut futures = FuturesOrdered::new();

        for field in flattened {
            // A canceled context stops further dispatches; whatever already
            // completed stays in the response.
            if self.context.is_canceled() {
                if self.context.take_cancel_report() {
                    self.push_error_at("execution canceled".into(), field.position);
                }
                break;
            }

            if field.name == "__typename" {
                result.add_field(field.alias, Value::String(object.name.to_string()));
                continue;
            }

            let fut = self.resolve_flat_field(meta, object, &source, field);

            if serial {
                let (alias, value) = fut.await;
                match value {
                    Some(v) => {
                        result.add_field(alias, v);
                    }
                    None => return Err(FieldError::propagated_null()),
                }
            } else {
                futures.push_back(fut);
            }
        }

        while let Some((alias, value)) = futures.next().await {
            match value {
                Some(v) => {
                    result.add_field(alias, v);
                }
                None => return Err(FieldError::propagated_null()),
            }
        }

        Ok(Value::Object(result))
    }

    /// Resolves one flattened field to its `(alias, value)` pair.
    ///
    /// Returns [`None`] as the value when a non-`null` field failed and the
    /// `null` must propagate to the parent.
    fn resolve_flat_field(
        &self,
        parent_meta: &'r MetaType,
        parent: &'r ObjectMeta,
        source: &FieldValue,
        field: FlatField<'a>,
    ) -> BoxFuture<'r, (&'a str, Option<Value>)> {
        let this = self.clone();
        let source = source.clone();

        Box::pin(async move {
            let sub = this.field_sub_executor(field.alias, field.position);

            let result = sub
                .resolve_flat_field_inner(parent_meta, parent, source, &field)
                .await;

            match result {
                Ok((v, non_null)) if non_null && v.is_null() => {
                    sub.push_error_at(
                        format!(
                            "cannot return null for non-nullable field {}.{}",
                            parent.name, field.name,
                        )
                        .into(),
                        field.position,
                    );
                    (field.alias, None)
                }
                Ok((v, _)) => (field.alias, Some(v)),
                Err(e) => {
                    let non_null = lookup_field(parent_meta, field.name)
                        .map(|f| f.field_type.is_non_null())
                        .unwrap_or(false);
                    if !e.propagated {
                        sub.push_error_at(e, field.position);
                    }
                    if non_null {
                        (field.alias, None)
                    } else {
                        (field.alias, Some(Value::Null))
                    }
                }
            }
        })
    }

    async fn resolve_flat_field_inner(
        &self,
        parent_meta: &'r MetaType,
        parent: &'r ObjectMeta,
        source: FieldValue,
        field: &FlatField<'a>,
    ) -> FieldResult<(Value, bool)> {
        // Introspection entry points are provided on any composite parent.
        if field.name == "__schema" || field.name == "__type" {
            return self.resolve_introspection_field(field).await;
        }

        let meta_field = lookup_field(parent_meta, field.name).ok_or_else(|| {
            FieldError::from(format!(
                "unknown field {:?} on type {:?}",
                field.name,
                parent.name.as_str(),
            ))
        })?;

        let args = arguments::build_arguments(
            self.schema,
            meta_field.arguments.as_deref(),
            field.arguments,
            self.variables,
        )?;

        let mut info = ResolveInfo {
            context: self.context.clone(),
            source,
            args,
        };

        for interceptor in &meta_field.interceptors {
            interceptor(&mut info)?;
        }

        let value = match &meta_field.resolver {
            Some(resolver) => invoke_resolver(resolver, info).await?,
            None => default_resolve(&info.source, field.name)?,
        };

        let field_type = self.schema.make_type(&meta_field.field_type);
        let non_null = meta_field.field_type.is_non_null();

        let resolved = self
            .resolve_value(field_type, value, field.selections.clone())
            .await?;

        Ok((resolved, non_null))
    }

    async fn resolve_introspection_field(
        &self,
        field: &FlatField<'a>,
    ) -> FieldResult<(Value, bool)> {
        let (source, meta_field) = if field.name == "__schema" {
            (
                introspection::schema_source(self.schema),
                introspection::schema_meta_field(),
            )
        } else {
            let args = arguments::build_arguments(
                self.schema,
                introspection::type_meta_field().arguments.as_deref(),
                field.arguments,
                self.variables,
            )?;
            let name = args
                .get("name")
                .and_then(InputValue::as_string_value)
                .ok_or_else(|| FieldError::from("__type requires a \"name\" argument"))?;
            (
                introspection::type_source(self.schema, name),
                introspection::type_meta_field(),
            )
        };

        let field_type = self.schema.make_type(&meta_field.field_type);
        let non_null = meta_field.field_type.is_non_null();
        let resolved = self
            .resolve_value(field_type, source, field.selections.clone())
            .await?;

        Ok((resolved, non_null))
    }
}

/// Looks up a field on an object or interface, including the synthetic
/// introspection fields.
pub(crate) fn lookup_field<'s>(meta: &'s MetaType, name: &str) -> Option<&'s MetaField> {
    introspection::synthetic_field(name)
        .or_else(|| meta.field_by_name(name))
}

fn resolve_scalar(scalar: &ScalarMeta, source: &FieldValue) -> ExecutionResult {
    match source {
        FieldValue::Value(v) => (scalar.serialize_fn)(v),
        _ => Err(format!(
            "cannot serialize non-value source as {:?}",
            scalar.name.as_str(),
        )
        .into()),
    }
}

fn resolve_enum(enum_meta: &EnumMeta, source: &FieldValue) -> ExecutionResult {
    match source {
        FieldValue::Value(v) => enum_meta
            .name_for_value(v)
            .map(|name| Value::String(name.to_string()))
            .ok_or_else(|| {
                format!("invalid value for enum {:?}", enum_meta.name.as_str()).into()
            }),
        _ => Err(format!(
            "cannot serialize non-value source as enum {:?}",
            enum_meta.name.as_str(),
        )
        .into()),
    }
}

fn default_resolve(source: &FieldValue, name: &str) -> FieldResult<FieldValue> {
    match source {
        FieldValue::Null => Ok(FieldValue::Null),
        FieldValue::Value(Value::Object(map)) => Ok(map
            .get_field_value(name)
            .cloned()
            .map_or(FieldValue::Null, FieldValue::Value)),
        FieldValue::Value(Value::Null) => Ok(FieldValue::Null),
        FieldValue::Typed(_, inner) => default_resolve(inner, name),
        _ => Err(format!("no resolver defined for field {name:?}").into()),
    }
}

/// Invokes a resolver, converting panics in either the call or the returned
/// thunk into field errors.
async fn invoke_resolver(resolver: &ResolveFn, info: ResolveInfo) -> FieldResult<FieldValue> {
    let resolved = std::panic::catch_unwind(AssertUnwindSafe(|| resolver(info)))
        .map_err(|p| panic_field_error(&p))?;

    match resolved {
        Resolved::Value(r) => r,
        Resolved::Thunk(fut) => AssertUnwindSafe(fut)
            .catch_unwind()
            .await
            .unwrap_or_else(|p| Err(panic_field_error(&p))),
    }
}

fn panic_field_error(payload: &(dyn Any + Send)) -> FieldError {
    let msg = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unnamed panic");
    FieldError::from(format!("resolver panicked: {msg}"))
}

/// Finds the operation to execute in a document.
pub fn get_operation<'b, 'a>(
    document: &'b Document<'a>,
    operation_name: Option<&str>,
) -> Result<&'b Spanning<Operation<'a>>, GraphQLError> {
    let mut operation = None;
    for def in document {
        if let Definition::Operation(op) = def {
            if operation_name.is_none() && operation.is_some() {
                return Err(GraphQLError::MultipleOperationsProvided);
            }

            let move_op = operation_name.is_none()
                || op.item.name.map(|s| s.item) == operation_name;

            if move_op {
                operation = Some(op);
            }
        }
    }
    match operation {
        Some(op) => Ok(op),
        None if operation_name.is_some() => Err(GraphQLError::UnknownOperationName),
        None => Err(GraphQLError::NoOperationProvided),
    }
}

/// Creates a new [`Executor`] and resolves the validated operation against
/// `root_value`.
///
/// Top-level mutation selections run strictly serially in source order;
/// everything else runs concurrently.
pub async fn execute_validated_query<'a>(
    document: &'a Document<'a>,
    operation: &'a Spanning<Operation<'a>>,
    schema: &'a Arc<SchemaType>,
    root_value: &FieldValue,
    variables: &Variables,
    context: &RequestContext,
) -> Result<(Value, Vec<ExecutionError>), GraphQLError> {
    let mut fragments = HashMap::new();
    for def in document {
        if let Definition::Fragment(f) = def {
            fragments.insert(f.item.name.item, &f.item);
        }
    }

    let default_variable_values = operation.item.variable_definitions.as_ref().map(|defs| {
        defs.item
            .items
            .iter()
            .filter_map(|(name, def)| {
                def.default_value
                    .as_ref()
                    .map(|i| (name.item.into(), i.item.clone()))
            })
            .collect::<HashMap<String, InputValue>>()
    });

    let mut all_vars;
    let mut final_vars = variables;

    if let Some(defaults) = default_variable_values {
        all_vars = variables.clone();

        for (name, value) in defaults {
            all_vars.entry(name).or_insert(value);
        }

        final_vars = &all_vars;
    }

    let (root_meta, serial) = match operation.item.operation_type {
        OperationType::Query => (schema.query_type(), false),
        OperationType::Mutation => (
            schema.mutation_type().expect("no mutation type in schema"),
            true,
        ),
        // The initial resolve of a subscription; push delivery happens
        // elsewhere.
        OperationType::Subscription => (
            schema
                .subscription_type()
                .expect("no subscription type in schema"),
            false,
        ),
    };

    debug!(
        operation = %operation.item.operation_type,
        name = operation.item.name.map(|n| n.item),
        "executing operation",
    );

    let errors = RwLock::new(Vec::new());

    let value = {
        let executor = Executor {
            schema,
            fragments: &fragments,
            variables: final_vars,
            context,
            errors: &errors,
            field_path: Arc::new(FieldPath::Root(operation.span.start)),
        };

        let MetaType::Object(root_object) = root_meta else {
            unreachable!("root types are objects");
        };

        let selections = operation.item.selection_set.iter().collect::<Vec<_>>();

        executor
            .resolve_object(
                root_meta,
                root_object,
                root_value.clone(),
                &selections,
                serial,
            )
            .await
            .unwrap_or_else(|e| {
                if !e.propagated {
                    executor.push_error(e);
                }
                Value::Null
            })
    };

    let mut errors = errors.into_inner().unwrap();
    errors.sort();

    Ok((value, errors))
}
