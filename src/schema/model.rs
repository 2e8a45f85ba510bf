use std::fmt;

use arcstr::ArcStr;
use fnv::FnvHashMap;

use crate::{
    ast::{InputValue, Type},
    executor::FilterFn,
    introspection,
    schema::{
        meta::{Argument, InterfaceMeta, MetaType, ObjectMeta, UnionMeta},
        scalars,
    },
};

/// Metadata for a schema: the root type names, the global type table, and
/// the directive registry.
///
/// A [`SchemaType`] is immutable once built and freely shared between
/// requests.
pub struct SchemaType {
    types: FnvHashMap<String, MetaType>,
    query_type_name: String,
    mutation_type_name: Option<String>,
    subscription_type_name: Option<String>,
    directives: FnvHashMap<String, DirectiveType>,
    max_depth: Option<usize>,
}

/// A wrapped reference into the schema's type table.
///
/// List and non-`null` wrappers from a [`Type`] literal are materialized
/// around the named type they contain.
#[derive(Clone)]
pub enum TypeType<'a> {
    /// A named type from the schema's table.
    Concrete(&'a MetaType),
    /// A non-`null` wrapping of the inner type.
    NonNull(Box<TypeType<'a>>),
    /// A list wrapping of the inner type.
    List(Box<TypeType<'a>>),
}

/// A directive declaration in the schema's registry.
pub struct DirectiveType {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub locations: Vec<DirectiveLocation>,
    #[doc(hidden)]
    pub arguments: Vec<Argument>,
    pub(crate) filter_fn: Option<FilterFn>,
}

/// Locations a directive may be applied in.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    FieldDefinition,
    EnumValue,
}

impl SchemaType {
    /// Builds a schema over the provided named types.
    ///
    /// Built-in scalars, introspection types, and the `@skip`/`@include`/
    /// `@deprecated` directives are installed automatically. Interface
    /// possible-types sets are wired here: first all named types enter the
    /// table, then object→interface links are connected, so cyclic type
    /// references need no special treatment from the caller.
    ///
    /// # Panics
    ///
    /// Panics if a type name is duplicated, an object implements an unknown
    /// interface, or a root type is missing or not an object. Schema
    /// construction mistakes are programmer errors.
    pub fn new(
        types: Vec<MetaType>,
        query: &str,
        mutation: Option<&str>,
        subscription: Option<&str>,
    ) -> Self {
        let mut table: FnvHashMap<String, MetaType> = FnvHashMap::default();

        for t in scalars::builtins().into_iter().chain(types) {
            let name = t.name().to_string();
            if table.insert(name.clone(), t).is_some() {
                panic!("duplicate type name {name:?} in schema");
            }
        }

        introspection::install_meta_types(&mut table);

        // Second pass: wire interface implementers.
        let mut implementers: FnvHashMap<String, Vec<ArcStr>> = FnvHashMap::default();
        for t in table.values() {
            let (name, interface_names) = match t {
                MetaType::Object(ObjectMeta {
                    name,
                    interface_names,
                    ..
                })
                | MetaType::Interface(InterfaceMeta {
                    name,
                    interface_names,
                    ..
                }) => (name, interface_names),
                _ => continue,
            };
            for iface in interface_names {
                if !matches!(table.get(iface.as_str()), Some(MetaType::Interface(..))) {
                    panic!("type {name:?} implements unknown interface {iface:?}");
                }
                if matches!(t, MetaType::Object(..)) {
                    implementers
                        .entry(iface.to_string())
                        .or_default()
                        .push(name.clone());
                }
            }
        }
        for (iface, mut possible) in implementers {
            possible.sort();
            match table.get_mut(&iface) {
                Some(MetaType::Interface(meta)) => meta.possible_type_names = possible,
                _ => unreachable!("interface presence checked above"),
            }
        }

        for t in table.values() {
            if let MetaType::Union(UnionMeta {
                name, of_type_names, ..
            }) = t
            {
                for member in of_type_names {
                    if !matches!(table.get(member.as_str()), Some(MetaType::Object(..))) {
                        panic!("union {name:?} contains non-object member {member:?}");
                    }
                }
            }
        }

        let schema = Self {
            types: table,
            query_type_name: query.into(),
            mutation_type_name: mutation.map(Into::into),
            subscription_type_name: subscription.map(Into::into),
            directives: [
                DirectiveType::new_skip(),
                DirectiveType::new_include(),
                DirectiveType::new_deprecated(),
            ]
            .into_iter()
            .map(|d| (d.name.to_string(), d))
            .collect(),
            max_depth: None,
        };

        for root in [Some(query), mutation, subscription].into_iter().flatten() {
            match schema.types.get(root) {
                Some(MetaType::Object(..)) => {}
                Some(..) => panic!("root type {root:?} is not an object"),
                None => panic!("root type {root:?} not found in schema"),
            }
        }

        schema
    }

    /// Limits the nesting depth of operations accepted by the validator.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// The configured operation depth bound, if any.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Registers a directive declaration.
    pub fn add_directive(&mut self, directive: DirectiveType) {
        self.directives.insert(directive.name.to_string(), directive);
    }

    /// Looks a type up by name, wrapped for further modification.
    pub fn type_by_name(&self, name: &str) -> Option<TypeType<'_>> {
        self.types.get(name).map(TypeType::Concrete)
    }

    /// Looks a named type up in the table.
    pub fn concrete_type_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    /// The schema's query root.
    pub fn query_type(&self) -> &MetaType {
        self.types
            .get(&self.query_type_name)
            .expect("query type does not exist in schema")
    }

    /// The schema's mutation root, if any.
    pub fn mutation_type(&self) -> Option<&MetaType> {
        self.mutation_type_name
            .as_ref()
            .map(|n| self.types.get(n).expect("mutation type does not exist in schema"))
    }

    /// The schema's subscription root, if any.
    pub fn subscription_type(&self) -> Option<&MetaType> {
        self.subscription_type_name
            .as_ref()
            .map(|n| self.types.get(n).expect("subscription type does not exist in schema"))
    }

    /// All named types in the schema, sorted by name.
    pub fn type_list(&self) -> Vec<&MetaType> {
        let mut types = self.types.values().collect::<Vec<_>>();
        types.sort_by(|a, b| a.name().cmp(b.name()));
        types
    }

    /// Materializes a [`Type`] literal against the schema's type table.
    ///
    /// # Panics
    ///
    /// Panics if the named type is absent; callers validate names first.
    pub fn make_type<'s>(&'s self, t: &Type<'_>) -> TypeType<'s> {
        match t {
            Type::NonNullNamed(n) => TypeType::NonNull(Box::new(
                self.type_by_name(n).expect("type not found in schema"),
            )),
            Type::NonNullList(inner) => {
                TypeType::NonNull(Box::new(TypeType::List(Box::new(self.make_type(inner)))))
            }
            Type::Named(n) => self.type_by_name(n).expect("type not found in schema"),
            Type::List(inner) => TypeType::List(Box::new(self.make_type(inner))),
        }
    }

    /// All registered directives, sorted by name.
    pub fn directive_list(&self) -> Vec<&DirectiveType> {
        let mut directives = self.directives.values().collect::<Vec<_>>();
        directives.sort_by(|a, b| a.name.cmp(&b.name));
        directives
    }

    /// Looks a directive declaration up by name.
    pub fn directive_by_name(&self, name: &str) -> Option<&DirectiveType> {
        self.directives.get(name)
    }

    /// Determines if two types share any possible concrete type.
    pub fn type_overlap(&self, t1: &MetaType, t2: &MetaType) -> bool {
        if std::ptr::eq(t1, t2) {
            return true;
        }

        match (t1.is_abstract(), t2.is_abstract()) {
            (true, true) => self
                .possible_types(t1)
                .iter()
                .any(|t| self.is_possible_type(t2, t)),
            (true, false) => self.is_possible_type(t1, t2),
            (false, true) => self.is_possible_type(t2, t1),
            (false, false) => false,
        }
    }

    /// The set of concrete objects that can satisfy the provided type.
    ///
    /// For an object this is the object itself; for abstract types it is the
    /// implementer/member set wired at build time.
    pub fn possible_types(&self, t: &MetaType) -> Vec<&MetaType> {
        match t {
            MetaType::Object(..) => vec![
                self.concrete_type_by_name(t.name())
                    .expect("object type in schema"),
            ],
            MetaType::Union(UnionMeta { of_type_names, .. }) => of_type_names
                .iter()
                .filter_map(|t| self.concrete_type_by_name(t))
                .collect(),
            MetaType::Interface(InterfaceMeta {
                possible_type_names,
                ..
            }) => possible_type_names
                .iter()
                .filter_map(|t| self.concrete_type_by_name(t))
                .collect(),
            _ => panic!("can't retrieve possible types from non-composite meta type"),
        }
    }

    /// Whether `possible_type` is a concrete possibility of `abstract_type`.
    pub fn is_possible_type(&self, abstract_type: &MetaType, possible_type: &MetaType) -> bool {
        self.possible_types(abstract_type)
            .into_iter()
            .any(|t| std::ptr::eq(t, possible_type))
    }

    /// Whether `sub_type` may be used where `super_type` is expected.
    pub fn is_subtype(&self, sub_type: &Type<'_>, super_type: &Type<'_>) -> bool {
        use crate::ast::Type::{List, Named, NonNullList, NonNullNamed};

        if super_type == sub_type {
            return true;
        }

        match (super_type, sub_type) {
            (NonNullNamed(super_name), NonNullNamed(sub_name))
            | (Named(super_name), Named(sub_name))
            | (Named(super_name), NonNullNamed(sub_name)) => {
                self.is_named_subtype(sub_name, super_name)
            }
            (NonNullList(super_inner), NonNullList(sub_inner))
            | (List(super_inner), List(sub_inner))
            | (List(super_inner), NonNullList(sub_inner)) => {
                self.is_subtype(sub_inner, super_inner)
            }
            _ => false,
        }
    }

    /// Whether the named `sub_type_name` is usable as `super_type_name`.
    pub fn is_named_subtype(&self, sub_type_name: &str, super_type_name: &str) -> bool {
        if sub_type_name == super_type_name {
            true
        } else if let (Some(sub_type), Some(super_type)) = (
            self.concrete_type_by_name(sub_type_name),
            self.concrete_type_by_name(super_type_name),
        ) {
            super_type.is_abstract() && self.is_possible_type(super_type, sub_type)
        } else {
            false
        }
    }
}

impl fmt::Debug for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaType")
            .field("query_type_name", &self.query_type_name)
            .field("mutation_type_name", &self.mutation_type_name)
            .field("subscription_type_name", &self.subscription_type_name)
            .finish_non_exhaustive()
    }
}

impl<'a> TypeType<'a> {
    /// Unwraps to the named type reference, if this is one.
    pub fn to_concrete(&self) -> Option<&'a MetaType> {
        match self {
            Self::Concrete(t) => Some(t),
            _ => None,
        }
    }

    /// The named type inside any list and non-`null` wrappers.
    pub fn innermost_concrete(&self) -> &'a MetaType {
        match self {
            Self::Concrete(t) => t,
            Self::NonNull(inner) | Self::List(inner) => inner.innermost_concrete(),
        }
    }

    /// Whether the outermost wrapper is non-`null`.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(..))
    }
}

impl DirectiveType {
    /// Declares a new directive.
    pub fn new(
        name: impl Into<ArcStr>,
        locations: &[DirectiveLocation],
        arguments: Vec<Argument>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            locations: locations.to_vec(),
            arguments,
            filter_fn: None,
        }
    }

    fn new_skip() -> Self {
        Self::new(
            "skip",
            &[
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![Argument::new(
                "if",
                Type::NonNullNamed("Boolean".into()),
            )],
        )
    }

    fn new_include() -> Self {
        Self::new(
            "include",
            &[
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![Argument::new(
                "if",
                Type::NonNullNamed("Boolean".into()),
            )],
        )
    }

    // Metadata only; the executor never consults it.
    fn new_deprecated() -> Self {
        Self::new(
            "deprecated",
            &[
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::EnumValue,
            ],
            vec![
                Argument::new("reason", Type::Named("String".into()))
                    .default_value(InputValue::string("No longer supported")),
            ],
        )
    }

    /// Sets the description of this [`DirectiveType`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks this directive as a selection filter.
    ///
    /// The hook runs during selection-set flattening; returning `false`
    /// drops the annotated selection, like `@skip`/`@include` do.
    #[must_use]
    pub fn filter(mut self, f: FilterFn) -> Self {
        self.filter_fn = Some(f);
        self
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
            Self::Field => "field",
            Self::FragmentDefinition => "fragment definition",
            Self::FragmentSpread => "fragment spread",
            Self::InlineFragment => "inline fragment",
            Self::FieldDefinition => "field definition",
            Self::EnumValue => "enum value",
        })
    }
}

impl fmt::Display for TypeType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(t) => f.write_str(t.name()),
            Self::List(i) => write!(f, "[{i}]"),
            Self::NonNull(i) => write!(f, "{i}!"),
        }
    }
}
