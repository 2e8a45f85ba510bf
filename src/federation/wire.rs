//! The structured messages the gateway exchanges with services.
//!
//! A request carries the operation kind and a selection set that mirrors the
//! AST: fragment spreads and directives are preserved, and argument values
//! travel as a typed JSON payload in which integers and floats keep their
//! literal form. The receiving service prints the selection set back to
//! query text and runs it through its own parse/validate/execute pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    ast::{Directive, InputValue, OperationType, Selection},
    executor::{ExecutionError, PathSegment},
    value::Value,
};

impl Serialize for OperationType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        })
    }
}

impl<'de> Deserialize<'de> for OperationType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "query" => Ok(Self::Query),
            "mutation" => Ok(Self::Mutation),
            "subscription" => Ok(Self::Subscription),
            other => Err(serde::de::Error::custom(format!(
                "unknown operation kind {other:?}",
            ))),
        }
    }
}

/// A literal value on the wire.
///
/// The externally-tagged encoding keeps the value typed: `{"Int": 1}` and
/// `{"Float": 1.0}` stay distinguishable, and enum literals don't collapse
/// into strings.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum WireValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    Variable(String),
    List(Vec<WireValue>),
    Object(Vec<(String, WireValue)>),
}

impl WireValue {
    fn from_input(value: &InputValue) -> Self {
        match value {
            InputValue::Null => Self::Null,
            InputValue::Int(i) => Self::Int(*i),
            InputValue::Float(f) => Self::Float(*f),
            InputValue::String(s) => Self::String(s.clone()),
            InputValue::Boolean(b) => Self::Boolean(*b),
            InputValue::Enum(e) => Self::Enum(e.clone()),
            InputValue::Variable(v) => Self::Variable(v.clone()),
            InputValue::List(l) => {
                Self::List(l.iter().map(|v| Self::from_input(&v.item)).collect())
            }
            InputValue::Object(o) => Self::Object(
                o.iter()
                    .map(|(k, v)| (k.item.clone(), Self::from_input(&v.item)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{n}")
                }
            }
            Self::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Enum(e) => write!(f, "{e}"),
            Self::Variable(v) => write!(f, "${v}"),
            Self::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    v.fmt(f)?;
                }
                write!(f, "]")
            }
            Self::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A directive application on the wire.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WireDirective {
    /// The directive name, without the `@`.
    pub name: String,
    /// The directive's arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<(String, WireValue)>,
}

/// One selection of a wire selection set.
#[expect(missing_docs, reason = "mirrors the AST selection shapes")]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum WireSelection {
    Field {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        arguments: Vec<(String, WireValue)>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        directives: Vec<WireDirective>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        selections: Vec<WireSelection>,
    },
    FragmentSpread {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        directives: Vec<WireDirective>,
    },
    InlineFragment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_condition: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        directives: Vec<WireDirective>,
        selections: Vec<WireSelection>,
    },
}

fn wire_directives(directives: &Option<Vec<crate::parser::Spanning<Directive<'_>>>>) -> Vec<WireDirective> {
    directives
        .as_ref()
        .map(|ds| {
            ds.iter()
                .map(|d| WireDirective {
                    name: d.item.name.item.into(),
                    arguments: d
                        .item
                        .arguments
                        .as_ref()
                        .map(|args| {
                            args.item
                                .iter()
                                .map(|(k, v)| (k.item.into(), WireValue::from_input(&v.item)))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

impl WireSelection {
    /// Mirrors an AST selection onto the wire.
    pub fn from_selection(selection: &Selection<'_>) -> Self {
        match selection {
            Selection::Field(field) => Self::Field {
                alias: field.item.alias.map(|a| a.item.into()),
                name: field.item.name.item.into(),
                arguments: field
                    .item
                    .arguments
                    .as_ref()
                    .map(|args| {
                        args.item
                            .iter()
                            .map(|(k, v)| (k.item.into(), WireValue::from_input(&v.item)))
                            .collect()
                    })
                    .unwrap_or_default(),
                directives: wire_directives(&field.item.directives),
                selections: field
                    .item
                    .selection_set
                    .as_ref()
                    .map(|s| s.iter().map(Self::from_selection).collect())
                    .unwrap_or_default(),
            },
            Selection::FragmentSpread(spread) => Self::FragmentSpread {
                name: spread.item.name.item.into(),
                directives: wire_directives(&spread.item.directives),
            },
            Selection::InlineFragment(inline) => Self::InlineFragment {
                type_condition: inline.item.type_condition.map(|c| c.item.into()),
                directives: wire_directives(&inline.item.directives),
                selections: inline
                    .item
                    .selection_set
                    .iter()
                    .map(Self::from_selection)
                    .collect(),
            },
        }
    }
}

impl fmt::Display for WireSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn directives(f: &mut fmt::Formatter<'_>, ds: &[WireDirective]) -> fmt::Result {
            for d in ds {
                write!(f, " @{}", d.name)?;
                arguments(f, &d.arguments)?;
            }
            Ok(())
        }

        fn arguments(f: &mut fmt::Formatter<'_>, args: &[(String, WireValue)]) -> fmt::Result {
            if args.is_empty() {
                return Ok(());
            }
            write!(f, "(")?;
            for (i, (k, v)) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k}: {v}")?;
            }
            write!(f, ")")
        }

        fn selections(f: &mut fmt::Formatter<'_>, sels: &[WireSelection]) -> fmt::Result {
            write!(f, " {{")?;
            for s in sels {
                write!(f, " {s}")?;
            }
            write!(f, " }}")
        }

        match self {
            Self::Field {
                alias,
                name,
                arguments: args,
                directives: dirs,
                selections: sels,
            } => {
                if let Some(alias) = alias {
                    write!(f, "{alias}: ")?;
                }
                write!(f, "{name}")?;
                arguments(f, args)?;
                directives(f, dirs)?;
                if !sels.is_empty() {
                    selections(f, sels)?;
                }
                Ok(())
            }
            Self::FragmentSpread {
                name,
                directives: dirs,
            } => {
                write!(f, "...{name}")?;
                directives(f, dirs)
            }
            Self::InlineFragment {
                type_condition,
                directives: dirs,
                selections: sels,
            } => {
                write!(f, "...")?;
                if let Some(cond) = type_condition {
                    write!(f, " on {cond}")?;
                }
                directives(f, dirs)?;
                selections(f, sels)
            }
        }
    }
}

/// The request the gateway sends a federated service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SubgraphRequest {
    /// The operation kind the subquery runs as.
    pub kind: OperationType,
    /// The selections the service must resolve.
    pub selection_set: Vec<WireSelection>,
    /// The parent node's rehydration key, fed back from the gateway when
    /// this fetch extends an already-resolved object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representation: Option<serde_json::Value>,
}

impl SubgraphRequest {
    /// Prints the request as executable query text for the service's own
    /// parser.
    pub fn to_query(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        let _ = write!(out, "{} {{", self.kind);
        for s in &self.selection_set {
            let _ = write!(out, " {s}");
        }
        out.push_str(" }");
        out
    }
}

/// The response a federated service returns to the gateway.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SubgraphResponse {
    /// The resolved data, possibly partial.
    pub data: serde_json::Value,
    /// Errors the service reported, with paths relative to its own root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<WireError>,
}

/// One upstream error on the wire.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WireError {
    /// The error message.
    pub message: String,
    /// The response path, relative to the service's own response root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl SubgraphResponse {
    /// Builds a wire response from an engine execution outcome.
    pub fn from_execution(data: Value, errors: Vec<ExecutionError>) -> Self {
        Self {
            data: serde_json::to_value(&data).unwrap_or(serde_json::Value::Null),
            errors: errors
                .into_iter()
                .map(|e| WireError {
                    message: e.error().message().into(),
                    path: e.path().to_vec(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ast::OperationType, parser::parse_document_source};

    use super::{SubgraphRequest, WireSelection, WireValue};

    fn wire_selections(q: &str) -> Vec<WireSelection> {
        let doc = parse_document_source(q).unwrap();
        let crate::ast::Definition::Operation(op) = &doc[0] else {
            panic!("expected operation");
        };
        op.item
            .selection_set
            .iter()
            .map(WireSelection::from_selection)
            .collect()
    }

    #[test]
    fn int_and_float_stay_distinguishable_in_json() {
        let sels = wire_selections("{ f(a: 1, b: 1.0) }");
        let json = serde_json::to_string(&sels).unwrap();
        assert!(json.contains(r#"{"Int":1}"#), "got {json}");
        assert!(json.contains(r#"{"Float":1.0}"#), "got {json}");

        let back: Vec<WireSelection> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sels);
    }

    #[test]
    fn fragment_and_directive_structure_is_preserved() {
        let sels = wire_selections(
            "{ a @skip(if: $flag) ...F ...on Dog @include(if: true) { name } }",
        );
        let json = serde_json::to_string(&sels).unwrap();
        let back: Vec<WireSelection> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sels);

        assert!(matches!(back[1], WireSelection::FragmentSpread { .. }));
        assert!(matches!(back[2], WireSelection::InlineFragment { .. }));
    }

    #[test]
    fn requests_print_back_to_parsable_query_text() {
        let request = SubgraphRequest {
            kind: OperationType::Query,
            selection_set: wire_selections(
                r#"{ human(id: "1") { id name ...on Dog { barkVolume } } }"#,
            ),
            representation: None,
        };

        let printed = request.to_query();
        let reparsed = parse_document_source(&printed)
            .unwrap_or_else(|e| panic!("printed query does not parse: {printed:?}: {e}"));
        assert_eq!(reparsed.len(), 1);
    }

    #[test]
    fn enum_values_survive_the_wire_by_name() {
        let sels = wire_selections("{ f(c: HEEL) }");
        let WireSelection::Field { arguments, .. } = &sels[0] else {
            panic!("expected field");
        };
        assert_eq!(arguments[0].1, WireValue::Enum("HEEL".into()));
        let json = serde_json::to_string(&sels).unwrap();
        assert!(json.contains(r#"{"Enum":"HEEL"}"#), "got {json}");
    }
}
