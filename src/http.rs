//! Request and response envelopes.
//!
//! The transport in front of the engine (HTTP, WebSocket, or the federation
//! gateway's own dispatch) deserializes a [`GraphQLRequest`], runs it, and
//! serializes the outcome back through [`GraphQLResponse`].

use serde::{
    Deserialize, Serialize,
    ser::{SerializeMap, Serializer},
};

use crate::{
    GraphQLError, RuleError,
    ast::InputValue,
    executor::{ExecutionError, Variables},
    value::Value,
};

/// The request envelope: query text, optional operation name, and a
/// JSON-like variables map.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GraphQLRequest {
    /// The query source text.
    pub query: String,
    /// The operation to execute when the document contains several.
    #[serde(default, rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    /// The variable values the operation is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

impl GraphQLRequest {
    /// Creates a new request envelope.
    pub fn new(
        query: impl Into<String>,
        operation_name: Option<String>,
        variables: Option<serde_json::Value>,
    ) -> Self {
        Self {
            query: query.into(),
            operation_name,
            variables,
        }
    }

    /// Converts the JSON variables into the engine's [`Variables`] map.
    pub fn variables(&self) -> Variables {
        match &self.variables {
            Some(serde_json::Value::Object(obj)) => obj
                .iter()
                .map(|(k, v)| (k.clone(), InputValue::from(v.clone())))
                .collect(),
            _ => Variables::new(),
        }
    }
}

/// The response envelope: a `data` value and an `errors` array.
///
/// Wraps the outcome of an execution so that it can be serialized in the
/// shape clients expect. A request that never reached execution serializes
/// with `null` data and the parse or validation errors.
#[derive(Debug)]
pub struct GraphQLResponse(Result<(Value, Vec<ExecutionError>), GraphQLError>);

impl GraphQLResponse {
    /// Wraps an execution outcome.
    pub fn from_result(r: Result<(Value, Vec<ExecutionError>), GraphQLError>) -> Self {
        Self(r)
    }

    /// Constructs an error response outside the normal execution flow.
    pub fn error(error: GraphQLError) -> Self {
        Self(Err(error))
    }

    /// Was the request executed without reaching any error?
    pub fn is_ok(&self) -> bool {
        match &self.0 {
            Ok((_, errors)) => errors.is_empty(),
            Err(_) => false,
        }
    }

    /// The execution outcome this response wraps.
    pub fn into_result(self) -> Result<(Value, Vec<ExecutionError>), GraphQLError> {
        self.0
    }
}

impl Serialize for GraphQLResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Ok((data, errors)) => {
                let mut map = serializer.serialize_map(Some(if errors.is_empty() {
                    1
                } else {
                    2
                }))?;
                map.serialize_entry("data", data)?;
                if !errors.is_empty() {
                    map.serialize_entry("errors", errors)?;
                }
                map.end()
            }
            Err(err) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("data", &Value::Null)?;
                match err {
                    GraphQLError::ValidationError(errors) => {
                        map.serialize_entry(
                            "errors",
                            &errors.iter().map(SerializedRuleError).collect::<Vec<_>>(),
                        )?;
                    }
                    GraphQLError::ParseError(e) => {
                        map.serialize_entry(
                            "errors",
                            &[serde_json::json!({
                                "message": e.item.to_string(),
                                "locations": [{
                                    "line": e.span.start.line() + 1,
                                    "column": e.span.start.column() + 1,
                                }],
                            })],
                        )?;
                    }
                    other => {
                        map.serialize_entry(
                            "errors",
                            &[serde_json::json!({"message": other.to_string()})],
                        )?;
                    }
                }
                map.end()
            }
        }
    }
}

struct SerializedRuleError<'a>(&'a RuleError);

impl Serialize for SerializedRuleError<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("message", self.0.message())?;
        map.serialize_entry(
            "locations",
            &self
                .0
                .locations()
                .iter()
                .map(|p| {
                    serde_json::json!({"line": p.line() + 1, "column": p.column() + 1})
                })
                .collect::<Vec<_>>(),
        )?;
        map.serialize_entry("rule", self.0.rule())?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        GraphQLError,
        executor::{ExecutionError, PathSegment},
        parser::SourcePosition,
        validation::RuleError,
        value::{Object, Value},
    };

    use super::{GraphQLRequest, GraphQLResponse};

    #[test]
    fn request_round_trips_through_json() {
        let req: GraphQLRequest = serde_json::from_str(
            r#"{"query": "{ x }", "operationName": "Q", "variables": {"a": 1}}"#,
        )
        .unwrap();
        assert_eq!(req.query, "{ x }");
        assert_eq!(req.operation_name.as_deref(), Some("Q"));
        assert_eq!(req.variables().len(), 1);
    }

    #[test]
    fn successful_response_shape() {
        let data = Value::Object(
            [("a", Value::Int(1))].into_iter().collect::<Object>(),
        );
        let resp = GraphQLResponse::from_result(Ok((data, vec![])));
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"data":{"a":1}}"#,
        );
    }

    #[test]
    fn execution_errors_carry_location_path_and_one_based_lines() {
        let err = ExecutionError::new(
            SourcePosition::new(2, 0, 2),
            vec![PathSegment::Field("a".into()), PathSegment::Index(1)],
            "boom".into(),
        );
        let resp = GraphQLResponse::from_result(Ok((Value::Null, vec![err])));
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"data":null,"errors":[{"message":"boom","locations":[{"line":1,"column":3}],"path":["a",1]}]}"#,
        );
    }

    #[test]
    fn validation_errors_carry_rule_identifiers() {
        let resp = GraphQLResponse::error(GraphQLError::ValidationError(vec![RuleError::new(
            "ScalarLeafs",
            "boom",
            &[SourcePosition::new(0, 0, 0)],
        )]));
        let json = serde_json::to_value(serde_json::to_string(&resp).unwrap()).unwrap();
        let text = json.as_str().unwrap();
        assert!(text.contains(r#""rule":"ScalarLeafs""#));
        assert!(text.contains(r#""data":null"#));
    }
}
