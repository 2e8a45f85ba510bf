//! End-to-end execution scenarios.

mod federation;
mod interfaces;
mod mutations;
mod queries;
mod variables;

use std::sync::Arc;

use crate::{
    ExecutionError, FieldValue, GraphQLError, RequestContext, SchemaType, Value,
    Variables, execute,
};

pub(crate) async fn run(
    schema: &Arc<SchemaType>,
    query: &str,
    variables: Variables,
) -> Result<(Value, Vec<ExecutionError>), GraphQLError> {
    execute(
        query,
        None,
        schema,
        &FieldValue::Null,
        &variables,
        &RequestContext::new(),
    )
    .await
}

pub(crate) async fn run_ok(
    schema: &Arc<SchemaType>,
    query: &str,
    variables: Variables,
) -> (serde_json::Value, Vec<ExecutionError>) {
    let (data, errors) = run(schema, query, variables)
        .await
        .unwrap_or_else(|e| panic!("execution failed for {query:#?}: {e}"));
    (serde_json::to_value(&data).unwrap(), errors)
}
