//! GraphQL execution engine with a federation query planner.
//!
//! The pipeline is parse → validate → execute: [`parse_document_source`]
//! turns a query string into an immutable document, [`validation`] checks it
//! against a [`SchemaType`], and the [`executor`] resolves it with
//! controlled concurrency against a root value. The [`federation`] module
//! sits above the executor: it splits a validated query into per-service
//! plans and stitches the upstream responses back together.

use derive_more::{Display, From};
use itertools::Itertools as _;

mod ast;
pub mod executor;
pub mod federation;
pub mod http;
mod introspection;
pub mod parser;
pub mod schema;
pub mod validation;
mod value;

#[cfg(test)]
mod executor_tests;

use std::sync::Arc;

use crate::{
    executor::{execute_validated_query, get_operation},
    validation::validate_input_values,
};

pub use crate::{
    ast::{
        Definition, Document, InputValue, Operation, OperationType, Selection, Type,
    },
    executor::{
        Arguments, ExecutionError, ExecutionResult, Executor, FieldError, FieldResult,
        FieldValue, PathSegment, RequestContext, ResolveFn, ResolveInfo, Resolved, Variables,
    },
    parser::{ParseError, Span, Spanning, parse_document_source},
    schema::{
        meta,
        model::{DirectiveLocation, DirectiveType, SchemaType},
    },
    validation::RuleError,
    value::{Object, Value},
};

/// An error that prevented query execution.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
pub enum GraphQLError {
    ParseError(Spanning<ParseError>),
    #[display("{}", _0.iter().format("\n"))]
    ValidationError(Vec<RuleError>),
    #[display("No operation provided")]
    NoOperationProvided,
    #[display("Multiple operations provided")]
    MultipleOperationsProvided,
    #[display("Unknown operation name")]
    UnknownOperationName,
}

impl From<RuleError> for GraphQLError {
    fn from(value: RuleError) -> Self {
        vec![value].into()
    }
}

impl std::error::Error for GraphQLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ParseError(e) => Some(e),
            Self::ValidationError(errs) => Some(errs.first()?),
            Self::NoOperationProvided
            | Self::MultipleOperationsProvided
            | Self::UnknownOperationName => None,
        }
    }
}

/// Executes a query against the provided schema.
///
/// Parses and validates `document_source`, binds `variables`, and resolves
/// the selected operation against `root_value`. Returns the response value
/// and the collected execution errors, or a [`GraphQLError`] when the
/// request never reached execution.
pub async fn execute(
    document_source: &str,
    operation_name: Option<&str>,
    schema: &Arc<SchemaType>,
    root_value: &FieldValue,
    variables: &Variables,
    context: &RequestContext,
) -> Result<(Value, Vec<ExecutionError>), GraphQLError> {
    let document = parse_document_source(document_source)?;

    {
        let errors = validation::validate(schema, &document);
        if !errors.is_empty() {
            return Err(errors.into());
        }
    }

    let operation = get_operation(&document, operation_name)?;

    {
        let errors = validate_input_values(variables, operation, schema);
        if !errors.is_empty() {
            return Err(errors.into());
        }
    }

    execute_validated_query(&document, operation, schema, root_value, variables, context).await
}
