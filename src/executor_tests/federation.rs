//! Federation: planning a split query and stitching mock service responses.

use std::collections::HashMap;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use crate::{
    FieldResult, Type,
    ast::{Definition, OperationType, Selection},
    federation::{
        FederatedSchema, FederatedSchemaBuilder, PathStep, Plan, PlanError, ServiceTransport,
        execute_plan, plan,
        wire::{SubgraphRequest, SubgraphResponse},
    },
    parser::parse_document_source,
    schema::meta::{Argument, Field, InterfaceMeta, ObjectMeta},
};

fn named(name: &str) -> Type<'static> {
    Type::Named(name.to_string().into())
}

fn human_schema() -> FederatedSchema {
    FederatedSchemaBuilder::new()
        .service(
            "s1",
            vec![
                ObjectMeta::new(
                    "Query",
                    vec![
                        Field::new("human", named("Human"))
                            .argument(Argument::new("id", named("ID"))),
                    ],
                )
                .into_meta(),
                ObjectMeta::new(
                    "Human",
                    vec![
                        Field::new("id", named("ID")),
                        Field::new("name", named("String")),
                    ],
                )
                .into_meta(),
            ],
        )
        .service(
            "s2",
            vec![ObjectMeta::new("Human", vec![Field::new("age", named("Int"))]).into_meta()],
        )
        .finish("Query", None, None)
}

fn plan_query<'a>(
    schema: &FederatedSchema,
    query: &'a str,
) -> Result<Plan<'a>, PlanError> {
    let doc = parse_document_source(query).expect("query parses");
    // The document is only read during planning; plans borrow the source.
    let doc = Box::leak(Box::new(doc));

    let mut fragments = HashMap::new();
    let mut operation = None;
    for def in doc.iter() {
        match def {
            Definition::Fragment(f) => {
                fragments.insert(f.item.name.item, &f.item);
            }
            Definition::Operation(op) => operation = Some(op),
        }
    }
    let operation = operation.expect("an operation");

    plan(
        schema,
        operation.item.operation_type,
        &operation.item.selection_set,
        &fragments,
    )
}

fn field_names<'a>(selections: &'a [Selection<'a>]) -> Vec<&'a str> {
    selections
        .iter()
        .filter_map(|s| match s {
            Selection::Field(f) => Some(f.item.name.item),
            _ => None,
        })
        .collect()
}

#[test]
fn splits_a_query_across_two_services() {
    let schema = human_schema();
    let root = plan_query(&schema, r#"{ human(id: "1") { id name age } }"#).unwrap();

    assert_eq!(root.service.as_str(), "");
    assert_eq!(root.children.len(), 1);

    let s1 = &root.children[0];
    assert_eq!(s1.service.as_str(), "s1");
    assert_eq!(s1.operation_kind, OperationType::Query);
    assert_eq!(s1.path, Vec::<PathStep>::new());

    let Selection::Field(human) = &s1.selection_set[0] else {
        panic!("expected the human field");
    };
    assert_eq!(human.item.name.item, "human");
    assert_eq!(
        field_names(human.item.selection_set.as_ref().unwrap()),
        ["id", "name", "__federation"],
    );

    assert_eq!(s1.children.len(), 1);
    let s2 = &s1.children[0];
    assert_eq!(s2.service.as_str(), "s2");
    assert_eq!(s2.path, vec![PathStep::Field("human".into())]);
    assert_eq!(s2.parent_type.as_str(), "Human");
    assert_eq!(field_names(&s2.selection_set), ["age"]);
    assert!(s2.children.is_empty());
}

#[test]
fn single_service_queries_produce_no_marker() {
    let schema = human_schema();
    let root = plan_query(&schema, r#"{ human(id: "1") { id name } }"#).unwrap();

    assert_eq!(root.children.len(), 1);
    let s1 = &root.children[0];
    let Selection::Field(human) = &s1.selection_set[0] else {
        panic!("expected the human field");
    };
    assert_eq!(
        field_names(human.item.selection_set.as_ref().unwrap()),
        ["id", "name"],
    );
    assert!(s1.children.is_empty());
}

#[test]
fn federated_mutations_refuse_to_span_services() {
    let schema = FederatedSchemaBuilder::new()
        .service(
            "s1",
            vec![
                ObjectMeta::new("Query", vec![Field::new("x", named("String"))]).into_meta(),
                ObjectMeta::new("Mutation", vec![Field::new("setA", named("String"))])
                    .into_meta(),
            ],
        )
        .service(
            "s2",
            vec![
                ObjectMeta::new("Mutation", vec![Field::new("setB", named("String"))])
                    .into_meta(),
            ],
        )
        .finish("Query", Some("Mutation"), None);

    let err = plan_query(&schema, "mutation { setA setB }").unwrap_err();
    assert_eq!(err, PlanError::MutationSpansServices);

    assert!(plan_query(&schema, "mutation { setA }").is_ok());
}

#[test]
fn a_third_hop_through_one_object_is_rejected() {
    let schema = FederatedSchemaBuilder::new()
        .service(
            "s1",
            vec![
                ObjectMeta::new("Query", vec![Field::new("thing", named("Thing"))])
                    .into_meta(),
                ObjectMeta::new("Thing", vec![Field::new("a", named("String"))]).into_meta(),
            ],
        )
        .service(
            "s2",
            vec![ObjectMeta::new("Thing", vec![Field::new("b", named("String"))]).into_meta()],
        )
        .service(
            "s3",
            vec![ObjectMeta::new("Thing", vec![Field::new("c", named("String"))]).into_meta()],
        )
        .finish("Query", None, None);

    // Two services beyond the owner require a third hop through `Thing`.
    let err = plan_query(&schema, "{ thing { a b c } }");
    assert!(
        matches!(err, Err(PlanError::TooManyServiceHops(..))),
        "got {err:?}",
    );

    // Two-hop fetches stay fine.
    assert!(plan_query(&schema, "{ thing { a b } }").is_ok());
}

#[test]
fn abstract_parents_materialize_type_discriminated_paths() {
    let schema = FederatedSchemaBuilder::new()
        .service(
            "s1",
            vec![
                InterfaceMeta::new("Node", vec![Field::new("id", named("ID"))]).into_meta(),
                ObjectMeta::new("Post", vec![Field::new("id", named("ID"))])
                    .interfaces(&["Node"])
                    .into_meta(),
                ObjectMeta::new("User", vec![Field::new("id", named("ID"))])
                    .interfaces(&["Node"])
                    .into_meta(),
                ObjectMeta::new("Query", vec![Field::new("node", named("Node"))]).into_meta(),
            ],
        )
        .service(
            "s2",
            vec![ObjectMeta::new("User", vec![Field::new("email", named("String"))]).into_meta()],
        )
        .finish("Query", None, None);

    let root = plan_query(&schema, "{ node { id ...on User { email } } }").unwrap();
    let s1 = &root.children[0];

    let Selection::Field(node) = &s1.selection_set[0] else {
        panic!("expected the node field");
    };
    // Normalization materialized __typename plus one inline fragment per
    // concrete member.
    let normalized = node.item.selection_set.as_ref().unwrap();
    assert_eq!(field_names(normalized), ["__typename"]);
    assert!(
        normalized
            .iter()
            .filter(|s| matches!(s, Selection::InlineFragment(..)))
            .count()
            >= 2,
    );

    let s2 = &s1.children[0];
    assert_eq!(s2.service.as_str(), "s2");
    assert_eq!(
        s2.path,
        vec![
            PathStep::Field("node".into()),
            PathStep::Type("User".into()),
        ],
    );
}

struct MockTransport;

#[async_trait]
impl ServiceTransport for MockTransport {
    async fn send(
        &self,
        service: &str,
        request: SubgraphRequest,
    ) -> FieldResult<SubgraphResponse> {
        match service {
            "s1" => {
                // The printed subquery must be parsable GraphQL.
                let query = request.to_query();
                parse_document_source(&query)
                    .unwrap_or_else(|e| panic!("unparsable subquery {query:?}: {e}"));

                Ok(SubgraphResponse {
                    data: serde_json::json!({
                        "human": {
                            "id": "1",
                            "name": "Luke",
                            "__federation": {"type": "Human", "id": "1"},
                        },
                    }),
                    errors: vec![],
                })
            }
            "s2" => {
                let representation = request.representation.expect("rehydration key");
                assert_eq!(representation["id"], serde_json::json!("1"));

                Ok(SubgraphResponse {
                    data: serde_json::json!({"age": 32}),
                    errors: vec![],
                })
            }
            other => Err(format!("unknown service {other:?}").into()),
        }
    }
}

#[tokio::test]
async fn stitches_a_two_service_response() {
    let schema = human_schema();
    let root = plan_query(&schema, r#"{ human(id: "1") { id name age } }"#).unwrap();

    let (data, errors) = execute_plan(&root, &MockTransport).await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        serde_json::json!({
            "human": {"id": "1", "name": "Luke", "age": 32},
        }),
    );
}

#[tokio::test]
async fn root_typename_survives_stitching() {
    let schema = human_schema();
    let root = plan_query(&schema, r#"{ __typename human(id: "1") { id name } }"#).unwrap();

    // The synthetic selection stays on the gateway's own root node.
    assert_eq!(field_names(&root.selection_set), ["__typename"]);
    assert_eq!(root.children.len(), 1);

    let (data, errors) = execute_plan(&root, &MockTransport).await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        serde_json::json!({
            "__typename": "Query",
            "human": {"id": "1", "name": "Luke"},
        }),
    );
}

#[tokio::test]
async fn upstream_errors_are_adopted_with_prefixed_paths() {
    struct FailingSecondHop;

    #[async_trait]
    impl ServiceTransport for FailingSecondHop {
        async fn send(
            &self,
            service: &str,
            request: SubgraphRequest,
        ) -> FieldResult<SubgraphResponse> {
            match service {
                "s1" => MockTransport.send(service, request).await,
                _ => Ok(SubgraphResponse {
                    data: serde_json::json!({"age": null}),
                    errors: vec![crate::federation::wire::WireError {
                        message: "age unavailable".into(),
                        path: vec![crate::PathSegment::Field("age".into())],
                    }],
                }),
            }
        }
    }

    let schema = human_schema();
    let root = plan_query(&schema, r#"{ human(id: "1") { id name age } }"#).unwrap();
    let (data, errors) = execute_plan(&root, &FailingSecondHop).await;

    // Partial data is still stitched.
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        serde_json::json!({
            "human": {"id": "1", "name": "Luke", "age": null},
        }),
    );

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error().message(), "age unavailable");
    assert_eq!(
        errors[0].path(),
        &[
            crate::PathSegment::Field("human".into()),
            crate::PathSegment::Field("age".into()),
        ],
    );
}

#[test]
fn normalization_is_idempotent() {
    let schema = human_schema();

    let first = plan_query(
        &schema,
        r#"{ human(id: "1") { id name } human(id: "1") { name } }"#,
    )
    .unwrap();
    let Selection::Field(human) = &first.children[0].selection_set[0] else {
        panic!("expected the human field");
    };
    assert_eq!(
        field_names(human.item.selection_set.as_ref().unwrap()),
        ["id", "name"],
    );
}

#[test]
fn conflicting_arguments_are_rejected_by_the_pre_pass() {
    let schema = human_schema();
    let err = plan_query(
        &schema,
        r#"{ human(id: "1") { id } human(id: "2") { name } }"#,
    )
    .unwrap_err();
    assert_eq!(err, PlanError::ConflictingFields("human".into()));
}

#[test]
fn reserved_alias_reuse_is_rejected() {
    let schema = human_schema();
    let err = plan_query(
        &schema,
        r#"{ human(id: "1") { age __federation: id } }"#,
    )
    .unwrap_err();
    assert_eq!(err, PlanError::FederationAliasConflict);
}
