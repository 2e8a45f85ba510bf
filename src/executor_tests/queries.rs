//! General query execution behavior.

use std::sync::{Arc, OnceLock};

use crate::{
    DirectiveLocation, DirectiveType, FieldValue, Object, PathSegment, RequestContext, Resolved,
    SchemaType, Type, Value, Variables, execute,
    schema::meta::{Argument, EnumMeta, EnumValue, Field, ObjectMeta},
};

use super::{run, run_ok};

fn named(name: &str) -> Type<'static> {
    Type::Named(name.to_string().into())
}

fn non_null(name: &str) -> Type<'static> {
    Type::NonNullNamed(name.to_string().into())
}

fn schema() -> &'static Arc<SchemaType> {
    static SCHEMA: OnceLock<Arc<SchemaType>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let types = vec![
            EnumMeta::new(
                "Episode",
                vec![
                    EnumValue::with_value("NEWHOPE", Value::Int(4)),
                    EnumValue::with_value("EMPIRE", Value::Int(5)),
                    EnumValue::with_value("JEDI", Value::Int(6)),
                ],
            )
            .into_meta(),
            ObjectMeta::new(
                "Inner",
                vec![
                    Field::new("value", named("String")),
                    Field::new("strict", non_null("String")).resolver(Arc::new(|_| {
                        Resolved::ok(FieldValue::Null)
                    })),
                ],
            )
            .into_meta(),
            ObjectMeta::new(
                "Query",
                vec![
                    Field::new("slow", named("String")).resolver(Arc::new(|_| {
                        Resolved::Thunk(Box::pin(async {
                            tokio::task::yield_now().await;
                            Ok(FieldValue::Value(Value::String("slow".into())))
                        }))
                    })),
                    Field::new("fast", named("String")).resolver(Arc::new(|_| {
                        Resolved::ok(Value::String("fast".into()))
                    })),
                    Field::new("episode", named("Episode")).resolver(Arc::new(|_| {
                        Resolved::ok(Value::Int(5))
                    })),
                    Field::new("badEpisode", named("Episode")).resolver(Arc::new(|_| {
                        Resolved::ok(Value::Int(9))
                    })),
                    Field::new(
                        "numbers",
                        Type::List(Box::new(named("Int"))),
                    )
                    .resolver(Arc::new(|_| {
                        Resolved::ok(Value::List(vec![
                            Value::Int(1),
                            Value::Int(2),
                            Value::Int(3),
                        ]))
                    })),
                    Field::new("inner", named("Inner")).resolver(Arc::new(|_| {
                        Resolved::ok(Value::Object(
                            [("value", Value::String("here".into()))]
                                .into_iter()
                                .collect::<Object>(),
                        ))
                    })),
                    Field::new(
                        "innerList",
                        Type::List(Box::new(named("Inner"))),
                    )
                    .resolver(Arc::new(|_| {
                        Resolved::ok(FieldValue::List(vec![
                            FieldValue::Value(Value::Object(
                                [("value", Value::String("zero".into()))]
                                    .into_iter()
                                    .collect::<Object>(),
                            )),
                            FieldValue::Value(Value::Null),
                        ]))
                    })),
                    Field::new("panics", named("String")).resolver(Arc::new(|_| {
                        panic!("boom");
                    })),
                    Field::new("fails", named("String")).resolver(Arc::new(|_| {
                        Resolved::err("deliberate failure")
                    })),
                    Field::new("intercepted", named("String"))
                        .argument(Argument::new("allowed", named("Boolean")))
                        .interceptor(Arc::new(|info| {
                            if info.args.get_bool("allowed") == Some(false) {
                                Err("blocked by interceptor".into())
                            } else {
                                Ok(())
                            }
                        }))
                        .resolver(Arc::new(|_| Resolved::ok(Value::String("through".into())))),
                ],
            )
            .into_meta(),
        ];

        Arc::new(SchemaType::new(types, "Query", None, None))
    })
}

#[tokio::test]
async fn response_order_matches_selection_order_under_concurrency() {
    // The first field resolves through a thunk that yields; the response
    // map still iterates in source order.
    let (data, errors) = run(schema(), "{ slow fast }", Variables::new()).await.unwrap();
    assert!(errors.is_empty());
    assert_eq!(
        serde_json::to_string(&data).unwrap(),
        r#"{"slow":"slow","fast":"fast"}"#,
    );
}

#[tokio::test]
async fn execution_is_idempotent() {
    let first = run_ok(schema(), "{ fast numbers episode }", Variables::new()).await;
    let second = run_ok(schema(), "{ fast numbers episode }", Variables::new()).await;
    assert_eq!(first.0, second.0);
    assert_eq!(first.1.len(), second.1.len());
}

#[tokio::test]
async fn enums_serialize_through_the_reverse_map() {
    let (data, errors) = run_ok(schema(), "{ episode }", Variables::new()).await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"episode": "EMPIRE"}));
}

#[tokio::test]
async fn unknown_enum_value_is_an_error() {
    let (data, errors) = run_ok(schema(), "{ badEpisode }", Variables::new()).await;
    assert_eq!(data, serde_json::json!({"badEpisode": null}));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].error().message().contains("Episode"));
}

#[tokio::test]
async fn lists_preserve_order() {
    let (data, errors) = run_ok(schema(), "{ numbers }", Variables::new()).await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"numbers": [1, 2, 3]}));
}

#[tokio::test]
async fn non_null_failure_propagates_to_nearest_nullable_ancestor() {
    let (data, errors) = run_ok(schema(), "{ inner { value strict } }", Variables::new()).await;

    // `strict` is non-null and resolves to null: `inner` collapses to null
    // and exactly one error carries the failed field's path.
    assert_eq!(data, serde_json::json!({"inner": null}));
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].path(),
        &[
            PathSegment::Field("inner".into()),
            PathSegment::Field("strict".into()),
        ],
    );
}

#[tokio::test]
async fn list_element_errors_carry_the_index() {
    let (data, errors) = run_ok(
        schema(),
        "{ innerList { value strict } }",
        Variables::new(),
    )
    .await;

    // Element 0 fails its non-null `strict` field and collapses to null;
    // element 1 is null outright and resolves to null without error.
    assert_eq!(
        data,
        serde_json::json!({"innerList": [null, null]}),
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].path(),
        &[
            PathSegment::Field("innerList".into()),
            PathSegment::Index(0),
            PathSegment::Field("strict".into()),
        ],
    );
}

#[tokio::test]
async fn resolver_panics_become_field_errors() {
    let (data, errors) = run_ok(schema(), "{ panics fast }", Variables::new()).await;
    assert_eq!(
        data,
        serde_json::json!({"panics": null, "fast": "fast"}),
    );
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].error().message().contains("resolver panicked"),
        "got: {}",
        errors[0].error().message(),
    );
    assert!(errors[0].error().message().contains("boom"));
}

#[tokio::test]
async fn resolver_errors_null_the_field_and_continue() {
    let (data, errors) = run_ok(schema(), "{ fails fast }", Variables::new()).await;
    assert_eq!(data, serde_json::json!({"fails": null, "fast": "fast"}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error().message(), "deliberate failure");
    assert_eq!(errors[0].path(), &[PathSegment::Field("fails".into())]);
}

#[tokio::test]
async fn skip_and_include_filter_during_flattening() {
    let (data, errors) = run_ok(
        schema(),
        r#"{
            fast @skip(if: true)
            episode @include(if: true)
            numbers @include(if: false)
        }"#,
        Variables::new(),
    )
    .await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"episode": "EMPIRE"}));
}

#[tokio::test]
async fn user_filter_directives_participate_in_flattening() {
    let mut schema = SchemaType::new(
        vec![
            ObjectMeta::new(
                "Query",
                vec![
                    Field::new("a", named("String"))
                        .resolver(Arc::new(|_| Resolved::ok(Value::String("a".into())))),
                    Field::new("b", named("String"))
                        .resolver(Arc::new(|_| Resolved::ok(Value::String("b".into())))),
                ],
            )
            .into_meta(),
        ],
        "Query",
        None,
        None,
    );
    schema.add_directive(
        DirectiveType::new(
            "hidden",
            &[DirectiveLocation::Field],
            vec![Argument::new("unless", named("Boolean"))],
        )
        .filter(Arc::new(|args| args.get_bool("unless") == Some(true))),
    );
    let schema = Arc::new(schema);

    let (data, errors) = run_ok(
        &schema,
        "{ a @hidden(unless: false) b @hidden(unless: true) }",
        Variables::new(),
    )
    .await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"b": "b"}));
}

#[tokio::test]
async fn interceptors_run_before_the_resolver() {
    let (data, errors) = run_ok(
        schema(),
        r#"{ ok: intercepted(allowed: true) no: intercepted(allowed: false) }"#,
        Variables::new(),
    )
    .await;

    assert_eq!(
        data,
        serde_json::json!({"ok": "through", "no": null}),
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error().message(), "blocked by interceptor");
}

#[tokio::test]
async fn a_canceled_context_short_circuits_dispatch() {
    let context = RequestContext::new();
    context.cancel();

    let (data, errors) = execute(
        "{ fast episode }",
        None,
        schema(),
        &FieldValue::Null,
        &Variables::new(),
        &context,
    )
    .await
    .unwrap();

    assert_eq!(serde_json::to_value(&data).unwrap(), serde_json::json!({}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error().message(), "execution canceled");
}

#[tokio::test]
async fn merged_fragment_selections_flatten_into_one_field() {
    let (data, errors) = run_ok(
        schema(),
        r#"
        { inner { value } inner { ...Extra } }
        fragment Extra on Inner { value }
        "#,
        Variables::new(),
    )
    .await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"inner": {"value": "here"}}));
}

#[tokio::test]
async fn typename_and_type_introspection() {
    let (data, errors) = run_ok(
        schema(),
        r#"{
            __typename
            __type(name: "Inner") { kind name fields { name type { name kind ofType { name } } } }
        }"#,
        Variables::new(),
    )
    .await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(data["__typename"], serde_json::json!("Query"));
    assert_eq!(data["__type"]["kind"], serde_json::json!("OBJECT"));
    assert_eq!(data["__type"]["name"], serde_json::json!("Inner"));

    let fields = data["__type"]["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["name"], serde_json::json!("value"));
    assert_eq!(fields[1]["type"]["kind"], serde_json::json!("NON_NULL"));
    assert_eq!(
        fields[1]["type"]["ofType"]["name"],
        serde_json::json!("String"),
    );
}

#[tokio::test]
async fn schema_introspection_lists_types_and_directives() {
    let (data, errors) = run_ok(
        schema(),
        "{ __schema { queryType { name } directives { name } types { name } } }",
        Variables::new(),
    )
    .await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(
        data["__schema"]["queryType"]["name"],
        serde_json::json!("Query"),
    );

    let directives = data["__schema"]["directives"].as_array().unwrap();
    let names = directives
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, ["deprecated", "include", "skip"]);

    let types = data["__schema"]["types"].as_array().unwrap();
    assert!(types.iter().any(|t| t["name"] == serde_json::json!("Episode")));
}

#[tokio::test]
async fn max_depth_gates_all_other_validation() {
    let schema = Arc::new(
        SchemaType::new(
            vec![
                ObjectMeta::new(
                    "Query",
                    vec![Field::new("inner", named("Query"))],
                )
                .into_meta(),
            ],
            "Query",
            None,
            None,
        )
        .with_max_depth(2),
    );

    let result = run(
        &schema,
        "{ inner { inner { inner { nonexistent } } } }",
        Variables::new(),
    )
    .await;

    let Err(crate::GraphQLError::ValidationError(errors)) = result else {
        panic!("expected validation errors, got {result:?}");
    };
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| e.rule() == "MaxDepth"));
}
