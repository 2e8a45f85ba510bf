//! Variable binding: defaults, explicit nulls, and non-null coercion.

use std::sync::{Arc, OnceLock};

use crate::{
    FieldValue, GraphQLError, Resolved, SchemaType, Type, Value, Variables,
    ast::InputValue,
    schema::meta::{Argument, Field, ObjectMeta},
};

use super::{run, run_ok};

fn named(name: &str) -> Type<'static> {
    Type::Named(name.to_string().into())
}

fn schema() -> &'static Arc<SchemaType> {
    static SCHEMA: OnceLock<Arc<SchemaType>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let types = vec![
            ObjectMeta::new(
                "Query",
                vec![
                    // Echoes back exactly what the resolver received.
                    Field::new("echo", named("String"))
                        .argument(Argument::new("input", named("String")))
                        .resolver(Arc::new(|info| {
                            Resolved::ok(match info.args.get("input") {
                                Some(v) => FieldValue::Value(v.to_value()),
                                None => FieldValue::Value(Value::String("absent".into())),
                            })
                        })),
                    Field::new("listNN", named("String"))
                        .argument(Argument::new(
                            "input",
                            Type::List(Box::new(Type::NonNullNamed("String".into()))),
                        ))
                        .resolver(Arc::new(|info| {
                            let n = info
                                .args
                                .get("input")
                                .and_then(InputValue::to_list_value)
                                .map(|l| l.len())
                                .unwrap_or(0);
                            Resolved::ok(Value::String(format!("{n} items")))
                        })),
                ],
            )
            .into_meta(),
        ];

        Arc::new(SchemaType::new(types, "Query", None, None))
    })
}

const DEFAULTED: &str = r#"query Q($x: String = "d") { echo(input: $x) }"#;

#[tokio::test]
async fn absent_variable_uses_the_declared_default() {
    let (data, errors) = run_ok(schema(), DEFAULTED, Variables::new()).await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"echo": "d"}));
}

#[tokio::test]
async fn explicit_null_overrides_the_default() {
    let vars = Variables::from([("x".to_string(), InputValue::null())]);
    let (data, errors) = run_ok(schema(), DEFAULTED, vars).await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"echo": null}));
}

#[tokio::test]
async fn provided_value_wins() {
    let vars = Variables::from([("x".to_string(), InputValue::string("v"))]);
    let (data, errors) = run_ok(schema(), DEFAULTED, vars).await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"echo": "v"}));
}

#[tokio::test]
async fn null_inside_non_null_list_fails_validation_before_execution() {
    let vars = Variables::from([(
        "xs".to_string(),
        InputValue::list(vec![
            InputValue::string("A"),
            InputValue::null(),
            InputValue::string("B"),
        ]),
    )]);

    let result = run(
        schema(),
        "query Q($xs: [String!]) { listNN(input: $xs) }",
        vars,
    )
    .await;

    let Err(GraphQLError::ValidationError(errors)) = result else {
        panic!("expected a validation error, got {result:?}");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule(), "VariablesOfCorrectType");
    assert!(
        errors[0].message().contains("In element #1"),
        "message should cite the null element: {}",
        errors[0].message(),
    );
}

#[tokio::test]
async fn only_the_selected_operation_constrains_variables() {
    // Operation A requires a variable; selecting B by name must not demand
    // it.
    let query = r#"
        query A($required: String!) { echo(input: $required) }
        query B { echo(input: "b") }
    "#;

    let (data, errors) = crate::execute(
        query,
        Some("B"),
        schema(),
        &FieldValue::Null,
        &Variables::new(),
        &crate::RequestContext::new(),
    )
    .await
    .expect("selecting B must not require A's variables");

    assert!(errors.is_empty());
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        serde_json::json!({"echo": "b"}),
    );

    // Selecting A still enforces its declaration.
    let result = crate::execute(
        query,
        Some("A"),
        schema(),
        &FieldValue::Null,
        &Variables::new(),
        &crate::RequestContext::new(),
    )
    .await;

    let Err(GraphQLError::ValidationError(errors)) = result else {
        panic!("expected a validation error, got {result:?}");
    };
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message().contains("$required"));
}

#[tokio::test]
async fn single_value_promotes_to_one_element_list() {
    let vars = Variables::from([("xs".to_string(), InputValue::string("solo"))]);
    let (data, errors) = run_ok(
        schema(),
        "query Q($xs: [String!]) { listNN(input: $xs) }",
        vars,
    )
    .await;
    assert!(errors.is_empty());
    assert_eq!(data, serde_json::json!({"listNN": "1 items"}));
}
