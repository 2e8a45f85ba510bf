//! Mutation ordering: top-level mutation selections run strictly serially,
//! whether their resolvers answer immediately or through a thunk.

use std::sync::{Arc, Mutex, OnceLock};

use crate::{
    FieldValue, Object, RequestContext, Resolved, SchemaType, Type, Value, execute,
    schema::meta::{Argument, Field, ObjectMeta},
};

#[derive(Default)]
struct NumberHolder {
    value: Mutex<i64>,
    log: Mutex<Vec<i64>>,
}

impl NumberHolder {
    fn set(&self, n: i64) {
        *self.value.lock().unwrap() = n;
        self.log.lock().unwrap().push(n);
    }
}

fn holder_value(n: i64) -> FieldValue {
    FieldValue::Value(Value::Object(
        [("theNumber", Value::Int(n))].into_iter().collect::<Object>(),
    ))
}

fn schema() -> &'static Arc<SchemaType> {
    static SCHEMA: OnceLock<Arc<SchemaType>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let named = |n: &str| Type::Named(n.to_string().into());

        let types = vec![
            ObjectMeta::new(
                "NumberHolder",
                vec![Field::new("theNumber", named("Int"))],
            )
            .into_meta(),
            ObjectMeta::new(
                "Query",
                vec![Field::new("theNumber", named("Int")).resolver(Arc::new(|info| {
                    let holder = info
                        .context
                        .data::<Arc<NumberHolder>>()
                        .expect("number holder in context");
                    Resolved::ok(Value::Int(*holder.value.lock().unwrap()))
                }))],
            )
            .into_meta(),
            ObjectMeta::new(
                "Mutation",
                vec![
                    Field::new("immediatelyChangeTheNumber", named("NumberHolder"))
                        .argument(Argument::new(
                            "newNumber",
                            Type::NonNullNamed("Int".into()),
                        ))
                        .resolver(Arc::new(|info| {
                            let n = info.args.get_int("newNumber").unwrap();
                            let holder = info
                                .context
                                .data::<Arc<NumberHolder>>()
                                .expect("number holder in context");
                            holder.set(n);
                            Resolved::ok(holder_value(n))
                        })),
                    Field::new("promiseToChangeTheNumber", named("NumberHolder"))
                        .argument(Argument::new(
                            "newNumber",
                            Type::NonNullNamed("Int".into()),
                        ))
                        .resolver(Arc::new(|info| {
                            let n = info.args.get_int("newNumber").unwrap();
                            let holder = info
                                .context
                                .data::<Arc<NumberHolder>>()
                                .expect("number holder in context")
                                .clone();
                            Resolved::Thunk(Box::pin(async move {
                                tokio::task::yield_now().await;
                                holder.set(n);
                                Ok(holder_value(n))
                            }))
                        })),
                ],
            )
            .into_meta(),
        ];

        Arc::new(SchemaType::new(types, "Query", Some("Mutation"), None))
    })
}

#[tokio::test]
async fn evaluates_mutations_serially_in_source_order() {
    let holder = Arc::new(NumberHolder::default());
    let context = RequestContext::with_data(holder.clone());

    let (data, errors) = execute(
        r#"mutation M {
            a: immediatelyChangeTheNumber(newNumber: 1) { theNumber }
            b: promiseToChangeTheNumber(newNumber: 2) { theNumber }
            c: immediatelyChangeTheNumber(newNumber: 3) { theNumber }
        }"#,
        None,
        schema(),
        &crate::FieldValue::Null,
        &crate::Variables::new(),
        &context,
    )
    .await
    .expect("mutation executes");

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        serde_json::json!({
            "a": {"theNumber": 1},
            "b": {"theNumber": 2},
            "c": {"theNumber": 3},
        }),
    );

    // The observable sequence of state updates is the source order,
    // regardless of which resolvers answered through thunks.
    assert_eq!(*holder.log.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(*holder.value.lock().unwrap(), 3);
}

#[tokio::test]
async fn repeated_mutation_execution_is_reproducible() {
    for _ in 0..2 {
        let holder = Arc::new(NumberHolder::default());
        let context = RequestContext::with_data(holder.clone());

        let (data, _) = execute(
            "mutation { promiseToChangeTheNumber(newNumber: 7) { theNumber } }",
            None,
            schema(),
            &crate::FieldValue::Null,
            &crate::Variables::new(),
            &context,
        )
        .await
        .unwrap();

        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            serde_json::json!({"promiseToChangeTheNumber": {"theNumber": 7}}),
        );
    }
}
