//! Abstract-type dispatch: interfaces and unions resolve to their concrete
//! object, with inline fragments filtered by the runtime type.

use std::sync::{Arc, OnceLock};

use crate::{
    FieldValue, Object, Resolved, SchemaType, Type, Value,
    schema::meta::{Field, InterfaceMeta, ObjectMeta, UnionMeta},
};

use super::run_ok;

struct Droid;

fn named(name: &str) -> Type<'static> {
    Type::Named(name.to_string().into())
}

fn character(name: &str, extra: (&str, Value)) -> FieldValue {
    FieldValue::Value(Value::Object(
        [("name", Value::String(name.into())), (extra.0, extra.1)]
            .into_iter()
            .collect::<Object>(),
    ))
}

fn schema() -> &'static Arc<SchemaType> {
    static SCHEMA: OnceLock<Arc<SchemaType>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let types = vec![
            InterfaceMeta::new("Character", vec![Field::new("name", named("String"))])
                .into_meta(),
            ObjectMeta::new(
                "Human",
                vec![
                    Field::new("name", named("String")),
                    Field::new("homePlanet", named("String")),
                ],
            )
            .interfaces(&["Character"])
            .into_meta(),
            ObjectMeta::new(
                "Droid",
                vec![
                    Field::new("name", named("String")),
                    Field::new("primaryFunction", named("String")),
                ],
            )
            .interfaces(&["Character"])
            .source_type::<Droid>()
            .into_meta(),
            UnionMeta::new("SearchResult", &["Human", "Droid"]).into_meta(),
            ObjectMeta::new(
                "Query",
                vec![
                    Field::new("hero", named("Character")).resolver(Arc::new(|_| {
                        Resolved::ok(FieldValue::typed(
                            "Droid",
                            character("R2-D2", ("primaryFunction", "Astromech".into())),
                        ))
                    })),
                    Field::new("search", named("SearchResult")).resolver(Arc::new(|_| {
                        Resolved::ok(FieldValue::typed(
                            "Human",
                            character("Luke", ("homePlanet", "Tatooine".into())),
                        ))
                    })),
                    // Dispatch falls back to the declared Rust source type
                    // when no explicit type name is attached.
                    Field::new("mechanicalHero", named("Character")).resolver(Arc::new(|_| {
                        Resolved::ok(FieldValue::any(Droid))
                    })),
                ],
            )
            .into_meta(),
        ];

        Arc::new(SchemaType::new(types, "Query", None, None))
    })
}

#[tokio::test]
async fn interface_dispatch_with_inline_fragment() {
    let (data, errors) = run_ok(
        schema(),
        "{ hero { __typename name ...on Droid { primaryFunction } } }",
        crate::Variables::new(),
    )
    .await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(
        data,
        serde_json::json!({
            "hero": {
                "__typename": "Droid",
                "name": "R2-D2",
                "primaryFunction": "Astromech",
            },
        }),
    );
}

#[tokio::test]
async fn non_matching_inline_fragments_are_dropped() {
    let (data, errors) = run_ok(
        schema(),
        "{ hero { name ...on Human { homePlanet } } }",
        crate::Variables::new(),
    )
    .await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(data, serde_json::json!({"hero": {"name": "R2-D2"}}));
}

#[tokio::test]
async fn union_dispatch_through_named_fragment() {
    let (data, errors) = run_ok(
        schema(),
        r#"
        { search { __typename ...HumanBits ...on Droid { primaryFunction } } }
        fragment HumanBits on Human { homePlanet }
        "#,
        crate::Variables::new(),
    )
    .await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(
        data,
        serde_json::json!({
            "search": {"__typename": "Human", "homePlanet": "Tatooine"},
        }),
    );
}

#[tokio::test]
async fn dispatch_by_declared_source_type() {
    let (data, errors) = run_ok(
        schema(),
        "{ mechanicalHero { __typename } }",
        crate::Variables::new(),
    )
    .await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(
        data,
        serde_json::json!({"mechanicalHero": {"__typename": "Droid"}}),
    );
}
