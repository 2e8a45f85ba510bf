//! Shared fixture schema and assertion helpers for the rule tests.

use std::sync::{Arc, OnceLock};

use crate::{
    ast::{InputValue, Type},
    parser::parse_document_source,
    schema::{
        meta::{Argument, EnumMeta, EnumValue, Field, InterfaceMeta, InputObjectMeta, ObjectMeta, UnionMeta},
        model::SchemaType,
    },
    validation::{
        MultiVisitorNil, RuleError, ValidatorContext, Visitor, visit,
    },
};

fn named(name: &str) -> Type<'static> {
    Type::Named(name.to_string().into())
}

fn non_null(name: &str) -> Type<'static> {
    Type::NonNullNamed(name.to_string().into())
}

fn list_of(inner: Type<'static>) -> Type<'static> {
    Type::List(Box::new(inner))
}

fn name_field() -> Field {
    Field::new("name", named("String"))
        .argument(Argument::new("surname", named("Boolean")))
}

pub(crate) fn fixture_schema() -> &'static Arc<SchemaType> {
    static SCHEMA: OnceLock<Arc<SchemaType>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let types = vec![
            InterfaceMeta::new("Being", vec![name_field()]).into_meta(),
            InterfaceMeta::new("Pet", vec![name_field()]).into_meta(),
            InterfaceMeta::new("Canine", vec![name_field()]).into_meta(),
            InterfaceMeta::new("Intelligent", vec![Field::new("iq", named("Int"))]).into_meta(),
            EnumMeta::new(
                "DogCommand",
                ["SIT", "HEEL", "DOWN"].into_iter().map(EnumValue::new).collect(),
            )
            .into_meta(),
            EnumMeta::new(
                "FurColor",
                ["BROWN", "BLACK", "TAN", "SPOTTED"]
                    .into_iter()
                    .map(EnumValue::new)
                    .collect(),
            )
            .into_meta(),
            ObjectMeta::new(
                "Dog",
                vec![
                    name_field(),
                    Field::new("nickname", named("String")),
                    Field::new("barkVolume", named("Int")),
                    Field::new("barks", named("Boolean")),
                    Field::new("doesKnowCommand", named("Boolean"))
                        .argument(Argument::new("dogCommand", named("DogCommand"))),
                    Field::new("isHousetrained", named("Boolean")).argument(
                        Argument::new("atOtherHomes", named("Boolean"))
                            .default_value(InputValue::boolean(true)),
                    ),
                    Field::new("isAtLocation", named("Boolean"))
                        .argument(Argument::new("x", named("Int")))
                        .argument(Argument::new("y", named("Int"))),
                ],
            )
            .interfaces(&["Being", "Pet", "Canine"])
            .into_meta(),
            ObjectMeta::new(
                "Cat",
                vec![
                    name_field(),
                    Field::new("nickname", named("String")),
                    Field::new("meows", named("Boolean")),
                    Field::new("meowVolume", named("Int")),
                    Field::new("furColor", named("FurColor")),
                ],
            )
            .interfaces(&["Being", "Pet"])
            .into_meta(),
            UnionMeta::new("CatOrDog", &["Cat", "Dog"]).into_meta(),
            ObjectMeta::new(
                "Human",
                vec![
                    name_field(),
                    Field::new("pets", list_of(named("Pet"))),
                    Field::new("relatives", list_of(named("Human"))),
                    Field::new("iq", named("Int")),
                ],
            )
            .interfaces(&["Being", "Intelligent"])
            .into_meta(),
            ObjectMeta::new(
                "Alien",
                vec![
                    name_field(),
                    Field::new("iq", named("Int")),
                    Field::new("numEyes", named("Int")),
                ],
            )
            .interfaces(&["Being", "Intelligent"])
            .into_meta(),
            UnionMeta::new("DogOrHuman", &["Dog", "Human"]).into_meta(),
            UnionMeta::new("HumanOrAlien", &["Human", "Alien"]).into_meta(),
            InputObjectMeta::new(
                "ComplexInput",
                vec![
                    Argument::new("requiredField", non_null("Boolean")),
                    Argument::new("intField", named("Int")),
                    Argument::new("stringField", named("String")),
                    Argument::new("booleanField", named("Boolean")),
                    Argument::new("stringListField", list_of(named("String"))),
                ],
            )
            .into_meta(),
            ObjectMeta::new(
                "ComplicatedArgs",
                vec![
                    Field::new("intArgField", named("String"))
                        .argument(Argument::new("intArg", named("Int"))),
                    Field::new("int32ArgField", named("String"))
                        .argument(Argument::new("int32Arg", named("Int32"))),
                    Field::new("nonNullIntArgField", named("String"))
                        .argument(Argument::new("nonNullIntArg", non_null("Int"))),
                    Field::new("stringArgField", named("String"))
                        .argument(Argument::new("stringArg", named("String"))),
                    Field::new("booleanArgField", named("String"))
                        .argument(Argument::new("booleanArg", named("Boolean"))),
                    Field::new("enumArgField", named("String"))
                        .argument(Argument::new("enumArg", named("FurColor"))),
                    Field::new("floatArgField", named("String"))
                        .argument(Argument::new("floatArg", named("Float"))),
                    Field::new("idArgField", named("String"))
                        .argument(Argument::new("idArg", named("ID"))),
                    Field::new("stringListArgField", named("String"))
                        .argument(Argument::new("stringListArg", list_of(named("String")))),
                    Field::new("complexArgField", named("String"))
                        .argument(Argument::new("complexArg", named("ComplexInput"))),
                    Field::new("multipleReqs", named("String"))
                        .argument(Argument::new("req1", non_null("Int")))
                        .argument(Argument::new("req2", non_null("Int"))),
                    Field::new("multipleOpts", named("String"))
                        .argument(
                            Argument::new("opt1", named("Int")).default_value(InputValue::int(0)),
                        )
                        .argument(
                            Argument::new("opt2", named("Int")).default_value(InputValue::int(0)),
                        ),
                ],
            )
            .into_meta(),
            ObjectMeta::new(
                "QueryRoot",
                vec![
                    Field::new("human", named("Human"))
                        .argument(Argument::new("id", named("ID"))),
                    Field::new("alien", named("Alien")),
                    Field::new("dog", named("Dog")),
                    Field::new("cat", named("Cat")),
                    Field::new("pet", named("Pet")),
                    Field::new("being", named("Being")),
                    Field::new("catOrDog", named("CatOrDog")),
                    Field::new("dogOrHuman", named("DogOrHuman")),
                    Field::new("humanOrAlien", named("HumanOrAlien")),
                    Field::new("complicatedArgs", named("ComplicatedArgs")),
                ],
            )
            .into_meta(),
            ObjectMeta::new(
                "MutationRoot",
                vec![Field::new("testField", named("String"))],
            )
            .into_meta(),
            ObjectMeta::new(
                "SubscriptionRoot",
                vec![
                    Field::new("newMessage", named("String")),
                    Field::new("disturbance", named("Int")),
                ],
            )
            .into_meta(),
        ];

        Arc::new(SchemaType::new(
            types,
            "QueryRoot",
            Some("MutationRoot"),
            Some("SubscriptionRoot"),
        ))
    })
}

fn run_rule<'a, V, F>(factory: F, q: &'a str) -> Vec<RuleError>
where
    V: Visitor<'a> + 'a,
    F: Fn() -> V,
{
    let schema = fixture_schema();
    let doc =
        parse_document_source(q).unwrap_or_else(|e| panic!("parse error on {q:#?}: {e}"));

    let mut ctx = ValidatorContext::new(schema, &doc);
    let mut mv = MultiVisitorNil.with(factory());
    // The document only borrows from `q` (lifetime `'a`), but the local
    // binding itself cannot be named `'a`; stretch the reference for the
    // duration of the visit.
    visit(&mut mv, &mut ctx, unsafe {
        std::mem::transmute::<&crate::ast::Document<'a>, &'a crate::ast::Document<'a>>(&doc)
    });
    ctx.into_errors()
}

pub(crate) fn expect_passes_rule<'a, V, F>(factory: F, q: &'a str)
where
    V: Visitor<'a> + 'a,
    F: Fn() -> V,
{
    let errs = run_rule(factory, q);
    if !errs.is_empty() {
        print_errors(&errs);
        panic!("expected rule to pass, but errors found");
    }
}

pub(crate) fn expect_fails_rule<'a, V, F>(factory: F, q: &'a str, expected_errors: &[RuleError])
where
    V: Visitor<'a> + 'a,
    F: Fn() -> V,
{
    let errs = run_rule(factory, q);
    if errs.is_empty() {
        panic!("expected rule to fail, but no errors were found");
    }

    let mut expected = expected_errors.to_vec();
    expected.sort();
    if errs != expected {
        println!("actual:");
        print_errors(&errs);
        println!("expected:");
        print_errors(&expected);
        panic!("expected rule to fail with specific errors");
    }
}

fn print_errors(errs: &[RuleError]) {
    for err in errs {
        for p in err.locations() {
            print!("[{:>3},{:>3},{:>3}]  ", p.index(), p.line(), p.column());
        }
        println!("{}", err.message());
    }
}
