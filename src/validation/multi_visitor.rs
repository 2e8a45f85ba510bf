use crate::{
    ast::{
        Directive, Document, Field, Fragment, FragmentSpread, InlineFragment, InputValue,
        Operation, Selection, VariableDefinition,
    },
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

#[doc(hidden)]
pub struct MultiVisitorNil;

impl MultiVisitorNil {
    pub fn with<V>(self, visitor: V) -> MultiVisitorCons<V, Self> {
        MultiVisitorCons(visitor, self)
    }
}

#[doc(hidden)]
pub struct MultiVisitorCons<A, B>(A, B);

impl<A, B> MultiVisitorCons<A, B> {
    pub fn with<V>(self, visitor: V) -> MultiVisitorCons<V, Self> {
        MultiVisitorCons(visitor, self)
    }
}

impl<'a> Visitor<'a> for MultiVisitorNil {}

// Forwards every callback to both halves of the cons cell; all payloads are
// `Copy` references.
macro_rules! forward {
    ($($name:ident: $Ty:ty;)*) => {
        $(
            fn $name(&mut self, ctx: &mut ValidatorContext<'a>, v: $Ty) {
                self.0.$name(ctx, v);
                self.1.$name(ctx, v);
            }
        )*
    };
}

impl<'a, A, B> Visitor<'a> for MultiVisitorCons<A, B>
where
    A: Visitor<'a> + 'a,
    B: Visitor<'a> + 'a,
{
    forward! {
        enter_document: &'a Document<'a>;
        exit_document: &'a Document<'a>;
        enter_operation_definition: &'a Spanning<Operation<'a>>;
        exit_operation_definition: &'a Spanning<Operation<'a>>;
        enter_fragment_definition: &'a Spanning<Fragment<'a>>;
        exit_fragment_definition: &'a Spanning<Fragment<'a>>;
        enter_variable_definition: &'a (Spanning<&'a str>, VariableDefinition<'a>);
        exit_variable_definition: &'a (Spanning<&'a str>, VariableDefinition<'a>);
        enter_directive: &'a Spanning<Directive<'a>>;
        exit_directive: &'a Spanning<Directive<'a>>;
        enter_argument: &'a (Spanning<&'a str>, Spanning<InputValue>);
        exit_argument: &'a (Spanning<&'a str>, Spanning<InputValue>);
        enter_selection_set: &'a [Selection<'a>];
        exit_selection_set: &'a [Selection<'a>];
        enter_field: &'a Spanning<Field<'a>>;
        exit_field: &'a Spanning<Field<'a>>;
        enter_fragment_spread: &'a Spanning<FragmentSpread<'a>>;
        exit_fragment_spread: &'a Spanning<FragmentSpread<'a>>;
        enter_inline_fragment: &'a Spanning<InlineFragment<'a>>;
        exit_inline_fragment: &'a Spanning<InlineFragment<'a>>;
        enter_null_value: Spanning<()>;
        exit_null_value: Spanning<()>;
        enter_int_value: Spanning<i64>;
        exit_int_value: Spanning<i64>;
        enter_float_value: Spanning<f64>;
        exit_float_value: Spanning<f64>;
        enter_string_value: Spanning<&'a str>;
        exit_string_value: Spanning<&'a str>;
        enter_boolean_value: Spanning<bool>;
        exit_boolean_value: Spanning<bool>;
        enter_enum_value: Spanning<&'a str>;
        exit_enum_value: Spanning<&'a str>;
        enter_variable_value: Spanning<&'a str>;
        exit_variable_value: Spanning<&'a str>;
        enter_list_value: Spanning<&'a Vec<Spanning<InputValue>>>;
        exit_list_value: Spanning<&'a Vec<Spanning<InputValue>>>;
        enter_object_value: Spanning<&'a Vec<(Spanning<String>, Spanning<InputValue>)>>;
        exit_object_value: Spanning<&'a Vec<(Spanning<String>, Spanning<InputValue>)>>;
        enter_object_field: &'a (Spanning<String>, Spanning<InputValue>);
        exit_object_field: &'a (Spanning<String>, Spanning<InputValue>);
    }
}
