//! Query validation related methods and data structures.

mod context;
mod input_value;
mod max_depth;
mod multi_visitor;
mod rules;
mod traits;
mod visitor;

#[cfg(test)]
mod test_harness;

pub use self::{
    context::{RuleError, ValidatorContext},
    input_value::validate_input_values,
    multi_visitor::{MultiVisitorCons, MultiVisitorNil},
    rules::visit_all_rules,
    traits::Visitor,
    visitor::visit,
};

pub(crate) use self::max_depth::check_max_depth;

#[cfg(test)]
pub(crate) use self::test_harness::{expect_fails_rule, expect_passes_rule};

use crate::{ast::Document, schema::model::SchemaType};

/// Validates a parsed document against a schema.
///
/// All rule violations are collected and returned together. The depth bound
/// (when the schema configures one) is checked first; if it is exceeded, no
/// further validation runs and only the depth errors return. Variable values
/// are checked separately by [`validate_input_values`] once the operation is
/// bound to concrete variables.
pub fn validate<'a>(schema: &'a SchemaType, document: &'a Document<'a>) -> Vec<RuleError> {
    if let Some(max_depth) = schema.max_depth() {
        let depth_errors = check_max_depth(document, max_depth);
        if !depth_errors.is_empty() {
            return depth_errors;
        }
    }

    let mut ctx = ValidatorContext::new(schema, document);
    visit_all_rules(&mut ctx, document);
    ctx.into_errors()
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_document_source;

    use super::{test_harness::fixture_schema, validate};

    // The collected error set does not depend on the order definitions
    // appear in the document.
    #[test]
    fn validation_is_order_insensitive() {
        let schema = fixture_schema();

        let fragment_first = parse_document_source(
            "fragment F on Dog { unknownField } query Q($unused: Int) { dog { ...F } }",
        )
        .unwrap();
        let operation_first = parse_document_source(
            "query Q($unused: Int) { dog { ...F } } fragment F on Dog { unknownField }",
        )
        .unwrap();

        let mut a = validate(schema, &fragment_first)
            .into_iter()
            .map(|e| (e.rule(), e.message().to_string()))
            .collect::<Vec<_>>();
        let mut b = validate(schema, &operation_first)
            .into_iter()
            .map(|e| (e.rule(), e.message().to_string()))
            .collect::<Vec<_>>();
        a.sort();
        b.sort();

        assert!(!a.is_empty());
        assert_eq!(a, b);
    }
}
