use std::collections::{HashMap, HashSet};

use crate::{
    ast::{Definition, Document, Fragment, FragmentSpread, Operation},
    parser::Spanning,
    validation::{ValidatorContext, Visitor},
};

use super::Scope;

pub const RULE: &str = "NoUnusedFragments";

pub fn factory<'a>() -> NoUnusedFragments<'a> {
    NoUnusedFragments {
        spreads: HashMap::new(),
        defined_fragments: HashSet::new(),
        current_scope: None,
    }
}

pub struct NoUnusedFragments<'a> {
    spreads: HashMap<Scope<'a>, Vec<&'a str>>,
    defined_fragments: HashSet<Spanning<&'a str>>,
    current_scope: Option<Scope<'a>>,
}

impl<'a> NoUnusedFragments<'a> {
    fn find_reachable_fragments(
        &self,
        from: &Scope<'a>,
        result: &mut HashSet<&'a str>,
    ) {
        if let Scope::Fragment(name) = *from {
            if result.contains(name) {
                return;
            }
            result.insert(name);
        }

        if let Some(spreads) = self.spreads.get(from) {
            for spread in spreads {
                self.find_reachable_fragments(&Scope::Fragment(*spread), result);
            }
        }
    }
}

impl<'a> Visitor<'a> for NoUnusedFragments<'a> {
    fn exit_document(&mut self, ctx: &mut ValidatorContext<'a>, defs: &'a Document<'a>) {
        let mut reachable = HashSet::new();

        for def in defs {
            if let Definition::Operation(Spanning {
                item: Operation { name, .. },
                ..
            }) = def
            {
                let op_name = name.map(|s| s.item);
                self.find_reachable_fragments(&Scope::Operation(op_name), &mut reachable);
            }
        }

        for fragment in self
            .defined_fragments
            .iter()
            .filter(|f| !reachable.contains(&f.item))
        {
            ctx.report_error(
                RULE,
                &error_message(fragment.item),
                &[fragment.span.start],
            );
        }
    }

    fn enter_operation_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        op: &'a Spanning<Operation<'a>>,
    ) {
        let op_name = op.item.name.map(|s| s.item);
        self.current_scope = Some(Scope::Operation(op_name));
    }

    fn enter_fragment_definition(
        &mut self,
        _: &mut ValidatorContext<'a>,
        f: &'a Spanning<Fragment<'a>>,
    ) {
        self.current_scope = Some(Scope::Fragment(f.item.name.item));
        self.defined_fragments
            .insert(Spanning::new(f.span, f.item.name.item));
    }

    fn enter_fragment_spread(
        &mut self,
        _: &mut ValidatorContext<'a>,
        spread: &'a Spanning<FragmentSpread<'a>>,
    ) {
        if let Some(scope) = &self.current_scope {
            self.spreads
                .entry(scope.clone())
                .or_default()
                .push(spread.item.name.item);
        }
    }
}

fn error_message(frag_name: &str) -> String {
    format!("Fragment \"{frag_name}\" is never used")
}

#[cfg(test)]
mod tests {
    use super::{RULE, error_message, factory};

    use crate::{
        parser::SourcePosition,
        validation::{RuleError, expect_fails_rule, expect_passes_rule},
    };

    #[test]
    fn all_fragments_used() {
        expect_passes_rule(
            factory,
            "{ human { ...HumanFields } } fragment HumanFields on Human { name ...NameHolder } fragment NameHolder on Being { name }",
        );
    }

    #[test]
    fn unused_fragment_is_reported() {
        expect_fails_rule(
            factory,
            "{ human { name } } fragment Unused on Human { name }",
            &[RuleError::new(
                RULE,
                &error_message("Unused"),
                &[SourcePosition::new(19, 0, 19)],
            )],
        );
    }

    #[test]
    fn fragment_only_referenced_by_unused_fragment() {
        expect_fails_rule(
            factory,
            "{ human { name } } fragment FragA on Human { ...FragB } fragment FragB on Human { name }",
            &[
                RuleError::new(RULE, &error_message("FragA"), &[SourcePosition::new(19, 0, 19)]),
                RuleError::new(RULE, &error_message("FragB"), &[SourcePosition::new(56, 0, 56)]),
            ],
        );
    }
}
