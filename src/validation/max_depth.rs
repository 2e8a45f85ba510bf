//! Operation depth limiting.
//!
//! Runs before every other rule; when the bound is exceeded, validation
//! stops and only the depth errors are returned. Fragment spreads are
//! transparent: a spread's selections count at the depth of the spread
//! site. A visited set keeps cyclic fragment graphs from recursing (those
//! cycles are reported by their own rule).

use std::collections::HashMap;

use crate::{
    ast::{Definition, Document, Fragment, Selection},
    parser::SourcePosition,
    validation::RuleError,
};

const RULE: &str = "MaxDepth";

pub(crate) fn check_max_depth(document: &Document<'_>, max_depth: usize) -> Vec<RuleError> {
    let mut fragments = HashMap::new();
    for def in document {
        if let Definition::Fragment(f) = def {
            fragments.insert(f.item.name.item, &f.item);
        }
    }

    let mut errors = Vec::new();

    for def in document {
        if let Definition::Operation(op) = def {
            let mut walk = DepthWalk {
                fragments: &fragments,
                max_depth,
                errors: &mut errors,
                fragment_stack: Vec::new(),
            };
            walk.selection_set(&op.item.selection_set, 1);
        }
    }

    errors.sort();
    errors.dedup();
    errors
}

struct DepthWalk<'e, 'a> {
    fragments: &'e HashMap<&'a str, &'e Fragment<'a>>,
    max_depth: usize,
    errors: &'e mut Vec<RuleError>,
    fragment_stack: Vec<&'a str>,
}

impl<'a> DepthWalk<'_, 'a> {
    fn selection_set(&mut self, selections: &[Selection<'a>], depth: usize) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    if let Some(sub) = &field.item.selection_set {
                        if depth >= self.max_depth {
                            self.exceeded(field.span.start);
                        } else {
                            self.selection_set(sub, depth + 1);
                        }
                    }
                }
                // Fragments are transparent: their selections count at the
                // spread site's depth.
                Selection::InlineFragment(inline) => {
                    self.selection_set(&inline.item.selection_set, depth);
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.item.name.item;
                    if self.fragment_stack.contains(&name) {
                        continue;
                    }
                    if let Some(fragment) = self.fragments.get(name) {
                        self.fragment_stack.push(name);
                        self.selection_set(&fragment.selection_set, depth);
                        self.fragment_stack.pop();
                    }
                }
            }
        }
    }

    fn exceeded(&mut self, position: SourcePosition) {
        self.errors.push(RuleError::new(
            RULE,
            &format!("Operation exceeds the maximum depth of {}", self.max_depth),
            &[position],
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_document_source;

    use super::check_max_depth;

    #[test]
    fn depth_within_bound_passes() {
        let doc = parse_document_source("{ a { b { c } } }").unwrap();
        assert_eq!(check_max_depth(&doc, 3), vec![]);
    }

    #[test]
    fn depth_beyond_bound_fails() {
        let doc = parse_document_source("{ a { b { c { d } } } }").unwrap();
        let errors = check_max_depth(&doc, 3);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule(), "MaxDepth");
    }

    #[test]
    fn fragments_are_transparent() {
        let doc = parse_document_source(
            "query Q { a { ...F } } fragment F on T { b { c { d } } }",
        )
        .unwrap();
        assert_eq!(check_max_depth(&doc, 4), vec![]);
        assert_eq!(check_max_depth(&doc, 3).len(), 1);
    }

    #[test]
    fn cyclic_fragments_do_not_hang() {
        let doc = parse_document_source(
            "{ x { ...A } } fragment A on T { y { ...A } }",
        )
        .unwrap();
        check_max_depth(&doc, 10);
    }
}
