//! Decomposes a validated query into per-service plans.

use std::collections::HashMap;

use arcstr::ArcStr;
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    ast::{Field, Fragment, OperationType, Selection},
    parser::Spanning,
    schema::meta::MetaType,
};

use super::{
    flatten::normalize,
    plan::{PathStep, Plan},
    schema::FederatedSchema,
};

/// The gateway's rehydration marker field.
pub const FEDERATION_FIELD: &str = "__federation";

/// Why a query could not be planned.
#[derive(Clone, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
pub enum PlanError {
    /// A response alias is selected twice with differing fields or
    /// arguments.
    #[display("field {_0:?} is selected more than once with conflicting arguments")]
    ConflictingFields(#[error(not(source))] String),

    /// A named fragment is spread twice on the same type.
    #[display("fragment {_0:?} is spread more than once on the same type")]
    DuplicateFragment(#[error(not(source))] String),

    /// Resolving one object requires round-trips through three or more
    /// services.
    #[display("resolving {_0:?} requires fetches from more than two services on the same object")]
    TooManyServiceHops(#[error(not(source))] String),

    /// A mutation would have to invoke more than one downstream service.
    #[display("a federated mutation may invoke at most one downstream service")]
    MutationSpansServices,

    /// A user selection reuses the gateway's reserved `__federation` alias.
    #[display("the alias \"__federation\" is reserved for the gateway")]
    FederationAliasConflict,

    /// A selected field is not claimed by any service.
    #[display("no service can resolve field {_0:?} on type {_1:?}")]
    UnknownField(#[error(not(source))] String, String),
}

/// Plans a validated operation against the merged schema.
///
/// Produces the gateway's root plan node whose children are the
/// service-bound subqueries; paths come out reversed into root-to-leaf
/// order.
pub fn plan<'a>(
    schema: &FederatedSchema,
    operation_kind: OperationType,
    selections: &[Selection<'a>],
    fragments: &HashMap<&'a str, &'a Fragment<'a>>,
) -> Result<Plan<'a>, PlanError> {
    let root_meta = match operation_kind {
        OperationType::Query | OperationType::Subscription => schema.schema().query_type(),
        OperationType::Mutation => schema
            .schema()
            .mutation_type()
            .expect("mutation planned against a schema without a mutation root"),
    };

    let normalized = normalize(schema.schema(), fragments, root_meta, selections)?;

    let planner = Planner { schema };
    let (selection_set, children) = planner.plan_selection_set(
        None,
        root_meta,
        normalized,
        false,
        operation_kind,
    )?;

    if operation_kind == OperationType::Mutation && children.len() > 1 {
        return Err(PlanError::MutationSpansServices);
    }

    let mut root = Plan {
        path: Vec::new(),
        service: ArcStr::new(),
        operation_kind,
        parent_type: root_meta.name().clone(),
        selection_set,
        children,
    };
    root.reverse_paths();

    debug!(children = root.children.len(), "planned federated operation");

    Ok(root)
}

struct Planner<'s> {
    schema: &'s FederatedSchema,
}

impl Planner<'_> {
    /// Plans one normalized selection set at `parent`, from the point of
    /// view of `service` (`None` at the gateway root, which owns nothing).
    ///
    /// Returns the selection set the current node sends (with the
    /// `__federation` marker injected when children depend on its data) and
    /// the child plans, each path still leaf-first.
    fn plan_selection_set<'a>(
        &self,
        service: Option<&ArcStr>,
        parent: &MetaType,
        selections: Vec<Selection<'a>>,
        hopped: bool,
        child_kind: OperationType,
    ) -> Result<(Vec<Selection<'a>>, Vec<Plan<'a>>), PlanError> {
        if parent.is_abstract() {
            return self.plan_abstract(service, parent, selections, hopped, child_kind);
        }

        let mut local: Vec<Selection<'a>> = Vec::new();
        let mut foreign: IndexMap<ArcStr, Vec<Selection<'a>>> = IndexMap::new();
        let mut children: Vec<Plan<'a>> = Vec::new();

        for selection in selections {
            let Selection::Field(field) = selection else {
                // Normalization leaves only fields under object parents.
                local.push(selection);
                continue;
            };

            let name = field.item.name.item;
            let owners = self.schema.services_for(parent.name(), name);

            // Synthetic selections stay wherever the current fetch runs;
            // otherwise the current service keeps every field it can.
            if name.starts_with("__") || service.is_some_and(|s| owners.contains(s)) {
                local.push(self.plan_local_field(service, parent, field, &mut children)?);
            } else if let Some(owner) = owners.first() {
                // Deterministic choice among claimants: owners are sorted.
                foreign
                    .entry(owner.clone())
                    .or_default()
                    .push(Selection::Field(field));
            } else {
                return Err(PlanError::UnknownField(
                    name.into(),
                    parent.name().to_string(),
                ));
            }
        }

        if !foreign.is_empty() {
            // At most two services may cooperate on one object: the one
            // resolving it and a single foreign extension. A second foreign
            // group, or an extension of an extension, is a third hop.
            if service.is_some() && foreign.len() + usize::from(hopped) > 1 {
                let first = foreign
                    .values()
                    .flatten()
                    .find_map(|s| match s {
                        Selection::Field(f) => Some(f.item.name.item),
                        _ => None,
                    })
                    .unwrap_or_default();
                return Err(PlanError::TooManyServiceHops(first.into()));
            }

            for (foreign_service, fields) in foreign {
                let (selection_set, sub_children) = self.plan_selection_set(
                    Some(&foreign_service),
                    parent,
                    fields,
                    true,
                    OperationType::Query,
                )?;

                children.push(Plan {
                    path: Vec::new(),
                    service: foreign_service,
                    operation_kind: child_kind,
                    parent_type: parent.name().clone(),
                    selection_set,
                    children: sub_children,
                });
            }

            // The marker tells the responding service to emit the
            // rehydration key the gateway feeds back into each child
            // subquery. Injection is idempotent.
            if service.is_some() {
                inject_federation_marker(&mut local)?;
            }
        }

        Ok((local, children))
    }

    /// Plans one locally-resolvable field, recursing into its
    /// sub-selections and re-anchoring any cross-service child plans under
    /// this field's alias.
    fn plan_local_field<'a>(
        &self,
        service: Option<&ArcStr>,
        parent: &MetaType,
        field: Spanning<Field<'a>>,
        children: &mut Vec<Plan<'a>>,
    ) -> Result<Selection<'a>, PlanError> {
        let Some(sub_selections) = field.item.selection_set.clone() else {
            return Ok(Selection::Field(field));
        };

        let inner = crate::executor::lookup_field(parent, field.item.name.item)
            .and_then(|f| {
                self.schema
                    .schema()
                    .concrete_type_by_name(f.field_type.innermost_name())
            });

        let Some(inner) = inner else {
            return Ok(Selection::Field(field));
        };

        let (sub_selections, sub_children) = self.plan_selection_set(
            service,
            inner,
            sub_selections,
            false,
            OperationType::Query,
        )?;

        let alias = field.item.response_name();
        for mut child in sub_children {
            child.path.push(PathStep::Field(alias.to_string()));
            children.push(child);
        }

        let mut field = field;
        field.item.selection_set = Some(sub_selections);
        Ok(Selection::Field(field))
    }

    /// At an abstract parent the normalized set is `__typename` plus one
    /// inline fragment per concrete member; each member plans on its own
    /// and records a type-discriminated path step.
    fn plan_abstract<'a>(
        &self,
        service: Option<&ArcStr>,
        parent: &MetaType,
        selections: Vec<Selection<'a>>,
        hopped: bool,
        child_kind: OperationType,
    ) -> Result<(Vec<Selection<'a>>, Vec<Plan<'a>>), PlanError> {
        let mut local = Vec::new();
        let mut children = Vec::new();

        for selection in selections {
            match selection {
                Selection::InlineFragment(mut inline) => {
                    let Some(cond) = inline.item.type_condition else {
                        local.push(Selection::InlineFragment(inline));
                        continue;
                    };
                    let Some(member) = self.schema.schema().concrete_type_by_name(cond.item)
                    else {
                        local.push(Selection::InlineFragment(inline));
                        continue;
                    };

                    let (member_selections, member_children) = self.plan_selection_set(
                        service,
                        member,
                        inline.item.selection_set,
                        hopped,
                        child_kind,
                    )?;

                    for mut child in member_children {
                        child.path.push(PathStep::Type(cond.item.to_string()));
                        children.push(child);
                    }

                    inline.item.selection_set = member_selections;
                    local.push(Selection::InlineFragment(inline));
                }
                other => local.push(other),
            }
        }

        Ok((local, children))
    }
}

fn inject_federation_marker(selections: &mut Vec<Selection<'_>>) -> Result<(), PlanError> {
    for selection in selections.iter() {
        if let Selection::Field(f) = selection {
            if f.item.response_name() == FEDERATION_FIELD {
                // Already present from a previous injection.
                if f.item.name.item == FEDERATION_FIELD && f.item.arguments.is_none() {
                    return Ok(());
                }
                return Err(PlanError::FederationAliasConflict);
            }
        }
    }

    selections.push(Selection::Field(Spanning::unlocated(Field {
        alias: None,
        name: Spanning::unlocated(FEDERATION_FIELD),
        arguments: None,
        directives: None,
        selection_set: None,
    })));

    Ok(())
}
