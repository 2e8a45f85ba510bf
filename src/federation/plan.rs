//! The plan tree a federated query decomposes into.

use arcstr::ArcStr;
use serde::Serialize;

use crate::{
    ast::{OperationType, Selection},
    federation::wire::WireSelection,
};

/// One step of a plan node's path into the stitched response.
///
/// `Field` steps descend by response alias (mapping across list elements);
/// `Type` steps discriminate by the runtime `__typename` at stitch time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name")]
pub enum PathStep {
    /// Descend into the field with this response alias.
    Field(String),
    /// Applies only to objects whose runtime type matches.
    Type(String),
}

/// A node of the federation plan: one service-bound subquery plus the child
/// plans that depend on its data.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan<'a> {
    /// Where this node's data lands in the stitched response, root-to-leaf
    /// after [`Plan::reverse_paths`] ran.
    pub path: Vec<PathStep>,
    /// The upstream service this node's subquery is dispatched to. Empty on
    /// the gateway's root node, which dispatches nothing itself.
    pub service: ArcStr,
    /// The kind of operation the subquery runs as.
    pub operation_kind: OperationType,
    /// The type the subquery's selection set anchors on.
    pub parent_type: ArcStr,
    /// The selection set sent to the service.
    pub selection_set: Vec<Selection<'a>>,
    /// Plans that consume this node's data.
    pub children: Vec<Plan<'a>>,
}

impl Plan<'_> {
    /// Reverses every node's path in one final pass.
    ///
    /// Paths are built bottom-up while planning (a cheap append per level);
    /// consumers traverse them root-to-leaf, so the whole tree is flipped
    /// exactly once here. Applying the pass twice restores the original
    /// order.
    pub(crate) fn reverse_paths(&mut self) {
        self.path.reverse();
        for child in &mut self.children {
            child.reverse_paths();
        }
    }

    /// Whether any node of this subtree is bound to a service.
    pub fn has_fetches(&self) -> bool {
        !self.service.is_empty() || self.children.iter().any(Plan::has_fetches)
    }
}

impl Serialize for Plan<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("Plan", 6)?;
        s.serialize_field("path", &self.path)?;
        s.serialize_field("service", self.service.as_str())?;
        s.serialize_field("operationKind", &self.operation_kind)?;
        s.serialize_field("parentType", self.parent_type.as_str())?;
        s.serialize_field(
            "selectionSet",
            &self
                .selection_set
                .iter()
                .map(WireSelection::from_selection)
                .collect::<Vec<_>>(),
        )?;
        s.serialize_field("children", &self.children)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{PathStep, Plan};
    use crate::ast::OperationType;

    fn node<'a>(path: Vec<PathStep>, children: Vec<Plan<'a>>) -> Plan<'a> {
        Plan {
            path,
            service: "svc".into(),
            operation_kind: OperationType::Query,
            parent_type: "Query".into(),
            selection_set: vec![],
            children,
        }
    }

    #[test]
    fn path_reversal_is_an_involution() {
        let original = node(
            vec![PathStep::Field("a".into()), PathStep::Type("T".into())],
            vec![node(
                vec![
                    PathStep::Field("b".into()),
                    PathStep::Field("c".into()),
                    PathStep::Type("U".into()),
                ],
                vec![],
            )],
        );

        let mut once = original.clone();
        once.reverse_paths();
        assert_eq!(
            once.path,
            vec![PathStep::Type("T".into()), PathStep::Field("a".into())],
        );

        let mut twice = once.clone();
        twice.reverse_paths();
        assert_eq!(twice, original);
    }
}
