//! Dispatches a plan tree to upstream services and stitches the responses.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use crate::{
    executor::{ExecutionError, FieldResult, PathSegment},
    value::Value,
};

use super::{
    plan::{PathStep, Plan},
    planner::FEDERATION_FIELD,
    wire::{SubgraphRequest, SubgraphResponse, WireSelection},
};

/// The transport the gateway speaks to one upstream service over.
///
/// Implementations wrap whatever RPC mechanism reaches the service; tests
/// use in-process mocks.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
    /// Sends one subquery to the named service.
    async fn send(&self, service: &str, request: SubgraphRequest)
    -> FieldResult<SubgraphResponse>;
}

/// Executes a plan tree, returning the stitched response value and the
/// adopted upstream errors.
///
/// Children are dispatched in plan order; a failed fetch surfaces as an
/// error while the rest of the tree continues, so partial data is still
/// stitched.
pub async fn execute_plan(
    plan: &Plan<'_>,
    transport: &dyn ServiceTransport,
) -> (Value, Vec<ExecutionError>) {
    let mut data = Value::Object(crate::value::Object::with_capacity(
        plan.selection_set.len(),
    ));
    let mut errors = Vec::new();

    resolve_root_selections(plan, &mut data, &mut errors);

    for child in &plan.children {
        dispatch(child, &mut data, &mut errors, transport).await;
    }

    strip_federation_markers(&mut data);

    (data, errors)
}

/// Resolves the selections the root plan node kept for itself.
///
/// The gateway's root dispatches nothing, but the planner still routes
/// synthetic selections (a top-level `__typename`, say) to it; they must
/// appear in the stitched response like every other selected field.
fn resolve_root_selections(
    plan: &Plan<'_>,
    data: &mut Value,
    errors: &mut Vec<ExecutionError>,
) {
    let Some(root) = data.as_mut_object_value() else {
        return;
    };

    for selection in &plan.selection_set {
        let crate::ast::Selection::Field(field) = selection else {
            continue;
        };

        let alias = field.item.response_name();
        match field.item.name.item {
            "__typename" => {
                root.add_field(alias, Value::String(plan.parent_type.to_string()));
            }
            name => {
                errors.push(ExecutionError::new(
                    crate::parser::SourcePosition::new_origin(),
                    vec![PathSegment::Field(alias.into())],
                    format!("the gateway cannot resolve field {name:?}").into(),
                ));
                root.add_field(alias, Value::Null);
            }
        }
    }
}

fn dispatch<'g>(
    node: &'g Plan<'_>,
    data: &'g mut Value,
    errors: &'g mut Vec<ExecutionError>,
    transport: &'g dyn ServiceTransport,
) -> BoxFuture<'g, ()> {
    Box::pin(async move {
        let anchors = resolve_anchors(data, &node.path);

        debug!(
            service = node.service.as_str(),
            anchors = anchors.len(),
            "dispatching plan node",
        );

        for (anchor_path, representation) in anchors {
            let request = SubgraphRequest {
                kind: node.operation_kind,
                selection_set: node
                    .selection_set
                    .iter()
                    .map(WireSelection::from_selection)
                    .collect(),
                representation,
            };

            match transport.send(&node.service, request).await {
                Ok(response) => {
                    // Partial data is still stitched; upstream errors are
                    // adopted with their paths prefixed by this node's
                    // anchor.
                    for wire_error in response.errors {
                        let mut path = anchor_path.clone();
                        path.extend(wire_error.path);
                        errors.push(ExecutionError::new(
                            crate::parser::SourcePosition::new_origin(),
                            path,
                            wire_error.message.into(),
                        ));
                    }

                    merge_at(data, &anchor_path, response.data.into());
                }
                Err(e) => {
                    errors.push(ExecutionError::new(
                        crate::parser::SourcePosition::new_origin(),
                        anchor_path.clone(),
                        e,
                    ));
                }
            }
        }

        for child in &node.children {
            dispatch(child, data, errors, transport).await;
        }
    })
}

/// Finds the concrete positions a node path points at in the stitched data,
/// together with each anchor's rehydration key.
///
/// `Field` steps descend by alias and map across list elements; `Type`
/// steps keep only objects whose runtime `__typename` matches.
fn resolve_anchors(
    data: &Value,
    path: &[PathStep],
) -> Vec<(Vec<PathSegment>, Option<serde_json::Value>)> {
    let mut out = Vec::new();
    walk_anchors(data, path, Vec::new(), &mut out);
    out
}

fn walk_anchors(
    value: &Value,
    steps: &[PathStep],
    concrete: Vec<PathSegment>,
    out: &mut Vec<(Vec<PathSegment>, Option<serde_json::Value>)>,
) {
    let Some(step) = steps.first() else {
        let representation = value
            .as_object_value()
            .and_then(|o| o.get_field_value(FEDERATION_FIELD))
            .and_then(|v| serde_json::to_value(v).ok());
        out.push((concrete, representation));
        return;
    };

    match step {
        PathStep::Field(name) => {
            let Some(child) = value.as_object_value().and_then(|o| o.get_field_value(name))
            else {
                return;
            };
            match child {
                Value::List(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        let mut concrete = concrete.clone();
                        concrete.push(PathSegment::Field(name.clone()));
                        concrete.push(PathSegment::Index(i));
                        walk_anchors(element, &steps[1..], concrete, out);
                    }
                }
                Value::Null => {}
                other => {
                    let mut concrete = concrete;
                    concrete.push(PathSegment::Field(name.clone()));
                    walk_anchors(other, &steps[1..], concrete, out);
                }
            }
        }
        PathStep::Type(type_name) => {
            let matches = value
                .as_object_value()
                .and_then(|o| o.get_field_value("__typename"))
                .and_then(Value::as_string_value)
                == Some(type_name);
            if matches {
                walk_anchors(value, &steps[1..], concrete, out);
            }
        }
    }
}

/// Merges `incoming` into the object at `path`; object fields merge
/// recursively, everything else replaces.
fn merge_at(data: &mut Value, path: &[PathSegment], incoming: Value) {
    let Some(target) = descend_mut(data, path) else {
        return;
    };

    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (k, v) in incoming {
                existing.add_field(k, v);
            }
        }
        (target, incoming) => *target = incoming,
    }
}

fn descend_mut<'v>(value: &'v mut Value, path: &[PathSegment]) -> Option<&'v mut Value> {
    let Some(step) = path.first() else {
        return Some(value);
    };

    let child = match step {
        PathSegment::Field(name) => value.as_mut_object_value()?.get_mut_field_value(name)?,
        PathSegment::Index(i) => value.as_mut_list_value()?.get_mut(*i)?,
    };

    descend_mut(child, &path[1..])
}

fn strip_federation_markers(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            obj.remove_field(FEDERATION_FIELD);
            for (_, v) in obj.iter_mut() {
                strip_federation_markers(v);
            }
        }
        Value::List(items) => {
            for v in items {
                strip_federation_markers(v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        executor::PathSegment,
        federation::plan::PathStep,
        value::{Object, Value},
    };

    use super::{merge_at, resolve_anchors, strip_federation_markers};

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::Object(pairs.into_iter().collect::<Object>())
    }

    #[test]
    fn anchors_descend_fields_and_map_lists() {
        let data = obj(vec![(
            "humans",
            Value::List(vec![
                obj(vec![("__federation", Value::String("h1".into()))]),
                obj(vec![("__federation", Value::String("h2".into()))]),
            ]),
        )]);

        let anchors = resolve_anchors(&data, &[PathStep::Field("humans".into())]);
        assert_eq!(anchors.len(), 2);
        assert_eq!(
            anchors[0].0,
            vec![
                PathSegment::Field("humans".into()),
                PathSegment::Index(0),
            ],
        );
        assert_eq!(anchors[0].1, Some(serde_json::json!("h1")));
        assert_eq!(anchors[1].1, Some(serde_json::json!("h2")));
    }

    #[test]
    fn type_steps_filter_by_runtime_typename() {
        let data = obj(vec![(
            "node",
            obj(vec![("__typename", Value::String("Droid".into()))]),
        )]);

        let hit = resolve_anchors(
            &data,
            &[
                PathStep::Field("node".into()),
                PathStep::Type("Droid".into()),
            ],
        );
        assert_eq!(hit.len(), 1);

        let miss = resolve_anchors(
            &data,
            &[
                PathStep::Field("node".into()),
                PathStep::Type("Human".into()),
            ],
        );
        assert!(miss.is_empty());
    }

    #[test]
    fn merge_combines_objects_and_strips_markers() {
        let mut data = obj(vec![(
            "human",
            obj(vec![
                ("id", Value::String("1".into())),
                ("__federation", Value::String("h1".into())),
            ]),
        )]);

        merge_at(
            &mut data,
            &[PathSegment::Field("human".into())],
            obj(vec![("age", Value::Int(32))]),
        );
        strip_federation_markers(&mut data);

        let human = data.as_object_value().unwrap().get_field_value("human").unwrap();
        let human = human.as_object_value().unwrap();
        assert_eq!(human.get_field_value("age"), Some(&Value::Int(32)));
        assert_eq!(human.get_field_value("id"), Some(&Value::String("1".into())));
        assert!(human.get_field_value("__federation").is_none());
    }
}
