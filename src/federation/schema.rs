//! The merged, service-annotated schema the planner consumes.

use std::{collections::BTreeSet, sync::Arc};

use arcstr::ArcStr;
use fnv::FnvHashMap;

use crate::schema::{meta::MetaType, model::SchemaType};

/// A schema merged from every federated service, with each field annotated
/// by the set of services that can resolve it.
pub struct FederatedSchema {
    schema: Arc<SchemaType>,
    field_services: FnvHashMap<(String, String), Vec<ArcStr>>,
}

/// Accumulates per-service schema descriptions into a [`FederatedSchema`].
///
/// Each service contributes the types it serves; a type present in several
/// services is merged field-by-field, with every contributing service
/// recorded as an owner of the fields it declares.
#[derive(Default)]
pub struct FederatedSchemaBuilder {
    types: Vec<(String, MetaType)>,
    field_services: FnvHashMap<(String, String), BTreeSet<ArcStr>>,
}

impl FederatedSchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one service's types to the merged schema.
    #[must_use]
    pub fn service(mut self, service: impl Into<ArcStr>, types: Vec<MetaType>) -> Self {
        let service = service.into();

        for meta in types {
            let type_name = meta.name().to_string();

            let fields = match &meta {
                MetaType::Object(o) => Some(&o.fields),
                MetaType::Interface(i) => Some(&i.fields),
                _ => None,
            };
            if let Some(fields) = fields {
                for field in fields {
                    self.field_services
                        .entry((type_name.clone(), field.name.to_string()))
                        .or_default()
                        .insert(service.clone());
                }
            }

            match self
                .types
                .iter_mut()
                .find(|(name, _)| *name == type_name)
            {
                // Another service extends an already-known type: merge the
                // fields it declares into the existing meta.
                Some((_, existing)) => match (existing, meta) {
                    (MetaType::Object(existing), MetaType::Object(mut extension)) => {
                        for field in extension.fields.drain(..) {
                            if existing.fields.iter().all(|f| f.name != field.name) {
                                existing.fields.push(field);
                            }
                        }
                    }
                    (MetaType::Interface(existing), MetaType::Interface(mut extension)) => {
                        for field in extension.fields.drain(..) {
                            if existing.fields.iter().all(|f| f.name != field.name) {
                                existing.fields.push(field);
                            }
                        }
                    }
                    // Scalars, enums, unions, and input objects are taken
                    // from whichever service declared them first.
                    _ => {}
                },
                None => {
                    self.types.push((type_name, meta));
                }
            }
        }

        self
    }

    /// Builds the merged schema with the given root type names.
    pub fn finish(
        self,
        query: &str,
        mutation: Option<&str>,
        subscription: Option<&str>,
    ) -> FederatedSchema {
        let schema = Arc::new(SchemaType::new(
            self.types.into_iter().map(|(_, t)| t).collect(),
            query,
            mutation,
            subscription,
        ));

        FederatedSchema {
            schema,
            field_services: self
                .field_services
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
        }
    }
}

impl FederatedSchema {
    /// The merged schema, used to validate incoming queries before planning.
    pub fn schema(&self) -> &Arc<SchemaType> {
        &self.schema
    }

    /// The services able to resolve a field, sorted by name.
    ///
    /// The deterministic order is what makes owner selection stable when
    /// several services claim one field.
    pub(crate) fn services_for(&self, type_name: &str, field_name: &str) -> &[ArcStr] {
        self.field_services
            .get(&(type_name.to_string(), field_name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ast::Type,
        schema::meta::{Field, ObjectMeta},
    };

    use super::FederatedSchemaBuilder;

    fn named(name: &str) -> Type<'static> {
        Type::Named(name.to_string().into())
    }

    #[test]
    fn extension_merges_fields_and_records_owners() {
        let federated = FederatedSchemaBuilder::new()
            .service(
                "s1",
                vec![
                    ObjectMeta::new(
                        "Query",
                        vec![Field::new("human", named("Human"))],
                    )
                    .into_meta(),
                    ObjectMeta::new(
                        "Human",
                        vec![
                            Field::new("id", named("ID")),
                            Field::new("name", named("String")),
                        ],
                    )
                    .into_meta(),
                ],
            )
            .service(
                "s2",
                vec![
                    ObjectMeta::new("Human", vec![Field::new("age", named("Int"))]).into_meta(),
                ],
            )
            .finish("Query", None, None);

        let human = federated.schema().concrete_type_by_name("Human").unwrap();
        assert!(human.field_by_name("id").is_some());
        assert!(human.field_by_name("age").is_some());

        assert_eq!(federated.services_for("Human", "name"), ["s1"]);
        assert_eq!(federated.services_for("Human", "age"), ["s2"]);
        assert_eq!(federated.services_for("Query", "human"), ["s1"]);
    }

    #[test]
    fn shared_fields_record_every_owner_sorted() {
        let federated = FederatedSchemaBuilder::new()
            .service(
                "zeta",
                vec![
                    ObjectMeta::new("Query", vec![Field::new("shared", named("String"))])
                        .into_meta(),
                ],
            )
            .service(
                "alpha",
                vec![
                    ObjectMeta::new("Query", vec![Field::new("shared", named("String"))])
                        .into_meta(),
                ],
            )
            .finish("Query", None, None);

        assert_eq!(federated.services_for("Query", "shared"), ["alpha", "zeta"]);
    }
}
