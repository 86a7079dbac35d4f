//! Model validation.
//!
//! Runs once at startup over the whole closed set of declared types and
//! stops at the first violation.

use std::collections::{HashMap, HashSet};

use crate::error::ModelValidationError;
use crate::model::{FieldType, ModelRegistry, ModelType};
use crate::naming::snake_it;

/// Checks every declared type against the data-model invariants.
///
/// Per type, in order: an `id: int` field exists, no field name repeats,
/// modifiers are at most one level deep, and every referenced type is either a
/// supported scalar or a declared model type. Lists must hold model types.
/// Finally, no two types may derive the same table name.
pub fn validate(registry: &ModelRegistry) -> Result<(), ModelValidationError> {
    tracing::debug!(models = registry.len(), "Validating model types");

    for model in registry.iter() {
        validate_model(registry, model)?;
    }

    let mut tables: HashMap<String, &str> = HashMap::new();
    for model in registry.iter() {
        let table = snake_it(&model.name);
        if let Some(other) = tables.get(&table) {
            return Err(ModelValidationError::TableNameCollision {
                type_name: model.name.clone(),
                other_type: other.to_string(),
                table,
            });
        }
        tables.insert(table, &model.name);
    }

    tracing::debug!("Model types validated");
    Ok(())
}

fn validate_model(registry: &ModelRegistry, model: &ModelType) -> Result<(), ModelValidationError> {
    if !model.has_integer_id() {
        return Err(ModelValidationError::MissingId {
            type_name: model.name.clone(),
        });
    }

    let mut seen = HashSet::new();
    for field in &model.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(ModelValidationError::DuplicateField {
                type_name: model.name.clone(),
                field: field.name.clone(),
            });
        }

        tracing::trace!(model = %model.name, field = %field.name, ty = %field.ty, "Validating field");

        let field_error = |inner: &FieldType| (model.name.clone(), field.name.clone(), inner.base_name().to_string());

        match &field.ty {
            FieldType::Optional(inner) | FieldType::List(inner)
                if matches!(inner.as_ref(), FieldType::Optional(_) | FieldType::List(_)) =>
            {
                let (type_name, field, inner_type) = field_error(inner);
                return Err(ModelValidationError::NestedModifier {
                    type_name,
                    field,
                    inner_type,
                });
            }
            FieldType::List(inner) => {
                if !is_declared_model(registry, inner) {
                    let (type_name, field, inner_type) = field_error(inner);
                    return Err(ModelValidationError::DisallowedListType {
                        type_name,
                        field,
                        inner_type,
                    });
                }
            }
            FieldType::Optional(inner) => {
                if !is_allowed(registry, inner) {
                    let (type_name, field, inner_type) = field_error(inner);
                    return Err(ModelValidationError::DisallowedOptionalType {
                        type_name,
                        field,
                        inner_type,
                    });
                }
            }
            other => {
                if !is_allowed(registry, other) {
                    let (type_name, field, inner_type) = field_error(other);
                    return Err(ModelValidationError::DisallowedType {
                        type_name,
                        field,
                        inner_type,
                    });
                }
            }
        }
    }

    Ok(())
}

fn is_declared_model(registry: &ModelRegistry, ty: &FieldType) -> bool {
    matches!(ty, FieldType::Model(name) if registry.contains(name))
}

fn is_allowed(registry: &ModelRegistry, ty: &FieldType) -> bool {
    matches!(ty, FieldType::Scalar(_)) || is_declared_model(registry, ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScalarType;

    fn datafile() -> ModelType {
        ModelType::new("Datafile")
            .field("id", FieldType::int())
            .field("name", FieldType::string())
    }

    fn registry(models: Vec<ModelType>) -> ModelRegistry {
        ModelRegistry::from_models(models).unwrap()
    }

    #[test]
    fn test_valid_models_pass() {
        let dataset = ModelType::new("Dataset")
            .field("id", FieldType::int())
            .field("name", FieldType::string())
            .field("datafiles", FieldType::list(FieldType::model("Datafile")))
            .field("last_datafile", FieldType::optional(FieldType::model("Datafile")));

        assert!(validate(&registry(vec![dataset, datafile()])).is_ok());
    }

    #[test]
    fn test_missing_id_fails() {
        let no_id = ModelType::new("NoIdDataset").field("name", FieldType::string());
        let err = validate(&registry(vec![no_id])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type NoIdDataset does not define an 'id' member of type 'int'"
        );
    }

    #[test]
    fn test_non_integer_id_fails() {
        let float_id = ModelType::new("NotIntIdDataset")
            .field("id", FieldType::Scalar(ScalarType::Float))
            .field("name", FieldType::string());
        let err = validate(&registry(vec![float_id])).unwrap_err();
        assert!(matches!(err, ModelValidationError::MissingId { ref type_name } if type_name == "NotIntIdDataset"));
    }

    #[test]
    fn test_list_of_optional_fails() {
        let dataset = ModelType::new("ListOptionalDataset")
            .field("id", FieldType::int())
            .field(
                "last_datafile",
                FieldType::list(FieldType::optional(FieldType::model("Datafile"))),
            );
        let err = validate(&registry(vec![dataset, datafile()])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type ListOptionalDataset has a list of optional or a optional of list type on field \
             'last_datafile' with type 'Datafile' and nesting these types isn't allowed"
        );
    }

    #[test]
    fn test_optional_of_list_fails() {
        let dataset = ModelType::new("OptionalListDataset")
            .field("id", FieldType::int())
            .field(
                "last_datafile",
                FieldType::optional(FieldType::list(FieldType::model("Datafile"))),
            );
        let err = validate(&registry(vec![dataset, datafile()])).unwrap_err();
        assert_eq!(err.type_name(), "OptionalListDataset");
        assert_eq!(err.field(), Some("last_datafile"));
        assert_eq!(err.inner_type(), Some("Datafile"));
    }

    #[test]
    fn test_undeclared_child_type_fails() {
        let supplier = ModelType::new("Supplier")
            .lookup()
            .field("id", FieldType::int())
            .field("supplier_type", FieldType::model("SupplierType"));
        let err = validate(&registry(vec![supplier])).unwrap_err();
        assert_eq!(
            err,
            ModelValidationError::DisallowedType {
                type_name: "Supplier".into(),
                field: "supplier_type".into(),
                inner_type: "SupplierType".into(),
            }
        );
    }

    #[test]
    fn test_list_of_scalars_fails() {
        let tagged = ModelType::new("Tagged")
            .field("id", FieldType::int())
            .field("tags", FieldType::list(FieldType::string()));
        let err = validate(&registry(vec![tagged])).unwrap_err();
        assert!(matches!(err, ModelValidationError::DisallowedListType { .. }));
        assert_eq!(err.inner_type(), Some("str"));
    }

    #[test]
    fn test_optional_undeclared_fails() {
        let dataset = ModelType::new("Dataset")
            .field("id", FieldType::int())
            .field("crs", FieldType::optional(FieldType::model("Crs")));
        let err = validate(&registry(vec![dataset])).unwrap_err();
        assert!(matches!(err, ModelValidationError::DisallowedOptionalType { .. }));
    }

    #[test]
    fn test_duplicate_field_fails() {
        let dataset = ModelType::new("Dataset")
            .field("id", FieldType::int())
            .field("name", FieldType::string())
            .field("name", FieldType::string());
        let err = validate(&registry(vec![dataset])).unwrap_err();
        assert!(matches!(err, ModelValidationError::DuplicateField { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_table_name_collision_fails() {
        let first = ModelType::new("FooBar")
            .field("id", FieldType::int())
            .field("a", FieldType::string());
        let second = ModelType::new("Foo_Bar")
            .field("id", FieldType::int())
            .field("b", FieldType::int());
        let err = validate(&registry(vec![first, second])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Types FooBar and Foo_Bar both map to table 'foo_bar'"
        );
        assert_eq!(err.type_name(), "Foo_Bar");
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_self_reference_passes() {
        let node = ModelType::new("Node")
            .field("id", FieldType::int())
            .field("parent", FieldType::optional(FieldType::model("Node")))
            .field("children", FieldType::list(FieldType::model("Node")));
        assert!(validate(&registry(vec![node])).is_ok());
    }
}
