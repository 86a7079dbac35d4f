//! Naming conventions shared by the storage and API synthesizers.

use crate::ID_FIELD;

/// Converts a type name to its snake-cased table name.
///
/// An underscore is inserted before each uppercase letter that is neither the
/// first character nor already preceded by `_`, then the result is lowercased.
pub fn snake_it(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for (index, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() && index > 0 && previous != Some('_') {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
        previous = Some(c);
    }

    out
}

/// Foreign-key column backing a to-one reference field.
pub fn reference_column(field: &str) -> String {
    format!("{field}_{ID_FIELD}")
}

/// Back-reference column a child table gains for its parent's collection.
pub fn back_reference_column(parent_table: &str) -> String {
    format!("{parent_table}_{ID_FIELD}")
}

/// Back-reference column used when the default one is already taken.
pub fn qualified_back_reference_column(parent_table: &str, field: &str) -> String {
    format!("{parent_table}_{field}_{ID_FIELD}")
}

pub fn create_type_name(model: &str) -> String {
    format!("{model}Create")
}

pub fn update_type_name(model: &str) -> String {
    format!("{model}Update")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_it() {
        let cases = [
            ("", ""),
            ("Word", "word"),
            ("ThreeWordValue", "three_word_value"),
            ("EndsWithCaP", "ends_with_ca_p"),
            ("already_snaked_unaffected", "already_snaked_unaffected"),
            ("Capitalised_Snaked_Lowered", "capitalised_snaked_lowered"),
        ];

        for (input, expected) in cases {
            assert_eq!(snake_it(input), expected, "snake_it({input:?})");
        }
    }

    #[test]
    fn test_column_names() {
        assert_eq!(reference_column("produced_by"), "produced_by_id");
        assert_eq!(back_reference_column("dataset"), "dataset_id");
        assert_eq!(
            qualified_back_reference_column("dataset", "archived_files"),
            "dataset_archived_files_id"
        );
        assert_eq!(create_type_name("Dataset"), "DatasetCreate");
        assert_eq!(update_type_name("Dataset"), "DatasetUpdate");
    }
}
