use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("No data")]
    NoData,
}

/// A compiled partial-update mutation: the SET clause text and its
/// positional parameter values, in matching order.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSet {
    pub set_clause: String,
    pub values: Vec<Value>,
}

/// Compile a sparse field list into a parameterized SET clause.
///
/// `fields` is an explicit ordered sequence of (logical name, new value)
/// pairs; fragment k always corresponds to value k. `column_map` renames
/// logical fields to their physical columns; unmapped names pass through
/// unchanged. Parameter indices are 1-based and contiguous, offset by
/// `starting_param_index` so callers can append further bindings (the row
/// key) after the SET values.
///
/// The builder knows nothing about tables or field legality; callers reject
/// immutable fields before getting here.
pub fn sql_for_partial_update(
    fields: &[(&str, Value)],
    column_map: &[(&str, &str)],
    starting_param_index: usize,
) -> Result<UpdateSet, UpdateError> {
    if fields.is_empty() {
        return Err(UpdateError::NoData);
    }

    let mut fragments = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());

    for (idx, (name, value)) in fields.iter().enumerate() {
        let column = column_map
            .iter()
            .find(|(logical, _)| logical == name)
            .map(|(_, physical)| *physical)
            .unwrap_or(name);
        fragments.push(format!("\"{}\"=${}", column, starting_param_index + idx));
        values.push(value.clone());
    }

    Ok(UpdateSet {
        set_clause: fragments.join(", "),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generates_set_clause_and_values() {
        let fields = [("firstName", json!("Aliya")), ("age", json!(32))];
        let column_map = [("firstName", "first_name")];

        let result = sql_for_partial_update(&fields, &column_map, 1).unwrap();

        assert_eq!(result.set_clause, "\"first_name\"=$1, \"age\"=$2");
        assert_eq!(result.values, vec![json!("Aliya"), json!(32)]);
    }

    #[test]
    fn unmapped_fields_pass_through() {
        let fields = [("firstName", json!("Aliya")), ("age", json!(32))];

        let result = sql_for_partial_update(&fields, &[], 1).unwrap();

        assert_eq!(result.set_clause, "\"firstName\"=$1, \"age\"=$2");
        assert_eq!(result.values, vec![json!("Aliya"), json!(32)]);
    }

    #[test]
    fn empty_field_list_fails() {
        assert!(matches!(
            sql_for_partial_update(&[], &[], 1),
            Err(UpdateError::NoData)
        ));
        // Still fails with a column map supplied
        assert!(matches!(
            sql_for_partial_update(&[], &[("firstName", "first_name")], 1),
            Err(UpdateError::NoData)
        ));
    }

    #[test]
    fn respects_starting_param_index() {
        let fields = [("title", json!("T")), ("salary", json!(1))];

        let result = sql_for_partial_update(&fields, &[], 3).unwrap();

        assert_eq!(result.set_clause, "\"title\"=$3, \"salary\"=$4");
    }

    #[test]
    fn fragment_count_and_value_order_match_input_order() {
        let fields = [
            ("c", json!(3)),
            ("a", json!(1)),
            ("b", json!(2)),
        ];

        let result = sql_for_partial_update(&fields, &[], 1).unwrap();

        assert_eq!(result.set_clause, "\"c\"=$1, \"a\"=$2, \"b\"=$3");
        assert_eq!(result.values, vec![json!(3), json!(1), json!(2)]);
        assert_eq!(result.values.len(), fields.len());
    }
}
