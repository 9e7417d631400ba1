use serde_json::Value;

use super::types::{Predicate, PredicateOp, SqlResult};

/// Folds a list of predicate descriptors into a single parameterized
/// conjunction. Values never enter the SQL text; every bound travels as a
/// positional `$k` parameter.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Compile predicates into a WHERE clause body (without the `WHERE`
    /// keyword) and the matching parameter list. No predicates compiles to
    /// an empty clause, meaning "list all".
    pub fn generate(predicates: &[Predicate], starting_param_index: usize) -> SqlResult {
        let mut builder = Self::new(starting_param_index);
        let conditions: Vec<String> = predicates
            .iter()
            .map(|p| builder.build_condition(p))
            .collect();

        SqlResult {
            query: conditions.join(" AND "),
            params: builder.param_values,
        }
    }

    fn build_condition(&mut self, predicate: &Predicate) -> String {
        let quoted_column = format!("\"{}\"", predicate.column);
        match predicate.op {
            PredicateOp::Contains => {
                // Wrap the needle here so the clause itself stays static
                let needle = predicate.value.as_str().unwrap_or_default();
                let param = self.param(Value::String(format!("%{}%", needle)));
                format!("{} ILIKE {}", quoted_column, param)
            }
            PredicateOp::Gte => {
                let param = self.param(predicate.value.clone());
                format!("{} >= {}", quoted_column, param)
            }
            PredicateOp::Lte => {
                let param = self.param(predicate.value.clone());
                format!("{} <= {}", quoted_column, param)
            }
            PredicateOp::Gt => {
                let param = self.param(predicate.value.clone());
                format!("{} > {}", quoted_column, param)
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        let placeholder = format!("${}", self.param_index);
        self.param_index += 1;
        placeholder
    }
}
