use serde::Deserialize;
use serde_json::{json, Value};

use super::error::FilterError;

/// Comparison applied by a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    /// Case-insensitive substring containment (ILIKE with wrapped wildcards)
    Contains,
    Gte,
    Lte,
    Gt,
}

/// One predicate descriptor: column, operator, bound value. A filter request
/// lowers to a list of these; the conjunction builder folds them into SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub op: PredicateOp,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Search criteria for job listings. All fields optional and independent;
/// the empty filter means "list all".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub has_equity: Option<bool>,
}

impl JobFilter {
    pub fn validate(&self) -> Result<(), FilterError> {
        if let Some(min) = self.min_salary {
            if min < 0 {
                return Err(FilterError::NegativeBound("minSalary must be non-negative".into()));
            }
        }
        if let Some(max) = self.max_salary {
            if max < 0 {
                return Err(FilterError::NegativeBound("maxSalary must be non-negative".into()));
            }
        }
        if let (Some(min), Some(max)) = (self.min_salary, self.max_salary) {
            if min > max {
                return Err(FilterError::RangeInversion(
                    "minSalary cannot exceed maxSalary".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = vec![];
        if let Some(title) = &self.title {
            predicates.push(Predicate {
                column: "title",
                op: PredicateOp::Contains,
                value: json!(title),
            });
        }
        if let Some(min) = self.min_salary {
            predicates.push(Predicate {
                column: "salary",
                op: PredicateOp::Gte,
                value: json!(min),
            });
        }
        if let Some(max) = self.max_salary {
            predicates.push(Predicate {
                column: "salary",
                op: PredicateOp::Lte,
                value: json!(max),
            });
        }
        // hasEquity=false applies no restriction at all
        if self.has_equity == Some(true) {
            predicates.push(Predicate {
                column: "equity",
                op: PredicateOp::Gt,
                value: json!(0),
            });
        }
        predicates
    }
}

/// Search criteria for company listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub min_employees: Option<i64>,
    pub max_employees: Option<i64>,
}

impl CompanyFilter {
    pub fn validate(&self) -> Result<(), FilterError> {
        if let Some(min) = self.min_employees {
            if min < 0 {
                return Err(FilterError::NegativeBound(
                    "minEmployees must be non-negative".into(),
                ));
            }
        }
        if let Some(max) = self.max_employees {
            if max < 0 {
                return Err(FilterError::NegativeBound(
                    "maxEmployees must be non-negative".into(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees) {
            if min > max {
                return Err(FilterError::RangeInversion(
                    "minEmployees cannot exceed maxEmployees".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = vec![];
        if let Some(name) = &self.name {
            predicates.push(Predicate {
                column: "name",
                op: PredicateOp::Contains,
                value: json!(name),
            });
        }
        if let Some(min) = self.min_employees {
            predicates.push(Predicate {
                column: "num_employees",
                op: PredicateOp::Gte,
                value: json!(min),
            });
        }
        if let Some(max) = self.max_employees {
            predicates.push(Predicate {
                column: "num_employees",
                op: PredicateOp::Lte,
                value: json!(max),
            });
        }
        predicates
    }
}
