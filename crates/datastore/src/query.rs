//! Entity queries: property filters, ordering and a limit

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Condition on a top-level property
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Filter {
    /// Whether an entity satisfies this filter. Missing properties and
    /// values of different types never match an ordering operator.
    pub fn matches(&self, entity: &Value) -> bool {
        let Some(actual) = entity.get(&self.field) else {
            return false;
        };

        match self.operator {
            Operator::Equal => actual == &self.value,
            Operator::NotEqual => actual != &self.value,
            Operator::LessThan => compare(actual, &self.value) == Some(Ordering::Less),
            Operator::LessThanOrEqual => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::GreaterThan => compare(actual, &self.value) == Some(Ordering::Greater),
            Operator::GreaterThanOrEqual => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

/// Query over a single kind
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub kind: String,
    pub filters: Vec<Filter>,
    pub orders: Vec<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entity: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(entity))
    }

    /// Ordering of two entities according to the query's sort orders
    pub fn cmp_entities(&self, a: &Value, b: &Value) -> Ordering {
        for (field, direction) in &self.orders {
            let ordering = match (a.get(field), b.get(field)) {
                (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let ordering = match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_operators() {
        let entity = json!({ "visits": 5, "name": "jane" });

        let cases = [
            (Operator::Equal, json!(5), true),
            (Operator::NotEqual, json!(5), false),
            (Operator::LessThan, json!(6), true),
            (Operator::LessThanOrEqual, json!(5), true),
            (Operator::GreaterThan, json!(5), false),
            (Operator::GreaterThanOrEqual, json!(4.5), true),
        ];

        for (operator, value, expected) in cases {
            let filter = Filter {
                field: "visits".to_string(),
                operator,
                value,
            };
            assert_eq!(filter.matches(&entity), expected, "{operator:?}");
        }
    }

    #[test]
    fn test_filter_on_missing_or_mismatched_property() {
        let entity = json!({ "name": "jane" });

        let missing = Query::new("User").filter("visits", Operator::Equal, 1);
        let mismatched = Query::new("User").filter("name", Operator::GreaterThan, 1);

        assert!(!missing.matches(&entity));
        assert!(!mismatched.matches(&entity));
    }

    #[test]
    fn test_ordering_by_multiple_fields() {
        let query = Query::new("User")
            .order("team", Direction::Ascending)
            .order("visits", Direction::Descending);

        let a = json!({ "team": "blue", "visits": 1 });
        let b = json!({ "team": "blue", "visits": 7 });
        let c = json!({ "team": "red", "visits": 9 });

        assert_eq!(query.cmp_entities(&a, &b), Ordering::Greater);
        assert_eq!(query.cmp_entities(&b, &c), Ordering::Less);
        assert_eq!(query.cmp_entities(&a, &a), Ordering::Equal);
    }
}
