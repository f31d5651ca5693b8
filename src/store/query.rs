// src/store/query.rs
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Tables the service reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Donations,
    Claims,
    Tasks,
    Other(String),
}

impl Table {
    pub fn name(&self) -> &str {
        match self {
            Table::Profiles => "profiles",
            Table::Donations => "donations",
            Table::Claims => "claims",
            Table::Tasks => "tasks",
            Table::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "profiles" => Table::Profiles,
            "donations" => Table::Donations,
            "claims" => Table::Claims,
            "tasks" => Table::Tasks,
            other => Table::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } => column,
        }
    }

    /// Strict equality; a row lacking the column never matches.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq { column, value } => row.get(column) == Some(value),
            Filter::In { column, values } => row.get(column).is_some_and(|v| values.contains(v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// A table read or write narrowed by filters, with optional ordering and limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Column list for backends that project; the file store returns whole rows.
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn in_<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(row))
    }

    /// Filters, then sorts (stable), then truncates.
    pub fn apply(&self, rows: Vec<Value>) -> Vec<Value> {
        let mut rows: Vec<Value> = rows.into_iter().filter(|row| self.matches(row)).collect();

        if let Some(order) = &self.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending { ordering } else { ordering.reverse() }
            });
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }

        rows
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values; a missing column sorts as null.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({ "id": "a", "role": "VOLUNTEER", "points": 10 }),
            json!({ "id": "b", "role": "DONOR", "points": 100 }),
            json!({ "id": "c", "role": "VOLUNTEER", "points": 75 }),
            json!({ "id": "d", "role": "VOLUNTEER" }),
            json!({ "id": "e", "role": "VOLUNTEER", "points": 75 }),
        ]
    }

    fn ids(rows: &[Value]) -> Vec<&str> {
        rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_eq_and_order_descending_is_stable() {
        let query = Query::from(Table::Profiles)
            .eq("role", "VOLUNTEER")
            .order("points", false);
        assert_eq!(ids(&query.apply(rows())), vec!["c", "e", "a", "d"]);
    }

    #[test]
    fn test_order_ascending_puts_missing_first() {
        let query = Query::from(Table::Profiles).order("points", true);
        assert_eq!(ids(&query.apply(rows())), vec!["d", "a", "c", "e", "b"]);
    }

    #[test]
    fn test_in_filter_and_limit() {
        let query = Query::from(Table::Profiles)
            .in_("id", ["a", "b", "z"])
            .limit(1);
        assert_eq!(ids(&query.apply(rows())), vec!["a"]);
    }

    #[test]
    fn test_missing_column_never_equals() {
        let query = Query::from(Table::Tasks).eq("volunteer_id", Value::Null);
        assert!(query.apply(vec![json!({ "id": "t" })]).is_empty());
    }

    #[test]
    fn test_compare_across_types() {
        assert_eq!(compare_values(Some(&json!(null)), Some(&json!(false))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(3)), Some(&json!("3"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2.5)), Some(&json!(2))), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&json!(null))), Ordering::Equal);
    }

    #[test]
    fn test_table_names_round_trip() {
        for table in [Table::Profiles, Table::Donations, Table::Claims, Table::Tasks] {
            assert_eq!(Table::from_name(table.name()), table);
        }
        assert_eq!(Table::from_name("audit").name(), "audit");
    }
}
