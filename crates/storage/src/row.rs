use crate::value::Value;

/// A row: column name to value, preserving the spelling each column was
/// first written with. Lookups try an exact match, then a case-insensitive
/// one. A missing column and a column holding `Null` are distinct states.
///
/// The geometry payload lives in its own slot so it can never collide with
/// a user column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, Value)>,
    geometry: Value,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.values
            .iter()
            .position(|(name, _)| name == column)
            .or_else(|| {
                self.values
                    .iter()
                    .position(|(name, _)| name.eq_ignore_ascii_case(column))
            })
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|i| &self.values[i].1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// True when the column is absent or holds `Null`.
    pub fn is_null(&self, column: &str) -> bool {
        self.get(column).map_or(true, Value::is_null)
    }

    /// Write a value. An existing column matching case-insensitively is
    /// overwritten and keeps its stored spelling.
    pub fn set(&mut self, column: &str, value: Value) {
        match self.position(column) {
            Some(i) => self.values[i].1 = value,
            None => self.values.push((column.to_string(), value)),
        }
    }

    pub fn geometry(&self) -> &Value {
        &self.geometry
    }

    pub fn set_geometry(&mut self, wkb: Vec<u8>) {
        self.geometry = Value::Geometry(wkb);
    }

    /// Overwrite this row's columns with every column of `other`. The
    /// geometry slot is copied only when `other` carries one.
    pub fn merge_from(&mut self, other: &Row) {
        for (column, value) in &other.values {
            self.set(column, value.clone());
        }
        if !other.geometry.is_null() {
            self.geometry = other.geometry.clone();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            let column = column.into();
            row.set(&column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prefers_exact_then_case_insensitive() {
        let mut row = Row::new();
        row.set("Name", Value::from("a"));
        assert_eq!(row.get("Name"), Some(&Value::from("a")));
        assert_eq!(row.get("NAME"), Some(&Value::from("a")));
        assert_eq!(row.get("other"), None);
    }

    #[test]
    fn set_keeps_stored_spelling() {
        let mut row = Row::new();
        row.set("T_Id", Value::Int32(1));
        row.set("t_id", Value::Int32(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["T_Id"]);
        assert_eq!(row.get("T_ID"), Some(&Value::Int32(2)));
    }

    #[test]
    fn absent_and_null_are_distinct_but_both_null() {
        let mut row = Row::new();
        row.set("Zone", Value::Null);
        assert!(row.contains("Zone"));
        assert!(!row.contains("Other"));
        assert!(row.is_null("Zone"));
        assert!(row.is_null("Other"));
    }

    #[test]
    fn geometry_does_not_collide_with_columns() {
        let mut row = Row::new();
        row.set("geometry", Value::from("text"));
        row.set_geometry(vec![1, 2, 3]);
        assert_eq!(row.get("geometry"), Some(&Value::from("text")));
        assert_eq!(row.geometry(), &Value::Geometry(vec![1, 2, 3]));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn merge_overwrites_by_column() {
        let mut stored: Row = [("T_Id", Value::Int32(1)), ("Name", Value::from("old"))]
            .into_iter()
            .collect();
        stored.set_geometry(vec![9]);
        let incoming: Row = [
            ("t_id", Value::Int32(1)),
            ("name", Value::from("new")),
            ("Zone", Value::from("R1")),
        ]
        .into_iter()
        .collect();
        stored.merge_from(&incoming);
        assert_eq!(stored.get("Name"), Some(&Value::from("new")));
        assert_eq!(stored.get("Zone"), Some(&Value::from("R1")));
        assert_eq!(stored.geometry(), &Value::Geometry(vec![9]));
        assert_eq!(stored.len(), 3);
    }
}
