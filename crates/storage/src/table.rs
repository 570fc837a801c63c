use crate::row::Row;

/// Declared columns plus rows in insertion order. Declarations are advisory:
/// rows may carry columns that were never declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn insert(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn insert_keeps_order() {
        let mut table = Table::new("t", vec!["a".into()]);
        for i in 0..3 {
            table.insert([("a", Value::Int32(i))].into_iter().collect());
        }
        assert_eq!(table.row_count(), 3);
        for (i, row) in table.rows.iter().enumerate() {
            assert_eq!(row.get("a"), Some(&Value::Int32(i as i32)));
        }
        assert!(table.has_column("A"));
        table.clear();
        assert_eq!(table.row_count(), 0);
    }
}
