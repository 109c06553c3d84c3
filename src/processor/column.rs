use crate::processor::{GroupKey, ProcessorError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Str => "string",
        }
    }
}

/// One typed column. Numeric columns are nullable (empty CSV cells),
/// string columns keep cells verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<String>),
}

impl Column {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, idx: usize) -> Option<Value> {
        match self {
            Column::Int64(v) => v.get(idx).map(|c| c.map_or(Value::Null, Value::Int)),
            Column::Float64(v) => v.get(idx).map(|c| c.map_or(Value::Null, Value::Float)),
            Column::Str(v) => v.get(idx).map(|s| Value::Str(s.clone())),
        }
    }

    pub fn group_key(&self, idx: usize) -> Option<GroupKey> {
        match self {
            Column::Int64(v) => v.get(idx).map(|c| c.map_or(GroupKey::Null, GroupKey::Int)),
            Column::Str(v) => v.get(idx).map(|s| GroupKey::Str(s.clone())),
            Column::Float64(_) => None,
        }
    }

    /// Numeric view of the column, widened to f64
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>, ProcessorError> {
        match self {
            Column::Int64(v) => Ok(v.iter().map(|c| c.map(|x| x as f64)).collect()),
            Column::Float64(v) => Ok(v.clone()),
            Column::Str(_) => Err(ProcessorError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    pub fn as_str(&self, name: &str) -> Result<&[String], ProcessorError> {
        match self {
            Column::Str(v) => Ok(v),
            _ => Err(ProcessorError::ColumnType {
                column: name.to_string(),
                expected: ColumnType::Str.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widens_ints() {
        let col = Column::Int64(vec![Some(1), None, Some(3)]);
        assert_eq!(col.numeric("x").unwrap(), vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_numeric_rejects_strings() {
        let col = Column::Str(vec!["a".into()]);
        assert!(matches!(
            col.numeric("x"),
            Err(ProcessorError::ColumnType { .. })
        ));
    }

    #[test]
    fn test_float_column_has_no_group_key() {
        let col = Column::Float64(vec![Some(1.5)]);
        assert_eq!(col.group_key(0), None);
        assert_eq!(col.value(0), Some(Value::Float(1.5)));
    }
}
