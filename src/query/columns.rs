use std::collections::HashSet;
use std::fmt;

use super::operators::FieldType;

/// A queryable column: the API field name, the SQL expression it maps to and
/// its semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub field: &'static str,
    pub expr: &'static str,
    pub kind: FieldType,
}

impl ColumnDescriptor {
    pub const fn new(field: &'static str, expr: &'static str, kind: FieldType) -> Self {
        Self { field, expr, kind }
    }
}

/// Field name -> column registry for one table.
#[derive(Debug, Clone, Copy)]
pub struct Columns(&'static [ColumnDescriptor]);

impl Columns {
    pub const fn new(columns: &'static [ColumnDescriptor]) -> Self {
        Self(columns)
    }

    pub fn get(&self, field: &str) -> Option<&'static ColumnDescriptor> {
        self.0.iter().find(|column| column.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ColumnDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the registry once at startup.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for column in self.0 {
            if column.field.is_empty() || column.expr.trim().is_empty() {
                return Err(RegistryError::EmptyName(column.field));
            }
            if !seen.insert(column.field) {
                return Err(RegistryError::DuplicateField(column.field));
            }
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateField(&'static str),
    EmptyName(&'static str),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateField(field) => write!(f, "duplicate field '{field}'"),
            RegistryError::EmptyName(field) => write!(f, "column '{field}' has an empty name"),
        }
    }
}

impl std::error::Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    static GOOD: &[ColumnDescriptor] = &[
        ColumnDescriptor::new("title", "c.title", FieldType::String),
        ColumnDescriptor::new("isIncome", "c.is_income", FieldType::Boolean),
    ];

    static DUPLICATED: &[ColumnDescriptor] = &[
        ColumnDescriptor::new("title", "c.title", FieldType::String),
        ColumnDescriptor::new("title", "c.name", FieldType::String),
    ];

    #[test]
    fn test_lookup_by_field_name() {
        let columns = Columns::new(GOOD);
        assert_eq!(columns.get("isIncome").map(|c| c.expr), Some("c.is_income"));
        assert!(columns.get("is_income").is_none());
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        assert!(Columns::new(GOOD).validate().is_ok());
        assert_eq!(
            Columns::new(DUPLICATED).validate(),
            Err(RegistryError::DuplicateField("title"))
        );
    }
}
