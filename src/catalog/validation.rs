// Type Validation Module
//
// Checks that rows handed to the record store match their table schema.

use crate::catalog::schema::DataType;
use crate::catalog::column::Column;
use crate::catalog::table::TableSchema;
use crate::catalog::{ValidationError, ValidationResult};
use crate::query::executor::result::{DataValue, Row};

/// The type validator handles schema validation and type checking
pub struct TypeValidator;

impl TypeValidator {
    /// Validate a value against a column's data type
    pub fn validate_value(value: &DataValue, column: &Column) -> ValidationResult<()> {
        // Check for NULL in non-nullable columns
        if matches!(value, DataValue::Null) && !column.is_nullable() {
            return Err(ValidationError::NullValueNotAllowed(column.name().to_string()));
        }

        match (value, column.data_type()) {
            (DataValue::Null, _) => Ok(()),

            (DataValue::Integer(_), DataType::Integer) => Ok(()),
            (DataValue::Float(_), DataType::Float) => Ok(()),
            (DataValue::Text(_), DataType::Text) => Ok(()),
            (DataValue::Boolean(_), DataType::Boolean) => Ok(()),
            (DataValue::List(_), DataType::List) => Ok(()),

            // Integer can be stored in a Float column
            (DataValue::Integer(_), DataType::Float) => Ok(()),

            (actual, expected) => Err(ValidationError::TypeMismatch {
                column: column.name().to_string(),
                expected: expected.to_string(),
                actual: actual.type_name(),
            }),
        }
    }

    /// Validate a row against a table schema: every column present, no extras
    pub fn validate_row(row: &Row, schema: &TableSchema) -> ValidationResult<()> {
        for (name, value) in row.values_with_names() {
            match schema.get_column(name) {
                Some(column) => Self::validate_value(value, column)?,
                None => return Err(ValidationError::ColumnNotFound(name.to_string())),
            }
        }

        for column in schema.columns() {
            if row.get(column.name()).is_none() {
                return Err(ValidationError::MissingColumn(column.name().to_string()));
            }
        }

        Ok(())
    }
}
