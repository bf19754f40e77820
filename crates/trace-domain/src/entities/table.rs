//! The table entity: columns, rows, and the cached query signature that
//! drives `Setup`/`Fetch`/`ExportCSV` (`spec.md` §3, §4.9).

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::data::Data;
use crate::value_objects::property::Property;

/// Sort direction for a table's sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Primitive wire type of a table column (all columns are transcribed as
/// `String`-typed `Data` for transport per `spec.md` §4.9, but the engine
/// tracks the underlying type for CSV formatting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    UInt64,
    Double,
    String,
}

/// A table column: a stable name and its underlying primitive type.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// The full set of parameters that determine a table's pending query
/// (`spec.md` §4.9). Equality of two signatures is what lets `Setup`
/// short-circuit to a row-clear instead of a full re-issue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySignature {
    pub filter: Option<String>,
    pub group_by: bool,
    pub group_columns: Vec<String>,
    pub sort_column: Option<String>,
    pub sort_order: Option<SortOrderKey>,
    pub string_filter: Vec<String>,
    pub summary: bool,
    pub time_start: Option<u64>,
    pub time_end: Option<u64>,
    pub track_ids: Vec<u64>,
}

/// `SortOrder` without the enum's non-`Default`, kept here so
/// [`QuerySignature`] can derive `Default`/`PartialEq` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrderKey {
    Ascending,
    Descending,
}

impl From<SortOrder> for SortOrderKey {
    fn from(v: SortOrder) -> Self {
        match v {
            SortOrder::Ascending => Self::Ascending,
            SortOrder::Descending => Self::Descending,
        }
    }
}

/// `id`, ordered columns, and rows keyed by integer (`spec.md` §3).
#[derive(Debug, Clone, Default)]
pub struct Table {
    id: u64,
    columns: Vec<Column>,
    rows: Vec<Vec<Data>>,
    num_rows: u64,
    signature: Option<QuerySignature>,
}

impl Table {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            columns: Vec::new(),
            rows: Vec::new(),
            num_rows: 0,
            signature: None,
        }
    }

    #[must_use]
    pub fn signature(&self) -> Option<&QuerySignature> {
        self.signature.as_ref()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Data>] {
        &self.rows
    }

    /// `Setup` step 2: the signature is unchanged, so only clear rows.
    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// `Setup` step 3-4: a genuinely new signature resets columns too.
    pub fn reset(&mut self, signature: QuerySignature, columns: Vec<Column>, num_rows: u64) {
        self.signature = Some(signature);
        self.columns = columns;
        self.rows.clear();
        self.num_rows = num_rows;
    }

    pub fn set_page(&mut self, rows: Vec<Vec<Data>>) {
        self.rows = rows;
    }

    #[must_use]
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }
}

impl Handle for Table {
    fn kind(&self) -> HandleKind {
        HandleKind::Table
    }

    fn get_u64(&self, property: Property, index: u64) -> Result<u64> {
        match property {
            Property::TableId => Ok(self.id),
            Property::TableColumnCount => Ok(self.columns.len() as u64),
            Property::TableRowCount => Ok(self.num_rows),
            Property::TableColumnType => {
                Self::check_index(index, self.columns.len() as u64)?;
                Ok(match self.columns[index as usize].column_type {
                    ColumnType::UInt64 => 0,
                    ColumnType::Double => 1,
                    ColumnType::String => 2,
                })
            }
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, index: u64) -> Result<String> {
        match property {
            Property::TableColumnName => {
                Self::check_index(index, self.columns.len() as u64)?;
                Ok(self.columns[index as usize].name.clone())
            }
            _ => Err(self.reject(property)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_signature_only_clears_rows() {
        let mut t = Table::new(1);
        let sig = QuerySignature::default();
        t.reset(sig.clone(), vec![Column { name: "a".into(), column_type: ColumnType::String }], 3);
        t.set_page(vec![vec![Data::String("x".into())]]);
        assert_eq!(t.signature(), Some(&sig));
        t.clear_rows();
        assert!(t.rows().is_empty());
        assert_eq!(t.columns().len(), 1, "columns survive a rows-only clear");
    }
}
