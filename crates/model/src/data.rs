//! Event bodies.
//!
//! Row mutations are a closed set (insert, update, delete), each with its own
//! row shape. Every row image carries the set of columns it includes.

use serde::{Deserialize, Serialize};

/// Column-inclusion bitset for one row image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncludedColumns(Vec<bool>);

impl IncludedColumns {
    /// All `count` columns included.
    #[must_use]
    pub fn all(count: usize) -> Self {
        Self(vec![true; count])
    }

    /// Build from explicit column flags.
    #[must_use]
    pub const fn from_flags(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    /// Number of columns in the table, included or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether column `index` is part of the image. Out of range is `false`.
    #[must_use]
    pub fn is_included(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn count_included(&self) -> usize {
        self.0.iter().filter(|included| **included).count()
    }

    /// Indices of included columns, ascending.
    pub fn iter_included(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, included)| included.then_some(index))
    }
}

/// A single cell of a row image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// Ordered cell values of one row image.
pub type Row = Vec<CellValue>;

/// Inserted rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRowsEventData {
    pub table_id: u64,
    pub included_columns: IncludedColumns,
    pub rows: Vec<Row>,
}

/// Updated rows as before/after pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRowsEventData {
    pub table_id: u64,
    pub included_columns_before_update: IncludedColumns,
    pub included_columns: IncludedColumns,
    pub rows: Vec<(Row, Row)>,
}

/// Deleted rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRowsEventData {
    pub table_id: u64,
    pub included_columns: IncludedColumns,
    pub rows: Vec<Row>,
}

/// Typed event body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EventData {
    WriteRows(WriteRowsEventData),
    UpdateRows(UpdateRowsEventData),
    DeleteRows(DeleteRowsEventData),
    Query {
        sql: String,
        database: Option<String>,
    },
    /// Transaction commit.
    Xid {
        xid: u64,
    },
    /// The source switched to a new binlog file.
    Rotate {
        binlog_filename: String,
        binlog_position: u64,
    },
    #[default]
    Empty,
}

impl EventData {
    /// Table touched by a row mutation.
    #[must_use]
    pub const fn table_id(&self) -> Option<u64> {
        match self {
            Self::WriteRows(data) => Some(data.table_id),
            Self::UpdateRows(data) => Some(data.table_id),
            Self::DeleteRows(data) => Some(data.table_id),
            Self::Query { .. } | Self::Xid { .. } | Self::Rotate { .. } | Self::Empty => None,
        }
    }

    /// Number of affected rows; an update pair counts once.
    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            Self::WriteRows(data) => data.rows.len(),
            Self::UpdateRows(data) => data.rows.len(),
            Self::DeleteRows(data) => data.rows.len(),
            Self::Query { .. } | Self::Xid { .. } | Self::Rotate { .. } | Self::Empty => 0,
        }
    }
}
