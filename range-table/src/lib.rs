//! Client-side data table: column descriptors, sorting and single-column
//! search over an in-memory row set.

pub mod users;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub const EMPTY_TABLE_TEXT: &str = "There is no rows yet.";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

static NULL: Value = Value::Null;

/// Identity of a row that survives sorting, searching and row refreshes.
pub type RowKey = Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: RowKey,
    cells: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            key: Uuid::new_v4(),
            cells: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.cells.insert(key.to_string(), value.into());
        self
    }

    /// Missing keys read as `Null`.
    pub fn get(&self, key: &str) -> &Value {
        self.cells.get(key).unwrap_or(&NULL)
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

pub type CellRenderer = fn(&Row) -> String;

#[derive(Clone)]
pub struct Column {
    pub key: String,
    pub header: String,
    pub cell: Option<CellRenderer>,
    pub sortable: bool,
}

impl Column {
    pub fn new(key: &str, header: &str) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
            cell: None,
            sortable: false,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn with_cell(mut self, cell: CellRenderer) -> Self {
        self.cell = Some(cell);
        self
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("custom_cell", &self.cell.is_some())
            .field("sortable", &self.sortable)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Total order used for sorting: nulls come last whichever the direction,
/// two numbers compare numerically, anything else compares as text.
pub fn compare_values(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (Value::Null, Value::Null) => return Ordering::Equal,
        (Value::Null, _) => return Ordering::Greater,
        (_, Value::Null) => return Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    };
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

#[derive(Debug, Clone)]
pub struct DataTable {
    columns: Vec<Column>,
    rows: Vec<Row>,
    initial_direction: SortDirection,
    sort_key: Option<String>,
    sort_direction: SortDirection,
    search_column: Option<String>,
    search_draft: String,
    active_search: String,
}

impl DataTable {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        let search_column = columns.first().map(|c| c.key.clone());
        Self {
            columns,
            rows,
            initial_direction: SortDirection::Ascending,
            sort_key: None,
            sort_direction: SortDirection::Ascending,
            search_column,
            search_draft: String::new(),
            active_search: String::new(),
        }
    }

    pub fn with_initial_sort(mut self, key: Option<&str>, direction: SortDirection) -> Self {
        self.sort_key = key.map(str::to_string);
        self.initial_direction = direction;
        self.sort_direction = direction;
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    pub fn row(&self, key: RowKey) -> Option<&Row> {
        self.rows.iter().find(|row| row.key == key)
    }

    /// Position of `key` among the visible rows.
    pub fn visible_position(&self, key: RowKey) -> Option<usize> {
        self.visible_rows().iter().position(|row| row.key == key)
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// A header click. The active column flips direction, another sortable
    /// column becomes active with the initial direction. Returns `false` for
    /// unknown or non-sortable columns.
    pub fn handle_sort(&mut self, key: &str) -> bool {
        if !self.columns.iter().any(|c| c.key == key && c.sortable) {
            return false;
        }
        if self.sort_key.as_deref() == Some(key) {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_key = Some(key.to_string());
            self.sort_direction = self.initial_direction;
        }
        true
    }

    /// Direction arrow to show on a sortable column's header.
    pub fn sort_indicator(&self, column: &Column) -> Option<SortDirection> {
        if !column.sortable {
            return None;
        }
        if self.sort_key.as_deref() == Some(column.key.as_str()) {
            Some(self.sort_direction)
        } else {
            Some(self.initial_direction)
        }
    }

    pub fn search_column(&self) -> Option<&str> {
        self.search_column.as_deref()
    }

    pub fn set_search_column(&mut self, key: &str) -> bool {
        if self.columns.iter().any(|c| c.key == key) {
            self.search_column = Some(key.to_string());
            true
        } else {
            false
        }
    }

    pub fn search_draft(&self) -> &str {
        &self.search_draft
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_draft.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.search_draft.pop();
    }

    /// The draft only filters once submitted.
    pub fn submit_search(&mut self) {
        self.active_search = self.search_draft.clone();
    }

    pub fn clear_search(&mut self) {
        self.search_draft.clear();
        self.active_search.clear();
    }

    pub fn active_search(&self) -> &str {
        &self.active_search
    }

    fn matches_search(&self, row: &Row) -> bool {
        let Some(column) = self.search_column.as_deref() else {
            return true;
        };
        if self.active_search.is_empty() {
            return true;
        }
        let value = row.get(column);
        !value.is_null()
            && value
                .to_string()
                .to_lowercase()
                .contains(&self.active_search.to_lowercase())
    }

    /// Rows after the active search and the current sort.
    pub fn visible_rows(&self) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self.rows.iter().filter(|row| self.matches_search(row)).collect();
        if let Some(key) = self.sort_key.as_deref() {
            rows.sort_by(|a, b| compare_values(a.get(key), b.get(key), self.sort_direction));
        }
        rows
    }

    pub fn cell_text(&self, row: &Row, column: &Column) -> String {
        match column.cell {
            Some(render) => render(row),
            None => row.get(&column.key).to_string(),
        }
    }
}
