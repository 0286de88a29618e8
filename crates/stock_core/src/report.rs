use crate::Record;

/// Report columns, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    Stock,
    Cost,
    Price,
}

/// How a column contributes to the totals row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalRule {
    /// Totals cell stays blank.
    Blank,
    /// `Σ value * stock`, absent values counting as zero.
    StockWeighted,
}

/// Presentation hints handed to the workbook writer alongside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub column: Column,
    pub label: &'static str,
    pub width: u16,
    /// Excel number format, when the column is numeric with separators.
    pub number_format: Option<&'static str>,
    pub total: TotalRule,
}

const THOUSANDS_FORMAT: &str = "#,###";

const COLUMN_SPECS: [ColumnSpec; 4] = [
    ColumnSpec {
        column: Column::Title,
        label: "商品名",
        width: 100,
        number_format: None,
        total: TotalRule::Blank,
    },
    ColumnSpec {
        column: Column::Stock,
        label: "在庫数",
        width: 10,
        number_format: None,
        total: TotalRule::Blank,
    },
    ColumnSpec {
        column: Column::Cost,
        label: "仕入れ価格（円）",
        width: 16,
        number_format: Some(THOUSANDS_FORMAT),
        total: TotalRule::StockWeighted,
    },
    ColumnSpec {
        column: Column::Price,
        label: "販売価格（円）",
        width: 16,
        number_format: Some(THOUSANDS_FORMAT),
        total: TotalRule::StockWeighted,
    },
];

/// A single cell of a record row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(u64),
    Empty,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Title, Column::Stock, Column::Cost, Column::Price];

    pub fn specs() -> &'static [ColumnSpec] {
        &COLUMN_SPECS
    }

    pub fn spec(self) -> &'static ColumnSpec {
        // COLUMN_SPECS is declared in `Column::ALL` order.
        &COLUMN_SPECS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn cell(self, record: &Record) -> CellValue<'_> {
        match self {
            Column::Title => CellValue::Text(&record.title),
            Column::Stock => CellValue::Number(u64::from(record.stock)),
            Column::Cost => record.cost().map_or(CellValue::Empty, CellValue::Number),
            Column::Price => record.price().map_or(CellValue::Empty, CellValue::Number),
        }
    }

    fn weighted_value(self, record: &Record) -> u64 {
        match self.cell(record) {
            CellValue::Number(value) => value.saturating_mul(u64::from(record.stock)),
            CellValue::Text(_) | CellValue::Empty => 0,
        }
    }
}

/// Ordered report rows with their stock-weighted totals.
///
/// Row order is the order records were received, which for a fetched batch is
/// the completion order of the underlying requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportTable {
    rows: Vec<Record>,
    /// Running `StockWeighted` sums, indexed by column; zero for `Blank` columns.
    weighted: [u64; Column::ALL.len()],
}

impl ReportTable {
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_cost(&self) -> u64 {
        self.weighted[Column::Cost as usize]
    }

    pub fn total_price(&self) -> u64 {
        self.weighted[Column::Price as usize]
    }

    /// Totals-row value for a column, `None` where the cell stays blank.
    pub fn total(&self, column: Column) -> Option<u64> {
        match column.spec().total {
            TotalRule::Blank => None,
            TotalRule::StockWeighted => Some(self.weighted[column as usize]),
        }
    }
}

/// Incremental fold of records into a [`ReportTable`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    table: ReportTable,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: ReportTable {
                rows: Vec::with_capacity(capacity),
                ..ReportTable::default()
            },
        }
    }

    pub fn push(&mut self, record: Record) {
        let table = &mut self.table;
        for spec in Column::specs() {
            if spec.total == TotalRule::StockWeighted {
                let sum = &mut table.weighted[spec.column as usize];
                *sum = sum.saturating_add(spec.column.weighted_value(&record));
            }
        }
        table.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.table.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.rows.is_empty()
    }

    pub fn finish(self) -> ReportTable {
        self.table
    }
}

impl FromIterator<Record> for ReportTable {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut builder = ReportBuilder::new();
        for record in iter {
            builder.push(record);
        }
        builder.finish()
    }
}

/// Fold records, in the order given, into a totalled table.
pub fn aggregate(records: impl IntoIterator<Item = Record>) -> ReportTable {
    records.into_iter().collect()
}
