//! CSV adapter: turns a source file's text into `RawRecord`s per its column mapping.

use std::collections::BTreeMap;

use csv::StringRecord;

use crate::config::SourceConfig;
use crate::error::ReconError;
use crate::model::{BalanceKind, RawRecord};

/// Header row plus data rows of one CSV file.
pub(crate) struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<StringRecord>,
}

impl CsvTable {
    /// Position of `name` among the (trimmed) headers.
    pub fn column(&self, source: &str, name: &str) -> Result<usize, ReconError> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h == wanted)
            .ok_or_else(|| ReconError::MissingColumn {
                source: source.into(),
                column: name.into(),
            })
    }
}

/// Parse `csv_data`, skipping `skip_rows` preamble lines before the header.
pub(crate) fn read_table(
    source: &str,
    csv_data: &str,
    delimiter: Option<char>,
    skip_rows: usize,
) -> Result<CsvTable, ReconError> {
    let content = skip_lines(csv_data.trim_start_matches('\u{feff}'), skip_rows);
    let delimiter = match delimiter {
        Some(d) => d as u8,
        None => sniff_delimiter(content),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let csv_err = |e: csv::Error| ReconError::Csv {
        source: source.into(),
        message: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;

    Ok(CsvTable { headers, records })
}

fn skip_lines(content: &str, n: usize) -> &str {
    let mut rest = content;
    for _ in 0..n {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}

/// Data lines compared against the header when sniffing.
const SNIFF_LINES: usize = 10;

/// Guess a source's delimiter from its header row and first data lines.
///
/// A candidate qualifies when it splits the header into several fields. The
/// qualifying candidate whose header width holds on the most data lines wins;
/// ties go to the earlier candidate. `;` comes first: decimal-comma exports
/// use it, and their amounts (`1.500,00`) would split on `,`.
pub fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];

    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return b',';
    };
    let data: Vec<&str> = lines.take(SNIFF_LINES).collect();

    let mut best: Option<(u8, usize)> = None;
    for delim in CANDIDATES {
        let width = field_count(header, delim);
        if width < 2 {
            continue;
        }
        let agreeing = data.iter().filter(|l| field_count(l, delim) == width).count();
        if best.map_or(true, |(_, n)| agreeing > n) {
            best = Some((delim, agreeing));
        }
    }
    best.map_or(b',', |(delim, _)| delim)
}

/// Fields on one line, honoring quotes.
fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |r| r.len())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Load one source's CSV text into raw records, applying its column mapping.
///
/// Every mapped column must exist in the header row. Balance kinds the
/// mapping leaves out are simply absent from the records.
pub fn load_csv_records(
    source_name: &str,
    csv_data: &str,
    source_config: &SourceConfig,
) -> Result<Vec<RawRecord>, ReconError> {
    let table = read_table(
        source_name,
        csv_data,
        source_config.delimiter,
        source_config.skip_rows,
    )?;
    let columns = &source_config.columns;

    let account_idx = table.column(source_name, &columns.account)?;
    let label_idx = match columns.label {
        Some(ref label) => Some(table.column(source_name, label)?),
        None => None,
    };
    let mut balance_idx = Vec::new();
    for kind in BalanceKind::ALL {
        if let Some(name) = columns.balance_column(kind) {
            balance_idx.push((kind, table.column(source_name, name)?));
        }
    }

    let records = table
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let balances: BTreeMap<BalanceKind, String> = balance_idx
                .iter()
                .map(|(kind, idx)| (*kind, record.get(*idx).unwrap_or("").to_string()))
                .collect();

            RawRecord {
                source: source_name.into(),
                side: source_config.side,
                row_number: i + 1,
                raw_account: non_empty(record.get(account_idx)),
                label: label_idx.and_then(|idx| non_empty(record.get(idx))),
                balances,
            }
        })
        .collect();

    Ok(records)
}
