//! Report writers: two-header-row CSV and the human summary.

use std::io::Write;

use saldo_recon::model::{BalanceKind, Presence, ReconResult, RowStatus};
use saldo_recon::shape::{ReportRow, ReportTable};

/// Write the report as CSV with two header rows (balance kind over metric).
pub fn write_report_csv<W: Write>(report: &ReportTable, writer: W) -> Result<(), String> {
    let mut wtr = csv::WriterBuilder::new().flexible(false).from_writer(writer);

    let (upper, lower) = report.header_rows();
    wtr.write_record(&upper).map_err(|e| e.to_string())?;
    wtr.write_record(&lower).map_err(|e| e.to_string())?;

    for row in &report.rows {
        let mut record = vec![row.index.clone(), row.key.to_string(), status_cell(row)];
        record.extend(row.values.iter().map(|v| format!("{v:.2}")));
        wtr.write_record(&record).map_err(|e| e.to_string())?;
    }

    wtr.flush().map_err(|e| e.to_string())
}

/// Row status, or the orphan flag when the key is missing from one side.
fn status_cell(row: &ReportRow) -> String {
    match row.presence {
        Presence::Both => row.status.to_string(),
        other => other.describe().to_string(),
    }
}

/// Human summary for stderr.
pub fn format_summary(result: &ReconResult) -> String {
    let s = &result.summary;
    let mut out = format!(
        "{} recon '{}': {} account(s), {} matched, {} divergent ({} accounting only, {} statement only)\n",
        result.meta.join_mode,
        result.meta.config_name,
        s.total_rows,
        s.matched,
        s.divergent,
        s.accounting_only,
        s.statement_only,
    );

    for kind in BalanceKind::ALL {
        out.push_str(&format!(
            "  {:<22} accounting {:>16.2}  statement {:>16.2}  difference {:>14.2}\n",
            kind.business_name(),
            s.accounting_totals.get(kind),
            s.statement_totals.get(kind),
            s.difference_totals.get(kind),
        ));
    }

    if s.unkeyed_rows > 0 || s.coerced_to_zero > 0 {
        out.push_str(&format!(
            "  {} row(s) without an account key, {} unparsable amount(s) read as zero\n",
            s.unkeyed_rows, s.coerced_to_zero
        ));
    }

    for row in result.report.rows.iter().filter(|r| r.status == RowStatus::Divergent) {
        out.push_str(&format!("  ! {} [{}] {}\n", row.index, row.key, status_cell(row)));
    }

    out
}
