//! Cross cluster aggregation of status files into one report row per query.
//!
//! Each row has 24 columns :
//! query id (twice), then for each threshold from 3.0 down to 0.5 a triple (status, SH code, taxonomy),
//! then the compound code and compound taxonomy, then the best hit reference and its percent identity.
//!
//! The compound columns are taken from the first threshold (in report order) yielding a compound,
//! later thresholds never override them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use cpu_time::ProcessTime;
use fxhash::FxHashMap;
use rayon::prelude::*;

use crate::besthits::{load_best_hits, BestHits};
use crate::errors::ShMatchError;
use crate::status::{read_status_file, Status, StatusRecord};
use crate::taxonomy::{looks_like_sh, sh_from_target, TaxonomyMaps};
use crate::threshold::Threshold;
use crate::utils::files::{collect_status_files, require_input, tsv_writer};
use crate::utils::parameters::AggregateParams;

pub const NB_REPORT_COLUMNS: usize = 24;

/// header of the aggregated report
pub fn report_header() -> Vec<String> {
    let mut header = vec!["seq_id_tmp".to_string(), "seq_accno".to_string()];
    for threshold in Threshold::ALL {
        let label = threshold.percent_label();
        header.push(format!("status ({})", label));
        header.push(format!("SH code ({})", label));
        header.push(format!("SH/compound taxonomy ({})", label));
    }
    header.push("compound_cl_code (0.5)".to_string());
    header.push("Compound taxonomy (0.5)".to_string());
    header.push("Matched sequence".to_string());
    header.push("Similarity percentage".to_string());
    header
} // end of report_header

/// status wording of the report
pub fn report_status(status: Status) -> &'static str {
    match status {
        Status::Present => "present_in",
        Status::NewCluster => "new_sh_in",
        Status::Singleton => "new_singleton_in",
        Status::Missing => "",
    }
}

/// shortest rendering keeping a decimal point : 99.0, 98.75
pub fn format_pident(pident: f64) -> String {
    format!("{:?}", pident)
}

//==========================================================================

/// Status records of all compound clusters, by threshold and query.
#[derive(Default, Debug)]
pub struct StatusTable {
    by_threshold: FxHashMap<Threshold, FxHashMap<String, StatusRecord>>,
    queries: BTreeSet<String>,
}

impl StatusTable {
    /// a later record for the same (query, threshold) replaces the earlier one
    pub fn add(&mut self, record: StatusRecord) {
        self.queries.insert(record.query.clone());
        self.by_threshold
            .entry(record.threshold)
            .or_default()
            .insert(record.query.clone(), record);
    }

    pub fn get(&self, threshold: Threshold, query: &str) -> Option<&StatusRecord> {
        self.by_threshold.get(&threshold).and_then(|m| m.get(query))
    }

    /// every query seen at any threshold, sorted
    pub fn get_queries(&self) -> &BTreeSet<String> {
        &self.queries
    }

    /// Reads status files in parallel. Records are merged in file order so the result does not
    /// depend on thread scheduling.
    pub fn from_files(files: &[PathBuf], nb_threads: usize) -> Result<Self, ShMatchError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(nb_threads).build()?;
        let per_file: Vec<Result<Vec<StatusRecord>, ShMatchError>> =
            pool.install(|| files.par_iter().map(|f| read_status_file(f)).collect());
        let mut table = StatusTable::default();
        for (file, records) in files.iter().zip(per_file) {
            let records = records?;
            log::debug!("status file {:?} : nb records {}", file, records.len());
            for record in records {
                table.add(record);
            }
        }
        log::info!("nb distinct queries in status files : {}", table.queries.len());
        Ok(table)
    } // end of from_files
} // end of impl StatusTable

//==========================================================================

/// the (status, SH code, taxonomy) triple of a threshold
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThresholdCell {
    pub status: String,
    pub sh_code: String,
    pub taxonomy: String,
}

/// One report row
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedRow {
    pub query: String,
    /// in [Threshold::ALL] order
    pub cells: Vec<ThresholdCell>,
    pub compound_code: String,
    pub compound_taxonomy: String,
    pub matched_sequence: String,
    pub similarity: String,
}

impl AggregatedRow {
    fn new(query: &str) -> Self {
        AggregatedRow {
            query: query.to_string(),
            cells: Vec::with_capacity(Threshold::ALL.len()),
            compound_code: String::new(),
            compound_taxonomy: String::new(),
            matched_sequence: String::new(),
            similarity: String::new(),
        }
    }

    /// first compound wins
    fn offer_compound(&mut self, code: &str, taxonomy: &str) {
        if self.compound_code.is_empty() && !code.is_empty() {
            self.compound_code = code.to_string();
            self.compound_taxonomy = taxonomy.to_string();
        }
    }

    /// the 24 report fields
    pub fn to_fields(&self) -> Vec<&str> {
        let mut fields = Vec::<&str>::with_capacity(NB_REPORT_COLUMNS);
        fields.push(&self.query);
        fields.push(&self.query);
        for cell in &self.cells {
            fields.push(&cell.status);
            fields.push(&cell.sh_code);
            fields.push(&cell.taxonomy);
        }
        fields.push(&self.compound_code);
        fields.push(&self.compound_taxonomy);
        fields.push(&self.matched_sequence);
        fields.push(&self.similarity);
        fields
    }
} // end of impl AggregatedRow

/// Builds report rows from status records, best hits and taxonomy tables.
pub struct Aggregator<'a> {
    taxonomy: &'a TaxonomyMaps,
    best_hits: &'a BestHits,
}

impl<'a> Aggregator<'a> {
    pub fn new(taxonomy: &'a TaxonomyMaps, best_hits: &'a BestHits) -> Self {
        Aggregator { taxonomy, best_hits }
    }

    // fills the cell of a threshold, offering a compound to the row
    fn fill_cell(&self, row: &mut AggregatedRow, record: Option<&StatusRecord>) -> ThresholdCell {
        let record = match record {
            Some(record) => record,
            None => return ThresholdCell::default(),
        };
        let mut cell = ThresholdCell {
            status: report_status(record.status).to_string(),
            ..Default::default()
        };
        match record.status {
            Status::Present => {
                let sh = if looks_like_sh(&record.sh_code) {
                    record.sh_code.as_str()
                } else {
                    sh_from_target(&record.best_ref)
                };
                cell.sh_code = sh.to_string();
                cell.taxonomy = self.taxonomy.sh_taxonomy(sh).to_string();
                if !sh.is_empty() {
                    if let Some(ucl) = self.taxonomy.compound_of(sh) {
                        row.offer_compound(ucl, self.taxonomy.compound_taxonomy(ucl));
                    }
                }
            }
            Status::NewCluster | Status::Singleton => {
                if !record.sh_code.is_empty() {
                    let ucl = self.taxonomy.to_compound(&record.sh_code);
                    let taxonomy = self.taxonomy.compound_taxonomy(ucl);
                    cell.taxonomy = taxonomy.to_string();
                    row.offer_compound(ucl, taxonomy);
                }
            }
            Status::Missing => {}
        }
        cell
    } // end of fill_cell

    /// row of one query
    pub fn aggregate_query(&self, query: &str, table: &StatusTable) -> AggregatedRow {
        let mut row = AggregatedRow::new(query);
        for threshold in Threshold::ALL {
            let cell = self.fill_cell(&mut row, table.get(threshold, query));
            row.cells.push(cell);
        }
        if let Some(hit) = self.best_hits.get(query) {
            row.matched_sequence = hit.target.clone();
            row.similarity = format_pident(hit.pident);
        }
        row
    }

    /// one row per query of the table, sorted by query
    pub fn aggregate(&self, table: &StatusTable) -> Vec<AggregatedRow> {
        table.get_queries().iter().map(|q| self.aggregate_query(q, table)).collect()
    }
} // end of impl Aggregator

/// dumps the report with its header
pub fn write_report(path: &Path, rows: &[AggregatedRow]) -> Result<(), ShMatchError> {
    let mut writer = tsv_writer(path, false)?;
    writer.write_record(report_header())?;
    for row in rows {
        writer.write_record(row.to_fields())?;
    }
    writer.flush()?;
    log::info!("dumped nb rows {} in {:?}", rows.len(), path);
    Ok(())
} // end of write_report

/// whole aggregation stage : reads status files and tables, writes the report.
/// Returns the number of rows written.
pub fn aggregate(params: &AggregateParams) -> Result<usize, ShMatchError> {
    let start_t = SystemTime::now();
    let cpu_start = ProcessTime::now();
    //
    require_input(&params.best_hits)?;
    require_input(&params.shs_file)?;
    require_input(&params.sh2compound)?;
    require_input(&params.compounds_file)?;
    //
    let files = collect_status_files(&params.matches)?;
    let table = StatusTable::from_files(&files, params.nb_threads)?;
    let best_hits = load_best_hits(&params.best_hits, params.aligner)?;
    let taxonomy = TaxonomyMaps::load(&params.shs_file, &params.sh2compound, &params.compounds_file)?;
    //
    let aggregator = Aggregator::new(&taxonomy, &best_hits);
    let rows = aggregator.aggregate(&table);
    write_report(&params.out, &rows)?;
    //
    let cpu_time = cpu_start.elapsed();
    let elapsed_t = start_t.elapsed().map(|d| d.as_secs_f64()).unwrap_or(0.);
    log::info!("aggregate sys time(s) {:.2e} cpu time(s) {:.2e}", elapsed_t, cpu_time.as_secs_f64());
    Ok(rows.len())
} // end of aggregate

//==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::besthits::{parse_best_hits, MmseqsParser};

    fn string_map(pairs: &[(&str, &str)]) -> FxHashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn taxonomy() -> TaxonomyMaps {
        TaxonomyMaps::new(
            string_map(&[("SH1", "tax_sh1"), ("SH2", "tax_sh2")]),
            string_map(&[("SH1", "UCL1"), ("SH2", "UCL2"), ("SH3", "UCL3")]),
            string_map(&[("UCL1", "tax_ucl1"), ("UCL2", "tax_ucl2"), ("UCL3", "tax_ucl3")]),
        )
    }

    fn record(query: &str, best_ref: &str, status: Status, sh: &str, threshold: Threshold) -> StatusRecord {
        StatusRecord::new(query, best_ref, status, sh, "", threshold)
    }

    #[test]
    fn header_has_fixed_layout() {
        let header = report_header();
        assert_eq!(header.len(), NB_REPORT_COLUMNS);
        assert_eq!(header[2], "status (3.0)");
        assert_eq!(header[19], "SH/compound taxonomy (0.5)");
        assert_eq!(header[23], "Similarity percentage");
    }

    #[test]
    fn present_row_with_best_hit() {
        let taxonomy = taxonomy();
        let best_hits = parse_best_hits(&MmseqsParser, "q1\tref_SH1\t1e-10\t200\t500\t99.0\t1\t1\n".as_bytes());
        let mut table = StatusTable::default();
        table.add(record("q1", "ref_SH1", Status::Present, "SH1", Threshold::T030));
        table.add(record("q1", "ref_SH1", Status::Missing, "", Threshold::T005));

        let rows = Aggregator::new(&taxonomy, &best_hits).aggregate(&table);
        assert_eq!(rows.len(), 1);
        let fields = rows[0].to_fields();
        assert_eq!(fields.len(), NB_REPORT_COLUMNS);
        assert_eq!(&fields[..5], ["q1", "q1", "present_in", "SH1", "tax_sh1"]);
        // absent and missing thresholds are empty
        assert!(fields[5..20].iter().all(|f| f.is_empty()));
        assert_eq!(&fields[20..], ["UCL1", "tax_ucl1", "ref_SH1", "99.0"]);
    }

    #[test]
    fn present_sh_derived_from_best_ref() {
        let taxonomy = taxonomy();
        let best_hits = BestHits::default();
        let mut table = StatusTable::default();
        table.add(record("q1", "KY1_SH2", Status::Present, "", Threshold::T025));
        let row = Aggregator::new(&taxonomy, &best_hits).aggregate_query("q1", &table);
        assert_eq!(row.cells[1].sh_code, "SH2");
        assert_eq!(row.cells[1].taxonomy, "tax_sh2");
        assert_eq!(row.compound_code, "UCL2");
        assert_eq!(row.matched_sequence, "");
        assert_eq!(row.similarity, "");
    }

    #[test]
    fn first_compound_wins() {
        let taxonomy = taxonomy();
        let best_hits = BestHits::default();
        let mut table = StatusTable::default();
        // 3.0 has no compound for SH9, 2.0 gives UCL3 through a singleton hint, 0.5 would give UCL1
        table.add(record("q1", "", Status::Present, "SH9", Threshold::T030));
        table.add(record("q1", "", Status::Singleton, "SH3", Threshold::T020));
        table.add(record("q1", "", Status::NewCluster, "UCL2", Threshold::T010));
        table.add(record("q1", "", Status::Present, "SH1", Threshold::T005));

        let row = Aggregator::new(&taxonomy, &best_hits).aggregate_query("q1", &table);
        assert_eq!(row.compound_code, "UCL3");
        assert_eq!(row.compound_taxonomy, "tax_ucl3");
        assert_eq!(row.cells[0].status, "present_in");
        assert_eq!(row.cells[0].taxonomy, "");
        assert_eq!(row.cells[2].status, "new_singleton_in");
        assert_eq!(row.cells[2].sh_code, "");
        assert_eq!(row.cells[2].taxonomy, "tax_ucl3");
        assert_eq!(row.cells[4].status, "new_sh_in");
        assert_eq!(row.cells[4].taxonomy, "tax_ucl2");
        assert_eq!(row.cells[5].taxonomy, "tax_sh1");
    }

    #[test]
    fn one_row_per_query_seen_anywhere() {
        let taxonomy = taxonomy();
        let best_hits = BestHits::default();
        let mut table = StatusTable::default();
        table.add(record("q2", "", Status::Singleton, "", Threshold::T005));
        table.add(record("q1", "", Status::Singleton, "", Threshold::T030));
        table.add(record("q1", "", Status::Singleton, "", Threshold::T025));
        let rows = Aggregator::new(&taxonomy, &best_hits).aggregate(&table);
        let queries: Vec<&str> = rows.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["q1", "q2"]);
        assert!(rows.iter().all(|r| r.to_fields().len() == NB_REPORT_COLUMNS));
    }

    #[test]
    fn pident_rendering() {
        assert_eq!(format_pident(99.0), "99.0");
        assert_eq!(format_pident(98.75), "98.75");
        assert_eq!(format_pident(100.0), "100.0");
    }
}
