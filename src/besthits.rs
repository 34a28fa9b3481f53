//! Best hit selection from aligner tabular output.
//!
//! Each query may have many hits against the reference database, we keep one per query.
//! Two aligner outputs are handled, each with 8 tab separated columns, header optional :
//! - MMseqs2 convertalis : query,target,evalue,bits,alnlen,pident,qcov,tcov.
//!   Ranking : ascending evalue, then descending bits, then descending pident.
//! - minimap2 : qseqid,sseqid,pident,pident_gc,qcov,alnlen,mapq,tpr.
//!   Ranking : descending pident, then descending mapq, then descending qcov.
//!
//! In both cases the first row seen wins exact ties. Rows without exactly 8 fields
//! or with a non numeric (or non finite) ranking field are skipped.

use std::io;
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::errors::ShMatchError;
use crate::utils::files::{require_input, tsv_reader_from};

/// number of columns expected in both formats
pub const NB_BEST_HIT_COLUMNS: usize = 8;

/// selects the best hit parser. Chosen by caller, never sniffed from content.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum AlignerMode {
    #[default]
    #[strum(serialize = "mmseqs")]
    Mmseqs,
    #[strum(serialize = "minimap")]
    Minimap,
}

impl AlignerMode {
    pub fn from_name(name: &str) -> Result<AlignerMode, ShMatchError> {
        AlignerMode::from_str(name.trim()).map_err(|_| ShMatchError::UnknownAligner(name.to_string()))
    }
}

//==========================================================================

/// maps column names to their position in a row.
/// Built from the header if the file has one, from the default layout otherwise.
pub struct ColumnIndex {
    by_name: FxHashMap<String, usize>,
    defaults: &'static [&'static str; NB_BEST_HIT_COLUMNS],
}

impl ColumnIndex {
    fn from_defaults(defaults: &'static [&'static str; NB_BEST_HIT_COLUMNS]) -> Self {
        let by_name = defaults.iter().enumerate().map(|(i, name)| (name.to_string(), i)).collect();
        ColumnIndex { by_name, defaults }
    }

    fn from_header(columns: &[String], defaults: &'static [&'static str; NB_BEST_HIT_COLUMNS]) -> Self {
        let by_name = columns.iter().enumerate().map(|(i, name)| (name.clone(), i)).collect();
        ColumnIndex { by_name, defaults }
    }

    /// position of a column, falling back to its default position when the header does not name it
    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied().or_else(|| self.defaults.iter().position(|n| *n == name))
    }

    fn field<'r>(&self, row: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.get(name).and_then(|i| row.get(i))
    }

    // nan and inf are not ranked, the row is skipped as malformed
    fn number(&self, row: &StringRecord, name: &str) -> Option<f64> {
        self.field(row, name).and_then(|s| s.trim().parse::<f64>().ok()).filter(|v| v.is_finite())
    }
} // end of impl ColumnIndex

/// A candidate hit extracted from one row.
/// `rank` is compared lexicographically, lower is better.
#[derive(Clone, Debug)]
pub struct CandidateHit {
    pub query: String,
    pub target: String,
    pub rank: [f64; 3],
    pub pident: f64,
}

impl CandidateHit {
    /// strict lexicographic comparison of ranks, all finite
    pub fn ranks_before(&self, other: &CandidateHit) -> bool {
        for (a, b) in self.rank.iter().zip(other.rank.iter()) {
            if a == b {
                continue;
            }
            return a < b;
        }
        false
    }
}

/// One parser per aligner output format
pub trait BestHitParser {
    /// column names in default order, used when the file has no header
    fn default_columns(&self) -> &'static [&'static str; NB_BEST_HIT_COLUMNS];

    /// true if the (lowercased, trimmed) first row is a header
    fn is_header(&self, columns: &[String]) -> bool;

    /// extracts a candidate from a row having the right number of fields
    fn candidate(&self, row: &StringRecord, index: &ColumnIndex) -> Option<CandidateHit>;
}

pub struct MmseqsParser;

const MMSEQS_COLUMNS: [&str; NB_BEST_HIT_COLUMNS] =
    ["query", "target", "evalue", "bits", "alnlen", "pident", "qcov", "tcov"];

impl BestHitParser for MmseqsParser {
    fn default_columns(&self) -> &'static [&'static str; NB_BEST_HIT_COLUMNS] {
        &MMSEQS_COLUMNS
    }

    fn is_header(&self, columns: &[String]) -> bool {
        columns.iter().any(|c| c == "query") && columns.iter().any(|c| c == "target")
    }

    fn candidate(&self, row: &StringRecord, index: &ColumnIndex) -> Option<CandidateHit> {
        let query = index.field(row, "query")?;
        let target = index.field(row, "target")?;
        let evalue = index.number(row, "evalue")?;
        let bits = index.number(row, "bits")?;
        let pident = index.number(row, "pident")?;
        Some(CandidateHit {
            query: query.to_string(),
            target: target.to_string(),
            rank: [evalue, -bits, -pident],
            pident,
        })
    }
} // end of impl BestHitParser for MmseqsParser

pub struct MinimapParser;

const MINIMAP_COLUMNS: [&str; NB_BEST_HIT_COLUMNS] =
    ["qseqid", "sseqid", "pident", "pident_gc", "qcov", "alnlen", "mapq", "tpr"];

impl BestHitParser for MinimapParser {
    fn default_columns(&self) -> &'static [&'static str; NB_BEST_HIT_COLUMNS] {
        &MINIMAP_COLUMNS
    }

    fn is_header(&self, columns: &[String]) -> bool {
        columns.iter().any(|c| c == "qseqid") && columns.iter().any(|c| c == "sseqid")
    }

    fn candidate(&self, row: &StringRecord, index: &ColumnIndex) -> Option<CandidateHit> {
        let query = index.field(row, "qseqid")?;
        let target = index.field(row, "sseqid")?;
        let pident = index.number(row, "pident")?;
        let mapq = index.number(row, "mapq")?;
        let qcov = index.number(row, "qcov")?;
        Some(CandidateHit {
            query: query.to_string(),
            target: target.to_string(),
            rank: [-pident, -mapq, -qcov],
            pident,
        })
    }
} // end of impl BestHitParser for MinimapParser

//==========================================================================

/// the best hit retained for a query
#[derive(Clone, Debug, PartialEq)]
pub struct BestHit {
    pub target: String,
    pub pident: f64,
}

/// best hit table : query -> best hit. Immutable once loaded.
#[derive(Default, Debug)]
pub struct BestHits {
    hits: FxHashMap<String, BestHit>,
}

impl BestHits {
    /// best reference id of a query, empty if the query has no hit
    pub fn get_target(&self, query: &str) -> &str {
        self.hits.get(query).map(|h| h.target.as_str()).unwrap_or("")
    }

    pub fn get_pident(&self, query: &str) -> Option<f64> {
        self.hits.get(query).map(|h| h.pident)
    }

    pub fn get(&self, query: &str) -> Option<&BestHit> {
        self.hits.get(query)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
} // end of impl BestHits

/// selects best hit per query from any reader with the given parser
pub fn parse_best_hits<P: BestHitParser, R: io::Read>(parser: &P, rdr: R) -> BestHits {
    let mut reader = tsv_reader_from(rdr);
    let mut records = reader.records();
    let mut best = FxHashMap::<String, CandidateHit>::default();
    let mut nb_skipped = 0usize;
    //
    let first = loop {
        match records.next() {
            None => return BestHits::default(),
            Some(Ok(row)) => break row,
            Some(Err(e)) => {
                log::debug!("skipping unreadable best hit row : {}", e);
                nb_skipped += 1;
            }
        }
    };
    let columns: Vec<String> = first.iter().map(|c| c.trim().to_lowercase()).collect();
    let (index, first_data) = if parser.is_header(&columns) {
        (ColumnIndex::from_header(&columns, parser.default_columns()), None)
    } else {
        (ColumnIndex::from_defaults(parser.default_columns()), Some(first))
    };
    //
    let rows = first_data.into_iter().map(Ok).chain(records);
    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::debug!("skipping unreadable best hit row : {}", e);
                nb_skipped += 1;
                continue;
            }
        };
        if row.len() != NB_BEST_HIT_COLUMNS {
            nb_skipped += 1;
            continue;
        }
        let candidate = match parser.candidate(&row, &index) {
            Some(candidate) => candidate,
            None => {
                nb_skipped += 1;
                continue;
            }
        };
        let replace = match best.get(&candidate.query) {
            Some(prev) => candidate.ranks_before(prev),
            None => true,
        };
        if replace {
            best.insert(candidate.query.clone(), candidate);
        }
    }
    if nb_skipped > 0 {
        log::info!("best hits : skipped nb malformed rows : {}", nb_skipped);
    }
    let hits = best
        .into_iter()
        .map(|(q, c)| (q, BestHit { target: c.target, pident: c.pident }))
        .collect::<FxHashMap<String, BestHit>>();
    log::debug!("best hits : nb queries with a hit : {}", hits.len());
    BestHits { hits }
} // end of parse_best_hits

/// loads a best hit file in the format of `mode`
pub fn load_best_hits(path: &Path, mode: AlignerMode) -> Result<BestHits, ShMatchError> {
    require_input(path)?;
    log::info!("loading best hits from {:?}, aligner {}", path, mode);
    let file = std::fs::File::open(path)?;
    let hits = match mode {
        AlignerMode::Mmseqs => parse_best_hits(&MmseqsParser, file),
        AlignerMode::Minimap => parse_best_hits(&MinimapParser, file),
    };
    Ok(hits)
} // end of load_best_hits

//==========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mmseqs(content: &str) -> BestHits {
        parse_best_hits(&MmseqsParser, content.as_bytes())
    }

    #[test]
    fn lowest_evalue_then_bits_then_pident() {
        let content = "\
q1\tr_a\t1e-5\t300\t500\t99.0\t1.0\t1.0
q1\tr_b\t1e-10\t200\t500\t97.0\t1.0\t1.0
q1\tr_c\t1e-10\t250\t500\t95.0\t1.0\t1.0
q1\tr_d\t1e-10\t250\t500\t96.5\t1.0\t1.0
";
        let hits = mmseqs(content);
        assert_eq!(hits.get_target("q1"), "r_d");
        assert_eq!(hits.get_pident("q1"), Some(96.5));
    }

    #[test]
    fn first_seen_wins_exact_tie() {
        let content = "\
q1\tfirst\t1e-10\t200\t500\t99.0\t1.0\t1.0
q1\tsecond\t1e-10\t200\t500\t99.0\t1.0\t1.0
";
        assert_eq!(mmseqs(content).get_target("q1"), "first");
    }

    #[test]
    fn header_is_detected_and_columns_located_by_name() {
        let content = "\
Target\tQuery\tevalue\tbits\talnlen\tpident\tqcov\ttcov
ref_SH0001.01FU\tq1\t1e-10\t200\t500\t99.0\t1.0\t1.0
";
        let hits = mmseqs(content);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.get_target("q1"), "ref_SH0001.01FU");
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let content = "\
q1\tr_a\tnot_a_number\t300\t500\t99.0\t1.0\t1.0
q1\tr_b\t1e-3\t300\t500\t99.0\t1.0
q1\tr_c\t1e-3\t300\t500\t99.0\t1.0\t1.0\textra
q2\tr_d\t1e-3\t300\t500\t98.0\t1.0\t1.0
";
        let hits = mmseqs(content);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.get_target("q1"), "");
        assert_eq!(hits.get_target("q2"), "r_d");
    }

    #[test]
    fn non_finite_rank_does_not_block_later_rows() {
        let content = "\
q1\tr_nan\tnan\t300\t500\t99.0\t1.0\t1.0
q1\tr_inf\t1e-20\tinf\t500\t99.0\t1.0\t1.0
q1\tr_good\t1e-10\t200\t500\t97.0\t1.0\t1.0
q2\tr_nan_pident\t1e-10\t200\t500\tNaN\t1.0\t1.0
";
        let hits = mmseqs(content);
        assert_eq!(hits.get_target("q1"), "r_good");
        assert_eq!(hits.get_pident("q1"), Some(97.0));
        assert_eq!(hits.get_target("q2"), "");
        let minimap = "q1\tr_nan\tnan\tnan\t0.9\t500\t60\t1\nq1\tr_ok\t95.0\t95.0\t0.9\t500\t60\t1\n";
        assert_eq!(parse_best_hits(&MinimapParser, minimap.as_bytes()).get_target("q1"), "r_ok");
    }

    #[test]
    fn empty_input_gives_empty_table() {
        assert!(mmseqs("").is_empty());
    }

    #[test]
    fn minimap_ranks_on_pident_mapq_qcov() {
        let content = "\
qseqid\tsseqid\tpident\tpident_gc\tqcov\talnlen\tmapq\ttpr
q1\tr_a\t98.0\t98.0\t0.9\t500\t60\t1
q1\tr_b\t99.0\t99.0\t0.8\t500\t30\t1
q1\tr_c\t99.0\t99.0\t0.9\t500\t30\t1
q1\tr_d\t99.0\t99.0\t0.95\t500\t10\t1
";
        let hits = parse_best_hits(&MinimapParser, content.as_bytes());
        assert_eq!(hits.get_target("q1"), "r_c");
        assert_eq!(hits.get_pident("q1"), Some(99.0));
    }

    #[test]
    fn aligner_mode_names() {
        assert_eq!(AlignerMode::from_name("mmseqs").unwrap(), AlignerMode::Mmseqs);
        assert_eq!(AlignerMode::from_name("minimap").unwrap(), AlignerMode::Minimap);
        assert!(AlignerMode::from_name("blast").is_err());
        assert_eq!(AlignerMode::Minimap.to_string(), "minimap");
        assert_eq!(AlignerMode::default(), AlignerMode::Mmseqs);
    }
}
