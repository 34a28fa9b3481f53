//! Status of a query at one threshold and the status files exchanged between the two stages.
//!
//! A status file is tab separated with header `query best_ref status sh_code extra threshold`,
//! one row per (query, threshold).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::ShMatchError;
use crate::threshold::Threshold;
use crate::utils::files::{tsv_reader, tsv_writer};

pub const STATUS_HEADER: [&str; 6] = ["query", "best_ref", "status", "sh_code", "extra", "threshold"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// query clusters with a reference
    Present,
    /// query clusters only with other queries
    NewCluster,
    /// query is alone in its cluster
    Singleton,
    /// query not found in the clustering of the threshold
    Missing,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::NewCluster => "new cluster",
            Status::Singleton => "singleton",
            Status::Missing => "missing",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Status::Present),
            "new cluster" => Ok(Status::NewCluster),
            "singleton" => Ok(Status::Singleton),
            "missing" => Ok(Status::Missing),
            _ => Err(format!("unknown status {:?}", s)),
        }
    }
}

/// Decision for one query at one threshold. Not mutated once created.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusRecord {
    pub query: String,
    /// best hit reference of the query, empty if none
    pub best_ref: String,
    pub status: Status,
    /// SH code, may be a contextual hint from the best hit for singleton and new cluster
    pub sh_code: String,
    /// space joined cluster members for new cluster, in clustering file order
    pub extra: String,
    pub threshold: Threshold,
}

impl StatusRecord {
    pub fn new(query: &str, best_ref: &str, status: Status, sh_code: &str, extra: &str, threshold: Threshold) -> Self {
        StatusRecord {
            query: query.to_string(),
            best_ref: best_ref.to_string(),
            status,
            sh_code: sh_code.to_string(),
            extra: extra.to_string(),
            threshold,
        }
    }

    /// query not found at threshold
    pub fn missing(query: &str, best_ref: &str, threshold: Threshold) -> Self {
        StatusRecord::new(query, best_ref, Status::Missing, "", "", threshold)
    }
} // end of impl StatusRecord

//==========================================================================

/// writes records with header. Parent directories are created.
pub fn write_status_file(path: &Path, records: &[StatusRecord]) -> Result<(), ShMatchError> {
    let mut writer = tsv_writer(path, true)?;
    writer.write_record(STATUS_HEADER)?;
    for r in records {
        writer.write_record([
            r.query.as_str(),
            r.best_ref.as_str(),
            r.status.as_str(),
            r.sh_code.as_str(),
            r.extra.as_str(),
            r.threshold.decimal(),
        ])?;
    }
    writer.flush()?;
    log::info!("dumped nb status records {} in {:?}", records.len(), path);
    Ok(())
} // end of write_status_file

/// Reads a status file, its first line being a header.
/// Rows with less than 6 fields or an unknown threshold are skipped,
/// an unknown status is read as missing.
/// Thresholds may be written in decimal form or with legacy alias.
pub fn read_status_file(path: &Path) -> Result<Vec<StatusRecord>, ShMatchError> {
    let mut reader = tsv_reader(path)?;
    let mut records = Vec::<StatusRecord>::new();
    let mut nb_skipped = 0usize;
    for row in reader.records().skip(1) {
        let row = match row {
            Ok(row) if row.len() >= 6 => row,
            _ => {
                nb_skipped += 1;
                continue;
            }
        };
        let threshold = match row[5].parse::<Threshold>() {
            Ok(threshold) => threshold,
            Err(e) => {
                log::debug!("file {:?} : {}", path, e);
                nb_skipped += 1;
                continue;
            }
        };
        let status = row[2].parse::<Status>().unwrap_or_else(|e| {
            log::debug!("file {:?} : {}, read as missing", path, e);
            Status::Missing
        });
        records.push(StatusRecord::new(&row[0], &row[1], status, &row[3], &row[4], threshold));
    }
    if nb_skipped > 0 {
        log::debug!("file {:?} : skipped nb malformed rows {}", path, nb_skipped);
    }
    Ok(records)
} // end of read_status_file
