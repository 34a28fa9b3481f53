//! centroid2sh mappings of the SH database : SH code, threshold code (1..6), reference id. No header.
//!
//! A reference centroid can belong to different SH at different cutoffs, so the lookup is keyed by threshold.

use std::path::Path;

use fxhash::FxHashMap;

use crate::errors::ShMatchError;
use crate::threshold::Threshold;
use crate::utils::files::{require_input, tsv_reader};

/// reference id -> SH code, one table per threshold code
#[derive(Default, Debug)]
pub struct Centroid2Sh {
    by_code: [FxHashMap<String, String>; 6],
}

impl Centroid2Sh {
    pub fn insert(&mut self, threshold: Threshold, ref_id: &str, sh_code: &str) {
        let slot = (threshold.code() - 1) as usize;
        self.by_code[slot].insert(ref_id.to_string(), sh_code.to_string());
    }

    /// SH of a reference at a threshold
    pub fn get_sh(&self, threshold: Threshold, ref_id: &str) -> Option<&str> {
        let slot = (threshold.code() - 1) as usize;
        self.by_code[slot].get(ref_id).map(|s| s.as_str())
    }

    /// same as [get_sh](Self::get_sh), empty string when absent or when ref_id is empty
    pub fn sh_or_empty(&self, threshold: Threshold, ref_id: &str) -> &str {
        if ref_id.is_empty() {
            return "";
        }
        self.get_sh(threshold, ref_id).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.by_code.iter().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
} // end of impl Centroid2Sh

/// loads the mapping file. Rows with less than 3 fields or an unknown threshold code are skipped.
pub fn load_centroid2sh(path: &Path) -> Result<Centroid2Sh, ShMatchError> {
    require_input(path)?;
    let mut mapping = Centroid2Sh::default();
    let mut nb_skipped = 0usize;
    let mut reader = tsv_reader(path)?;
    for row in reader.records() {
        let row = match row {
            Ok(row) if row.len() >= 3 => row,
            _ => {
                nb_skipped += 1;
                continue;
            }
        };
        let threshold = match row[1].trim().parse::<u8>().ok().and_then(Threshold::from_code) {
            Some(threshold) => threshold,
            None => {
                nb_skipped += 1;
                continue;
            }
        };
        mapping.insert(threshold, &row[2], &row[0]);
    }
    log::info!("centroid2sh : loaded nb mappings {}, skipped nb rows {}", mapping.len(), nb_skipped);
    Ok(mapping)
} // end of load_centroid2sh
