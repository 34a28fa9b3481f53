//! The three static taxonomy tables used to annotate the final report :
//! - SH code -> SH taxonomy (shs_out.txt, fields 1 and 2),
//! - SH code -> compound (UCL) code (sh2compound_mapping.txt, fields 1 and 2),
//! - compound code -> compound taxonomy (compounds_out.txt, fields 2 and 3).
//!
//! Absent keys resolve to empty string.

use std::path::Path;

use fxhash::FxHashMap;

use crate::errors::ShMatchError;
use crate::utils::files::{require_input, tsv_reader};

pub const SH_PREFIX: &str = "SH";
pub const COMPOUND_PREFIX: &str = "UCL";

/// true if s has the shape of an SH code : SH0989441.10FU
pub fn looks_like_sh(s: &str) -> bool {
    s.starts_with(SH_PREFIX)
}

/// true if s has the shape of a compound code : UCL10_000123
pub fn looks_like_compound(s: &str) -> bool {
    s.starts_with(COMPOUND_PREFIX)
}

/// Extracts an SH code from a reference id such as `KY123456_SH0989441.10FU`.
/// The id is split on its first underscore, the second part is returned if it looks like an SH code.
pub fn sh_from_target(target: &str) -> &str {
    match target.split_once('_') {
        Some((_, tail)) if looks_like_sh(tail) => tail,
        _ => "",
    }
}

/// loads a 2 columns keyed table from fields key_idx and val_idx. Shorter rows are skipped, last row wins.
pub fn load_map_file(path: &Path, key_idx: usize, val_idx: usize) -> Result<FxHashMap<String, String>, ShMatchError> {
    require_input(path)?;
    let min_len = key_idx.max(val_idx) + 1;
    let mut map = FxHashMap::<String, String>::default();
    let mut reader = tsv_reader(path)?;
    for row in reader.records().filter_map(|r| r.ok()) {
        if row.len() < min_len {
            continue;
        }
        map.insert(row[key_idx].to_string(), row[val_idx].to_string());
    }
    log::debug!("loaded nb keys {} from {:?}", map.len(), path);
    Ok(map)
} // end of load_map_file

/// Lookup tables shared read only by the aggregation
#[derive(Default, Debug)]
pub struct TaxonomyMaps {
    sh2tax: FxHashMap<String, String>,
    sh2ucl: FxHashMap<String, String>,
    ucl2tax: FxHashMap<String, String>,
}

impl TaxonomyMaps {
    pub fn new(
        sh2tax: FxHashMap<String, String>,
        sh2ucl: FxHashMap<String, String>,
        ucl2tax: FxHashMap<String, String>,
    ) -> Self {
        TaxonomyMaps { sh2tax, sh2ucl, ucl2tax }
    }

    pub fn load(shs_file: &Path, sh2compound: &Path, compounds_file: &Path) -> Result<Self, ShMatchError> {
        let sh2tax = load_map_file(shs_file, 0, 1)?;
        let sh2ucl = load_map_file(sh2compound, 0, 1)?;
        let ucl2tax = load_map_file(compounds_file, 1, 2)?;
        log::info!(
            "taxonomy tables : nb SH {}, nb SH with compound {}, nb compounds {}",
            sh2tax.len(),
            sh2ucl.len(),
            ucl2tax.len()
        );
        Ok(TaxonomyMaps::new(sh2tax, sh2ucl, ucl2tax))
    }

    pub fn sh_taxonomy(&self, sh: &str) -> &str {
        self.sh2tax.get(sh).map(|s| s.as_str()).unwrap_or("")
    }

    /// compound of an SH, None if the SH has no compound entry
    pub fn compound_of(&self, sh: &str) -> Option<&str> {
        self.sh2ucl.get(sh).map(|s| s.as_str())
    }

    pub fn compound_taxonomy(&self, ucl: &str) -> &str {
        self.ucl2tax.get(ucl).map(|s| s.as_str()).unwrap_or("")
    }

    /// a code that is already a compound is returned as is, otherwise it is translated as an SH
    pub fn to_compound<'b>(&'b self, code: &'b str) -> &'b str {
        if looks_like_compound(code) {
            code
        } else {
            self.compound_of(code).unwrap_or("")
        }
    }
} // end of impl TaxonomyMaps

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sh_extracted_after_first_underscore() {
        assert_eq!(sh_from_target("KY123456_SH0989441.10FU"), "SH0989441.10FU");
        assert_eq!(sh_from_target("ref_SH0001.01FU"), "SH0001.01FU");
        assert_eq!(sh_from_target("a_b_SH0001.01FU"), "");
        assert_eq!(sh_from_target("SH0001.01FU"), "");
        assert_eq!(sh_from_target(""), "");
    }

    #[test]
    fn tables_load_from_their_columns() {
        let dir = tempfile::tempdir().unwrap();
        let shs = dir.path().join("shs_out.txt");
        let sh2c = dir.path().join("sh2compound_mapping.txt");
        let comp = dir.path().join("compounds_out.txt");
        write!(std::fs::File::create(&shs).unwrap(), "SH1\tk__Fungi;s__a\nSHX\n").unwrap();
        write!(std::fs::File::create(&sh2c).unwrap(), "SH1\tUCL1\n").unwrap();
        write!(std::fs::File::create(&comp).unwrap(), "x\tUCL1\tk__Fungi;g__b\nUCL9\tshort\n").unwrap();

        let maps = TaxonomyMaps::load(&shs, &sh2c, &comp).unwrap();
        assert_eq!(maps.sh_taxonomy("SH1"), "k__Fungi;s__a");
        assert_eq!(maps.sh_taxonomy("SHX"), "");
        assert_eq!(maps.compound_of("SH1"), Some("UCL1"));
        assert_eq!(maps.compound_taxonomy("UCL1"), "k__Fungi;g__b");
        assert_eq!(maps.compound_taxonomy("UCL9"), "");
        assert_eq!(maps.to_compound("SH1"), "UCL1");
        assert_eq!(maps.to_compound("UCL7"), "UCL7");
        assert_eq!(maps.to_compound("SH2"), "");
    }

    #[test]
    fn absent_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let res = load_map_file(&dir.path().join("shs_out.txt"), 0, 1);
        assert!(matches!(res, Err(ShMatchError::MissingInput(_))));
    }
}
