//! structures related to processing parameters of the two stages.
//! They are filled from command line and logged in json at start of a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::besthits::AlignerMode;

/// Inputs of the per cluster status resolution (postprocess stage)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostprocessParams {
    /// directory containing the mx_cluster_<ID>_out_<TH> files of one compound cluster
    pub clusters_dir: PathBuf,
    /// global ClusterID, MemberType, MemberID table
    pub cluster_membership: PathBuf,
    /// aligner best hits
    pub best_hits: PathBuf,
    /// format of best hits file
    pub aligner: AlignerMode,
    /// SH code, threshold code, reference id
    pub centroid2sh: PathBuf,
    /// status file to write
    pub output: PathBuf,
} // end of PostprocessParams

/// Inputs of the cross cluster aggregation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateParams {
    /// status files or directories containing them
    pub matches: Vec<PathBuf>,
    pub best_hits: PathBuf,
    pub aligner: AlignerMode,
    /// SH code -> taxonomy
    pub shs_file: PathBuf,
    /// SH code -> compound (UCL) code
    pub sh2compound: PathBuf,
    /// compound code -> taxonomy (code in field 2, taxonomy in field 3)
    pub compounds_file: PathBuf,
    pub out: PathBuf,
    /// nb threads used to read status files, 0 lets rayon decide
    pub nb_threads: usize,
} // end of AggregateParams

/// json rendering used in logs
pub fn params_to_json<T: Serialize>(params: &T) -> String {
    serde_json::to_string(params).unwrap_or_else(|e| format!("unserializable parameters : {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_carries_aligner_name() {
        let params = PostprocessParams {
            clusters_dir: PathBuf::from("calc_distm_out"),
            cluster_membership: PathBuf::from("cluster_membership.txt"),
            best_hits: PathBuf::from("best_hits.tsv"),
            aligner: AlignerMode::Minimap,
            centroid2sh: PathBuf::from("centroid2sh_mappings.txt"),
            output: PathBuf::from("pp_matches/matches.tsv"),
        };
        let json = params_to_json(&params);
        assert!(json.contains("\"aligner\":\"Minimap\""));
        assert!(json.contains("calc_distm_out"));
    }
}
