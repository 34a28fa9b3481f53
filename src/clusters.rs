//! Per threshold cluster assignment files produced by the single-linkage clustering.
//!
//! Files of a compound cluster live in one directory and are named `mx_cluster_<ClusterID>_out_<TH>`,
//! TH being the decimal form of the threshold. Each row is : raw cluster id, member id. No header.
//!
//! Raw cluster ids are only unique within a file, so clusters are keyed by file name and raw id.

use std::fs;
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use regex::Regex;

use crate::errors::ShMatchError;
use crate::threshold::Threshold;
use crate::utils::files::tsv_reader;

const CLUSTER_FILE_MARK: &str = "_out_";

// sorted file names of dir selected by a predicate on the name
fn list_files(dir: &Path, select: &dyn Fn(&str) -> bool) -> Result<Vec<PathBuf>, ShMatchError> {
    if !dir.is_dir() {
        log::error!("clusters directory {:?} does not exist", dir);
        return Err(ShMatchError::NoClusterFiles(dir.to_path_buf()));
    }
    let mut files = Vec::<PathBuf>::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let selected = path.file_name().and_then(|n| n.to_str()).map(select).unwrap_or(false);
        if selected {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
} // end of list_files

/// extracts compound cluster id from a name like mx_cluster_<ID>_out_0.030
pub fn parse_cluster_id(file_name: &str) -> Option<String> {
    // the extension is dropped before matching : mx_cluster_12_out_0.030 is seen as mx_cluster_12_out_0
    let stem = Path::new(file_name).file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let re = Regex::new(r"mx_cluster_(.+?)_out_").ok()?;
    re.captures(stem).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// Determines the compound cluster id from the first (sorted) clustering file of the directory.
/// This is a fatal precondition of the resolution.
pub fn find_cluster_id(dir: &Path) -> Result<String, ShMatchError> {
    let files = list_files(dir, &|name: &str| name.contains(CLUSTER_FILE_MARK))?;
    let first = match files.first() {
        Some(first) => first,
        None => {
            log::error!("no clustering output files found in {:?}", dir);
            return Err(ShMatchError::NoClusterFiles(dir.to_path_buf()));
        }
    };
    let name = first.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();
    match parse_cluster_id(&name) {
        Some(id) => {
            log::info!("compound cluster id : {} (from file {})", id, name);
            Ok(id)
        }
        None => {
            log::error!("cannot parse cluster id from file name : {}", name);
            Err(ShMatchError::BadClusterFileName(name))
        }
    }
} // end of find_cluster_id

/// clustering files of dir for one threshold
pub fn threshold_files(dir: &Path, threshold: Threshold) -> Result<Vec<PathBuf>, ShMatchError> {
    let suffix = format!("{}{}", CLUSTER_FILE_MARK, threshold.decimal());
    list_files(dir, &|name: &str| name.ends_with(&suffix))
}

//==========================================================================

/// Partition of members (queries and references) into clusters at one threshold.
#[derive(Default, Debug)]
pub struct ThresholdClusters {
    /// clusters in order of first appearance, members in file order
    clusters: Vec<(String, Vec<String>)>,
    /// key -> rank in clusters
    by_key: FxHashMap<String, usize>,
    /// member -> rank in clusters
    member_to_cluster: FxHashMap<String, usize>,
}

impl ThresholdClusters {
    /// adds (raw cluster id, member) rows read from `source`
    pub fn add_rows<I>(&mut self, source: &str, rows: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (raw_id, member) in rows {
            let key = format!("{}_{}", source, raw_id);
            let rank = match self.by_key.get(&key) {
                Some(rank) => *rank,
                None => {
                    self.clusters.push((key.clone(), Vec::new()));
                    self.by_key.insert(key, self.clusters.len() - 1);
                    self.clusters.len() - 1
                }
            };
            self.clusters[rank].1.push(member.clone());
            self.member_to_cluster.insert(member, rank);
        }
    } // end of add_rows

    /// loads all files of a threshold. No file gives an empty partition.
    pub fn load(dir: &Path, threshold: Threshold) -> Result<Self, ShMatchError> {
        let mut clusters = ThresholdClusters::default();
        for file in threshold_files(dir, threshold)? {
            let source = file.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();
            let mut reader = tsv_reader(&file)?;
            let rows: Vec<(String, String)> = reader
                .records()
                .filter_map(|r| r.ok())
                .filter(|r| r.len() >= 2)
                .map(|r| (r[0].to_string(), r[1].to_string()))
                .collect();
            log::trace!("file {}, nb rows : {}", source, rows.len());
            clusters.add_rows(&source, rows);
        }
        log::debug!(
            "threshold {} : nb clusters {}, nb members {}",
            threshold,
            clusters.clusters.len(),
            clusters.member_to_cluster.len()
        );
        Ok(clusters)
    } // end of load

    /// members of the cluster containing `member`, in file order
    pub fn cluster_of(&self, member: &str) -> Option<&[String]> {
        self.member_to_cluster.get(member).map(|rank| self.clusters[*rank].1.as_slice())
    }

    /// key of the cluster containing `member`
    pub fn cluster_key_of(&self, member: &str) -> Option<&str> {
        self.member_to_cluster.get(member).map(|rank| self.clusters[*rank].0.as_str())
    }

    pub fn get_nb_clusters(&self) -> usize {
        self.clusters.len()
    }
} // end of impl ThresholdClusters

//==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn cluster_id_from_file_name() {
        assert_eq!(parse_cluster_id("mx_cluster_12_out_0.030"), Some("12".to_string()));
        assert_eq!(parse_cluster_id("mx_cluster_UCL10_000123_out_0.005"), Some("UCL10_000123".to_string()));
        assert_eq!(parse_cluster_id("matrix_12_out_0.030"), None);
    }

    #[test]
    fn no_cluster_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "readme.txt", "nothing");
        assert!(matches!(find_cluster_id(dir.path()), Err(ShMatchError::NoClusterFiles(_))));
        let absent = dir.path().join("absent");
        assert!(matches!(find_cluster_id(&absent), Err(ShMatchError::NoClusterFiles(_))));
    }

    #[test]
    fn bad_file_name_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "clusters_out_0.030", "0\tq1\n");
        assert!(matches!(find_cluster_id(dir.path()), Err(ShMatchError::BadClusterFileName(_))));
    }

    #[test]
    fn raw_ids_are_disambiguated_per_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "mx_cluster_7_out_0.030", "0\tq1\n0\tr1\n1\tq2\n");
        write_file(dir.path(), "mx_cluster_7b_out_0.030", "0\tq3\n");
        write_file(dir.path(), "mx_cluster_7_out_0.025", "0\tq1\n0\tq2\n0\tq3\n");

        assert_eq!(find_cluster_id(dir.path()).unwrap(), "7");
        let clusters = ThresholdClusters::load(dir.path(), Threshold::T030).unwrap();
        assert_eq!(clusters.get_nb_clusters(), 3);
        assert_eq!(clusters.cluster_of("q1").unwrap(), ["q1", "r1"]);
        assert_eq!(clusters.cluster_of("q3").unwrap(), ["q3"]);
        assert_ne!(clusters.cluster_key_of("q1"), clusters.cluster_key_of("q3"));
        assert!(clusters.cluster_of("absent").is_none());

        let coarse = ThresholdClusters::load(dir.path(), Threshold::T025).unwrap();
        assert_eq!(coarse.cluster_of("q2").unwrap(), ["q1", "q2", "q3"]);
        let empty = ThresholdClusters::load(dir.path(), Threshold::T005).unwrap();
        assert_eq!(empty.get_nb_clusters(), 0);
    }
}
