//! Per compound cluster status resolution.
//!
//! For each query of the compound cluster and each of the six thresholds we look at the
//! cluster containing the query in the single-linkage output and decide :
//! - **present** : the best hit reference of the query is in the same cluster.
//!   The SH code is the one of the best hit at that threshold.
//! - **singleton** / **new cluster** : the cluster contains no reference and only queries,
//!   one query gives a singleton, several a new cluster (members listed in `extra`).
//!   The SH of the best hit is kept as a contextual hint even though the best hit is elsewhere.
//! - **missing** : the query is absent from the clustering files of the threshold,
//!   or its cluster holds ids that are neither queries nor references of the compound cluster.
//!
//! When the cluster holds references but not the best hit the query is still declared present.
//! If one of the references shares the SH of the best hit at that threshold this SH is used,
//! otherwise we take the SH of the lexicographically smallest reference of the cluster.
//! This last rule is an approximate assignment, not a strict identity match : the SH reported
//! need not be the one of the query best hit.

use std::collections::BTreeSet;
use std::time::SystemTime;

use cpu_time::ProcessTime;
use fxhash::FxHashMap;

use crate::besthits::{load_best_hits, BestHits};
use crate::centroid::{load_centroid2sh, Centroid2Sh};
use crate::clusters::{find_cluster_id, ThresholdClusters};
use crate::errors::ShMatchError;
use crate::membership::{load_cluster_members, ClusterMembers};
use crate::status::{write_status_file, Status, StatusRecord};
use crate::threshold::Threshold;
use crate::utils::files::require_input;
use crate::utils::parameters::PostprocessParams;

/// Decides status of the queries of one compound cluster.
/// All tables are borrowed, the resolver has no state of its own.
pub struct StatusResolver<'a> {
    members: &'a ClusterMembers,
    best_hits: &'a BestHits,
    centroid2sh: &'a Centroid2Sh,
}

impl<'a> StatusResolver<'a> {
    pub fn new(members: &'a ClusterMembers, best_hits: &'a BestHits, centroid2sh: &'a Centroid2Sh) -> Self {
        StatusResolver { members, best_hits, centroid2sh }
    }

    /// status of one query at one threshold
    pub fn resolve(&self, query: &str, threshold: Threshold, clusters: &ThresholdClusters) -> StatusRecord {
        let best_ref = self.best_hits.get_target(query);
        //
        let cluster = match clusters.cluster_of(query) {
            Some(cluster) => cluster,
            None => return StatusRecord::missing(query, best_ref, threshold),
        };
        // references of the compound cluster found in the query cluster, sorted
        let refs_in_cluster: BTreeSet<&str> =
            cluster.iter().map(|m| m.as_str()).filter(|m| self.members.is_ref(m)).collect();
        let best_sh = self.centroid2sh.sh_or_empty(threshold, best_ref);
        //
        if !best_ref.is_empty() && refs_in_cluster.contains(best_ref) {
            return StatusRecord::new(query, best_ref, Status::Present, best_sh, "", threshold);
        }
        if refs_in_cluster.is_empty() {
            if !cluster.iter().all(|m| self.members.is_query(m)) {
                log::trace!(
                    "query {} at {} : cluster {:?} has members foreign to the compound cluster",
                    query,
                    threshold,
                    clusters.cluster_key_of(query)
                );
                return StatusRecord::missing(query, best_ref, threshold);
            }
            if cluster.len() == 1 {
                return StatusRecord::new(query, best_ref, Status::Singleton, best_sh, "", threshold);
            }
            let extra = cluster.join(" ");
            return StatusRecord::new(query, best_ref, Status::NewCluster, best_sh, &extra, threshold);
        }
        // references but not the best hit
        if let Some(sh) = self.shared_sh(threshold, best_ref, &refs_in_cluster) {
            return StatusRecord::new(query, best_ref, Status::Present, sh, "", threshold);
        }
        // refs_in_cluster is not empty here
        let smallest = refs_in_cluster.iter().next().copied().unwrap_or("");
        log::trace!("query {} at {} : relaxed assignment through reference {}", query, threshold, smallest);
        let sh = self.centroid2sh.sh_or_empty(threshold, smallest);
        StatusRecord::new(query, best_ref, Status::Present, sh, "", threshold)
    } // end of resolve

    // SH of the best hit if one of the references has it at this threshold
    fn shared_sh(&self, threshold: Threshold, best_ref: &str, refs: &BTreeSet<&str>) -> Option<&'a str> {
        if best_ref.is_empty() {
            return None;
        }
        let best_sh = self.centroid2sh.get_sh(threshold, best_ref)?;
        refs.iter()
            .any(|r| self.centroid2sh.get_sh(threshold, r) == Some(best_sh))
            .then_some(best_sh)
    }

    /// one record per query of the compound cluster, queries in sorted order
    pub fn resolve_threshold(&self, threshold: Threshold, clusters: &ThresholdClusters) -> Vec<StatusRecord> {
        self.members
            .get_query_ids()
            .iter()
            .map(|q| self.resolve(q, threshold, clusters))
            .collect()
    }
} // end of impl StatusResolver

//==========================================================================

/// What came out of the resolution of one compound cluster
#[derive(Debug)]
pub struct ClusterResolution {
    pub cluster_id: String,
    /// threshold major, queries sorted within a threshold
    pub records: Vec<StatusRecord>,
}

impl ClusterResolution {
    /// nb records by status
    pub fn get_status_counts(&self) -> FxHashMap<Status, usize> {
        let mut counts = FxHashMap::<Status, usize>::default();
        for r in &self.records {
            *counts.entry(r.status).or_insert(0) += 1;
        }
        counts
    }
}

/// Resolves one compound cluster from its files. Nothing is written here.
pub fn resolve_cluster(params: &PostprocessParams) -> Result<ClusterResolution, ShMatchError> {
    let cluster_id = find_cluster_id(&params.clusters_dir)?;
    require_input(&params.best_hits)?;
    require_input(&params.centroid2sh)?;
    //
    let members = load_cluster_members(&params.cluster_membership, &cluster_id)?;
    let best_hits = load_best_hits(&params.best_hits, params.aligner)?;
    let centroid2sh = load_centroid2sh(&params.centroid2sh)?;
    let resolver = StatusResolver::new(&members, &best_hits, &centroid2sh);
    //
    let mut records = Vec::<StatusRecord>::with_capacity(Threshold::ALL.len() * members.get_query_ids().len());
    for threshold in Threshold::ALL {
        let clusters = ThresholdClusters::load(&params.clusters_dir, threshold)?;
        if clusters.get_nb_clusters() == 0 {
            log::warn!("cluster {} : no clustering file for threshold {}", cluster_id, threshold);
        }
        records.append(&mut resolver.resolve_threshold(threshold, &clusters));
    }
    Ok(ClusterResolution { cluster_id, records })
} // end of resolve_cluster

/// Resolves a compound cluster and dumps its status file.
/// The output is created only once every record is computed.
pub fn postprocess(params: &PostprocessParams) -> Result<ClusterResolution, ShMatchError> {
    let start_t = SystemTime::now();
    let cpu_start = ProcessTime::now();
    //
    let resolution = resolve_cluster(params)?;
    write_status_file(&params.output, &resolution.records)?;
    //
    let counts = resolution.get_status_counts();
    for status in [Status::Present, Status::NewCluster, Status::Singleton, Status::Missing] {
        log::info!("cluster {} : {} : {}", resolution.cluster_id, status, counts.get(&status).unwrap_or(&0));
    }
    let cpu_time = cpu_start.elapsed();
    let elapsed_t = start_t.elapsed().map(|d| d.as_secs_f64()).unwrap_or(0.);
    log::info!("postprocess sys time(s) {:.2e} cpu time(s) {:.2e}", elapsed_t, cpu_time.as_secs_f64());
    Ok(resolution)
} // end of postprocess

//==========================================================================
