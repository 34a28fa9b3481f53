//! Global cluster membership table : ClusterID, MemberType (Query|Ref), MemberID. No header.
//! Only rows of the compound cluster being resolved are kept.

use std::collections::BTreeSet;
use std::path::Path;

use fxhash::FxHashSet;

use crate::errors::ShMatchError;
use crate::utils::files::tsv_reader;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberType {
    Query,
    Ref,
}

impl MemberType {
    /// matched case insensitively on first letter
    pub fn from_field(field: &str) -> Option<MemberType> {
        match field.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('q') => Some(MemberType::Query),
            Some('r') => Some(MemberType::Ref),
            _ => None,
        }
    }
}

/// queries and references of one compound cluster
#[derive(Default, Debug)]
pub struct ClusterMembers {
    /// sorted, queries are resolved in this order
    query_ids: BTreeSet<String>,
    ref_ids: FxHashSet<String>,
}

impl ClusterMembers {
    pub fn new(query_ids: BTreeSet<String>, ref_ids: FxHashSet<String>) -> Self {
        ClusterMembers { query_ids, ref_ids }
    }

    pub fn get_query_ids(&self) -> &BTreeSet<String> {
        &self.query_ids
    }

    pub fn is_query(&self, id: &str) -> bool {
        self.query_ids.contains(id)
    }

    pub fn is_ref(&self, id: &str) -> bool {
        self.ref_ids.contains(id)
    }

    pub fn get_nb_refs(&self) -> usize {
        self.ref_ids.len()
    }

    /// adds a row of the membership table
    pub fn insert(&mut self, member_type: MemberType, id: &str) {
        match member_type {
            MemberType::Query => {
                self.query_ids.insert(id.to_string());
            }
            MemberType::Ref => {
                self.ref_ids.insert(id.to_string());
            }
        }
    }
} // end of impl ClusterMembers

/// loads members of `cluster_id`. A missing table gives an empty membership.
pub fn load_cluster_members(path: &Path, cluster_id: &str) -> Result<ClusterMembers, ShMatchError> {
    let mut members = ClusterMembers::default();
    if !path.exists() {
        log::warn!("cluster membership file {:?} does not exist, cluster {} has no members", path, cluster_id);
        return Ok(members);
    }
    let mut reader = tsv_reader(path)?;
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(_) => continue,
        };
        if row.len() < 3 || &row[0] != cluster_id {
            continue;
        }
        if let Some(member_type) = MemberType::from_field(&row[1]) {
            members.insert(member_type, &row[2]);
        }
    }
    log::info!(
        "cluster {} : nb queries {}, nb references {}",
        cluster_id,
        members.query_ids.len(),
        members.ref_ids.len()
    );
    Ok(members)
} // end of load_cluster_members
