//! errors returned by the library.
//!
//! Malformed rows are never reported here, they are skipped where they are read.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShMatchError {
    #[error("no clustering output files (*_out_*) found in {0:?}")]
    NoClusterFiles(PathBuf),

    #[error("cannot parse cluster id from file name : {0}")]
    BadClusterFileName(String),

    #[error("required input file not found : {0:?}")]
    MissingInput(PathBuf),

    #[error("unknown threshold : {0:?}")]
    UnknownThreshold(String),

    #[error("unknown aligner : {0:?}, expecting mmseqs or minimap")]
    UnknownAligner(String),

    #[error("could not build thread pool : {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error : {0}")]
    Io(#[from] std::io::Error),

    #[error("tsv error : {0}")]
    Csv(#[from] csv::Error),
}
