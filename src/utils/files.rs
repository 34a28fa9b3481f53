//! This file contains directory exploration and tsv reader/writer construction.
//! All tables handled by the crate are tab separated, headerless for the csv crate
//! (headers, when present, are detected and skipped by the callers).

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Reader, ReaderBuilder, Writer, WriterBuilder};

use crate::errors::ShMatchError;

/// checks a top level input exists, this is a fatal precondition.
pub fn require_input(path: &Path) -> Result<(), ShMatchError> {
    if !path.is_file() {
        log::error!("required input file not found : {:?}", path);
        return Err(ShMatchError::MissingInput(path.to_path_buf()));
    }
    Ok(())
} // end of require_input

/// opens a tab separated file. Rows can have a variable number of fields, blank lines are skipped.
pub fn tsv_reader(path: &Path) -> Result<Reader<File>, ShMatchError> {
    log::trace!("opening tsv file {:?}", path);
    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    Ok(reader)
} // end of tsv_reader

/// same as [tsv_reader] for any io::Read
pub fn tsv_reader_from<R: io::Read>(rdr: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr)
}

/// creates a tab separated output file, creating parent directories if needed.
/// With `quote` fields are quoted only when they contain a tab, a quote or a newline,
/// without it fields are written verbatim.
pub fn tsv_writer(path: &Path, quote: bool) -> Result<Writer<File>, ShMatchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let style = if quote { QuoteStyle::Necessary } else { QuoteStyle::Never };
    let writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quote_style(style)
        .from_path(path)?;
    Ok(writer)
} // end of tsv_writer

// returns true if file is a status file (*.tsv)
fn is_status_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == "tsv").unwrap_or(false)
}

/// scan directory recursively, collecting status files.
/// adapted from from crate fd_find
fn process_dir(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<usize> {
    let mut nb_found = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            nb_found += process_dir(&path, found)?;
        } else if is_status_file(&path) {
            found.push(path);
            nb_found += 1;
        }
    }
    log::trace!("dir {:?}, nb status files : {}", dir, nb_found);
    Ok(nb_found)
} // end of process_dir

/// Expands a list of paths into status files.
/// A directory contributes all its `*.tsv` files (recursively, sorted), a file is taken as is.
/// Paths that are neither are logged and ignored.
pub fn collect_status_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>, ShMatchError> {
    let mut files = Vec::<PathBuf>::new();
    for root in roots {
        if root.is_dir() {
            let mut in_dir = Vec::<PathBuf>::new();
            process_dir(root, &mut in_dir)?;
            in_dir.sort();
            files.append(&mut in_dir);
        } else if root.is_file() {
            files.push(root.clone());
        } else {
            log::warn!("matches path {:?} is neither a file nor a directory, ignored", root);
        }
    }
    log::info!("collected nb status files : {}", files.len());
    Ok(files)
} // end of collect_status_files

//==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn collects_tsv_recursively_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("cl_2");
        fs::create_dir(&sub).unwrap();
        File::create(sub.join("matches.tsv")).unwrap();
        File::create(dir.path().join("b.tsv")).unwrap();
        File::create(dir.path().join("a.tsv")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        let lone = tempfile::NamedTempFile::new().unwrap();

        let roots = vec![dir.path().to_path_buf(), lone.path().to_path_buf()];
        let files = collect_status_files(&roots).unwrap();
        assert_eq!(files.len(), 4);
        assert_eq!(files[0], dir.path().join("a.tsv"));
        assert_eq!(files[1], dir.path().join("b.tsv"));
        assert_eq!(files[2], sub.join("matches.tsv"));
        assert_eq!(files[3], lone.path().to_path_buf());
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let res = require_input(&dir.path().join("absent.txt"));
        assert!(matches!(res, Err(ShMatchError::MissingInput(_))));
    }

    #[test]
    fn reader_accepts_ragged_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tb\tc").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "d").unwrap();
        let mut rdr = tsv_reader(file.path()).unwrap();
        let lens: Vec<usize> = rdr.records().map(|r| r.unwrap().len()).collect();
        assert_eq!(lens, vec![3, 1]);
    }
}
