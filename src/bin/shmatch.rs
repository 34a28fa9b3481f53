//! shmatch postprocess | aggregate
//!
//! **shmatch postprocess** --clusters-dir dir --cluster-membership file --best-hits file --centroid2sh file --output file \[--aligner mmseqs|minimap\]
//!
//! - --clusters-dir : directory with the single-linkage outputs of one compound cluster, named mx_cluster_\<ID\>_out_\<TH\>
//! - --cluster-membership : ClusterID, MemberType (Query|Ref), MemberID for all compound clusters
//! - --best-hits : aligner best hits, 8 columns, header optional
//! - --centroid2sh : centroid2sh_mappings.txt of the SH database
//! - --output : status file written for the cluster
//!
//! The command fails, writing nothing, if the cluster id cannot be found from the clustering file names.
//!
//! **shmatch aggregate** --matches-dirs path ... --best-hits file --shs-file file --sh2compound file --compounds-file file --out file \[--threads n\]
//!
//! - --matches-dirs : status files, or directories searched recursively for *.tsv status files
//! - --shs-file : SH code, taxonomy
//! - --sh2compound : SH code, UCL code
//! - --compounds-file : .., UCL code, taxonomy
//! - --out : the 24 columns report
//! - --threads : nb threads reading status files, default lets rayon decide
//!
//! Logging is set with RUST_LOG.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};

// for logging (debug mostly, switched at compile time in cargo.toml)
use env_logger::Builder;

use shmatch::aggregator::aggregate;
use shmatch::besthits::AlignerMode;
use shmatch::resolver::postprocess;
use shmatch::utils::parameters::*;

// install a logger facility
fn init_log() -> u64 {
    Builder::from_default_env().init();
    log::info!("logger initialized");
    1
}

fn get_path(matches: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    matches
        .get_one::<String>(name)
        .map(PathBuf::from)
        .with_context(|| format!("argument --{} is mandatory", name))
}

fn get_aligner(matches: &ArgMatches) -> anyhow::Result<AlignerMode> {
    let name = matches.get_one::<String>("aligner").map(|s| s.as_str()).unwrap_or("mmseqs");
    Ok(AlignerMode::from_name(name)?)
}

#[doc(hidden)]
fn parse_postprocess(matches: &ArgMatches) -> anyhow::Result<PostprocessParams> {
    log::debug!("in parse_postprocess");
    let params = PostprocessParams {
        clusters_dir: get_path(matches, "clusters-dir")?,
        cluster_membership: get_path(matches, "cluster-membership")?,
        best_hits: get_path(matches, "best-hits")?,
        aligner: get_aligner(matches)?,
        centroid2sh: get_path(matches, "centroid2sh")?,
        output: get_path(matches, "output")?,
    };
    Ok(params)
} // end of parse_postprocess

#[doc(hidden)]
fn parse_aggregate(matches: &ArgMatches) -> anyhow::Result<AggregateParams> {
    log::debug!("in parse_aggregate");
    let matches_paths: Vec<PathBuf> = matches
        .get_many::<String>("matches-dirs")
        .context("argument --matches-dirs is mandatory")?
        .map(PathBuf::from)
        .collect();
    let params = AggregateParams {
        matches: matches_paths,
        best_hits: get_path(matches, "best-hits")?,
        aligner: get_aligner(matches)?,
        shs_file: get_path(matches, "shs-file")?,
        sh2compound: get_path(matches, "sh2compound")?,
        compounds_file: get_path(matches, "compounds-file")?,
        out: get_path(matches, "out")?,
        nb_threads: *matches.get_one::<usize>("threads").unwrap_or(&0),
    };
    Ok(params)
} // end of parse_aggregate

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .action(ArgAction::Set)
        .value_parser(clap::value_parser!(String))
        .help(help)
}

fn aligner_arg() -> Arg {
    Arg::new("aligner")
        .long("aligner")
        .required(false)
        .default_value("mmseqs")
        .action(ArgAction::Set)
        .value_parser(["mmseqs", "minimap"])
        .help("format of best hits file")
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("postprocess", sub)) => {
            let params = parse_postprocess(sub)?;
            log::info!("postprocess parameters : {}", params_to_json(&params));
            let resolution = postprocess(&params)
                .with_context(|| format!("status resolution failed for {:?}", params.clusters_dir))?;
            println!(
                "cluster {} : nb status records {} dumped in {:?}",
                resolution.cluster_id,
                resolution.records.len(),
                params.output
            );
        }
        Some(("aggregate", sub)) => {
            let params = parse_aggregate(sub)?;
            log::info!("aggregate parameters : {}", params_to_json(&params));
            let nb_rows = aggregate(&params).context("aggregation failed")?;
            println!("nb queries {} dumped in {:?}", nb_rows, params.out);
        }
        _ => anyhow::bail!("a subcommand postprocess or aggregate is required"),
    }
    Ok(())
} // end of run

//============================================================================================

fn main() {
    let _ = init_log();
    //
    let postprocess_cmd = Command::new("postprocess")
        .about("Assign per threshold status to the queries of one compound cluster")
        .arg(path_arg("clusters-dir", "directory with mx_cluster_<ID>_out_<TH> files"))
        .arg(path_arg("cluster-membership", "TSV (no header): ClusterID, MemberType(Query|Ref), MemberID"))
        .arg(path_arg("best-hits", "aligner best hits (query,target,evalue,bits,alnlen,pident,qcov,tcov)"))
        .arg(path_arg("centroid2sh", "centroid2sh_mappings.txt mapping ref -> SH per threshold code 1..6"))
        .arg(path_arg("output", "output status file"))
        .arg(aligner_arg());

    let aggregate_cmd = Command::new("aggregate")
        .about("Aggregate per cluster status files into one report")
        .arg(
            Arg::new("matches-dirs")
                .long("matches-dirs")
                .required(true)
                .num_args(1..)
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(String))
                .help("status files or directories searched for *.tsv"),
        )
        .arg(path_arg("best-hits", "aligner best hits"))
        .arg(path_arg("shs-file", "shs_out.txt (SH_code, taxonomy)"))
        .arg(path_arg("sh2compound", "sh2compound_mapping.txt (SH_code, UCL_code)"))
        .arg(path_arg("compounds-file", "compounds_out.txt (.., UCL_code, taxonomy)"))
        .arg(path_arg("out", "output report"))
        .arg(aligner_arg())
        .arg(
            Arg::new("threads")
                .long("threads")
                .required(false)
                .default_value("0")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(usize))
                .help("nb threads reading status files, 0 lets rayon decide"),
        );
    //
    // the global command
    //
    let matches = Command::new("shmatch")
        .version("0.1.0")
        .about("Species Hypothesis status of queries from single-linkage clustering at six thresholds")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(postprocess_cmd)
        .subcommand(aggregate_cmd)
        .get_matches();
    //
    if let Err(e) = run(&matches) {
        log::error!("exiting with error {:#}", e);
        eprintln!("error : {:#}", e);
        std::process::exit(1);
    }
} // end of main
