use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use labeltree::errors::Result;
use labeltree::file_format::clusters::read_cluster_container_file;
use labeltree::file_format::config::{self, ToolConfig};
use labeltree::file_format::hierarchy::Hierarchy;
use labeltree::file_format::label_table::LabelTable;
use labeltree::label_selection::LabelSelectionModel;
use labeltree::logging::init_logging;

/// Inspect and convert label hierarchies.
#[derive(Debug, Parser)]
#[clap(name = "label-tree-tool", version)]
struct ToolOpts {
    /// TOML file overriding the default settings.
    #[clap(long, value_parser, env = "LABEL_TREE_CONFIG")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Convert(Convert),
    Outline(Outline),
    Clusters(Clusters),
    Model(Model),
}

/// Rewrite a hierarchy file; ".json" paths are JSON, anything else XML.
#[derive(Debug, Args)]
struct Convert {
    #[clap(value_parser)]
    input: PathBuf,

    #[clap(value_parser)]
    output: PathBuf,
}

/// Print a hierarchy as an indented outline.
#[derive(Debug, Args)]
struct Outline {
    #[clap(value_parser)]
    input: PathBuf,
}

/// Print the clusters in a cluster JSON file.
#[derive(Debug, Args)]
struct Clusters {
    #[clap(value_parser)]
    input: PathBuf,
}

/// Build the label selection tree for a label table and print it.
#[derive(Debug, Args)]
struct Model {
    /// Label table JSON file.
    #[clap(value_parser)]
    label_table: PathBuf,

    /// Hierarchy XML or JSON file.
    #[clap(value_parser)]
    hierarchy: PathBuf,

    /// Cluster JSON file with the brainordinates using each label.
    #[clap(long, short, value_parser)]
    clusters: Option<PathBuf>,
}

fn read_hierarchy(path: &Path) -> Result<Hierarchy> {
    let mut hierarchy = Hierarchy::new();
    hierarchy.read_file(path)?;
    Ok(hierarchy)
}

fn run(opts: ToolOpts) -> Result<()> {
    let config = match &opts.config {
        Some(path) => config::load(path)?,
        None => ToolConfig::default(),
    };

    match opts.cmd {
        Command::Convert(args) => {
            let hierarchy = read_hierarchy(&args.input)?;
            hierarchy.write_file(&args.output)?;
        }
        Command::Outline(args) => {
            let hierarchy = read_hierarchy(&args.input)?;
            println!("{}", hierarchy.build_tree_model().to_formatted_string());
        }
        Command::Clusters(args) => {
            let mut clusters = read_cluster_container_file(&args.input)?;
            if config.merge_clusters {
                clusters = clusters.merge_disjoint_right_left_clusters();
            }
            println!("{}", clusters.clusters_formatted_string());
        }
        Command::Model(args) => {
            let mut label_table = LabelTable::from_json_file(&args.label_table)?;
            label_table.set_hierarchy(read_hierarchy(&args.hierarchy)?);
            let clusters = match &args.clusters {
                Some(path) => Some(read_cluster_container_file(path)?),
                None => None,
            };

            let model = LabelSelectionModel::new(
                &args.label_table.display().to_string(),
                &label_table,
                clusters.as_ref(),
                config.display_group,
                config.tab_index,
                config.log_mismatched_labels,
            );
            if !model.is_valid() {
                println!("{} has an empty hierarchy", args.hierarchy.display());
                return Ok(());
            }
            println!("{}", model.to_formatted_string(""));

            let diagnostics = model.diagnostics();
            if !diagnostics.is_empty() {
                println!();
                println!("{}", diagnostics.to_formatted_string());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    match run(ToolOpts::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
