//! Command-line interface for the categorizer.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{default_destination, has_project_extension, validate_project_path};
use crate::error::Result;
use crate::inspect::summary_yaml;
use crate::marker::{mark_for_conversion, marked_layer_names};
use crate::project::ProjectDocument;
use crate::splitter::split_with_report;

/// QGS Categorizer - Split categorized QGIS layers into one layer per class.
#[derive(Parser)]
#[command(name = "qgs-categorizer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tag exactly the given layers for splitting; all others are untagged.
    Mark {
        /// Project file (.qgs), updated in place
        project: PathBuf,

        /// Layer name to tag (repeatable; none clears every tag)
        #[arg(short, long = "layer", value_name = "NAME")]
        layers: Vec<String>,
    },

    /// Split tagged layers into groups of one layer per class.
    Split {
        /// Project file (.qgs), left unchanged
        project: PathBuf,

        /// Output file (default: <name>_categorized.qgs next to the project)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a YAML summary of every layer.
    Inspect {
        /// Project file (.qgs)
        project: PathBuf,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Mark { project, layers } => mark_command(&project, layers),
        Commands::Split { project, output } => split_command(&project, output.as_deref()),
        Commands::Inspect { project } => inspect_command(&project),
    }
}

fn check_project_path(path: &Path) -> Result<()> {
    validate_project_path(path)?;
    if !has_project_extension(path) {
        tracing::warn!(path = %path.display(), "Not a .qgs file; zipped projects must be unpacked first");
    }
    Ok(())
}

/// Execute the mark command.
fn mark_command(path: &Path, layers: Vec<String>) -> Result<()> {
    check_project_path(path)?;

    let mut project = ProjectDocument::load(path)?;
    let eligible: HashSet<String> = layers.into_iter().collect();
    mark_for_conversion(&eligible, &mut project)?;

    let marked = marked_layer_names(&project);
    if marked.is_empty() {
        println!("{} {}", style("No layers tagged in").yellow(), path.display());
    } else {
        println!("{} {}", style("Tagged in").bold(), path.display());
        for name in &marked {
            println!("  {}", style(name).cyan());
        }
    }

    Ok(())
}

/// Execute the split command.
fn split_command(path: &Path, output: Option<&Path>) -> Result<()> {
    check_project_path(path)?;
    let destination = match output {
        Some(output) => {
            validate_project_path(output)?;
            output.to_path_buf()
        }
        None => default_destination(path)?,
    };

    println!(
        "{} {}",
        style("Splitting").bold(),
        style(path.display()).cyan()
    );

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Splitting tagged layers...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = match split_with_report(path, &destination) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();

    if !report.written {
        println!("{}", style("No tagged layers; project left unchanged.").yellow());
        return Ok(());
    }

    for layer in &report.converted {
        println!(
            "  {} -> {} classes ({})",
            style(&layer.name).green(),
            layer.classes.len(),
            layer.renderer.as_str()
        );
    }
    for layer in &report.skipped {
        println!(
            "  {} skipped: {}",
            style(&layer.name).yellow(),
            layer.reason
        );
    }
    if !report.empty_layers.is_empty() {
        println!(
            "  Classes without rules: {}",
            style(report.empty_layers.join(", ")).yellow().bold()
        );
    }

    println!();
    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        report.output.display()
    );

    Ok(())
}

/// Execute the inspect command.
fn inspect_command(path: &Path) -> Result<()> {
    check_project_path(path)?;
    let project = ProjectDocument::load(path)?;
    print!("{}", summary_yaml(&project)?);
    Ok(())
}
