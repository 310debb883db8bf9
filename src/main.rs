use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use frame_adapter::data::projection::index_display_labels;
use frame_adapter::{
    export, infer_frame_types, load_file_with, project, DataFrameModel, ExportFormat, LoadOptions,
};

#[derive(Parser)]
#[command(name = "frame-adapter", version, about = "Inspect, project and export data frames")]
struct Cli {
    /// Leading CSV columns to treat as index levels
    #[arg(long, global = true, default_value_t = 0)]
    index_columns: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the inferred type of every index level and column
    Infer { input: PathBuf },
    /// Print the table projection as JSON
    Project {
        input: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Export the frame as CSV or XLSX
    Export {
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        /// Base file name (sanitized); defaults to the input file stem
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Xlsx => ExportFormat::Xlsx,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let options = LoadOptions {
        csv_index_columns: cli.index_columns,
    };

    match cli.command {
        Command::Infer { input } => {
            let model = load(&input, &options)?;
            print_types(&model);
        }
        Command::Project { input, pretty } => {
            let model = load(&input, &options)?;
            let projection = project(&model);
            let json = if pretty {
                serde_json::to_string_pretty(&projection)?
            } else {
                serde_json::to_string(&projection)?
            };
            println!("{json}");
        }
        Command::Export {
            input,
            format,
            name,
            out_dir,
        } => {
            let model = load(&input, &options)?;
            let base_name = name.unwrap_or_else(|| {
                input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let blob = export(&model, format.into(), &base_name)
                .with_context(|| format!("exporting {}", input.display()))?;
            let target = out_dir.join(&blob.file_name);
            std::fs::write(&target, &blob.bytes)
                .with_context(|| format!("writing {}", target.display()))?;
            log::info!(
                "wrote {} ({}, {} bytes)",
                target.display(),
                blob.mime_type,
                blob.bytes.len()
            );
            println!("{}", target.display());
        }
    }
    Ok(())
}

fn load(path: &Path, options: &LoadOptions) -> Result<DataFrameModel> {
    let model = load_file_with(path, options)
        .with_context(|| format!("loading {}", path.display()))?;
    log::info!(
        "loaded {} ({} rows, {} columns)",
        path.display(),
        model.row_count(),
        model.columns().len()
    );
    Ok(model)
}

fn print_types(model: &DataFrameModel) {
    let types = infer_frame_types(model);
    for (label, ty) in index_display_labels(model).iter().zip(&types.index_levels) {
        println!("{label}\t{ty}\t(index)");
    }
    for (label, ty) in model.columns().iter().zip(&types.columns) {
        println!("{label}\t{ty}");
    }
}
