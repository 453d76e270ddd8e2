//! nxgrid CLI
//!
//! Inspects NeXus arrays through the chunked reader and maps Q vectors onto a
//! configured detector.
#![allow(clippy::uninlined_format_args)]

use clap::{Args, Parser, Subcommand};
use log::info;
use nalgebra::Vector3;
use nxgrid_algorithms::QMapper;
use nxgrid_core::{DataSet, GridId, InstrumentConfig, PixelIndex, Spectrum, TOF_UNITS};
use nxgrid_io::{
    dataset_paths, push_grid_spectra, BlockingPlan, ChunkedReader, Hdf5Source, NodeValue,
    ReaderConfig,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    NxgridIo(#[from] nxgrid_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] nxgrid_core::Error),

    #[error("Mapping error: {0}")]
    Mapping(#[from] nxgrid_algorithms::Error),

    #[error("{0}")]
    Usage(String),
}

/// Chunked NeXus array reader and Q-to-detector mapper.
#[derive(Parser)]
#[command(name = "nxgrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Blob budget selection shared by the reading commands.
#[derive(Args, Clone, Copy, Debug)]
struct BudgetArgs {
    /// Maximum elements per slab request
    #[arg(long, conflicts_with = "unlimited")]
    blob_budget: Option<usize>,

    /// Read every array in one request
    #[arg(long)]
    unlimited: bool,
}

impl BudgetArgs {
    fn reader_config(self) -> ReaderConfig {
        let config = ReaderConfig::default();
        match (self.blob_budget, self.unlimited) {
            (_, true) => config.unlimited(),
            (Some(elements), false) => config.with_blob_elements(elements),
            (None, false) => config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the datasets of a file, or describe one dataset
    Info {
        /// Input HDF5/NeXus file
        input: PathBuf,

        /// Dataset path inside the file
        dataset: Option<String>,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Read a dataset through the chunked reader
    Read {
        /// Input HDF5/NeXus file
        input: PathBuf,

        /// Dataset path inside the file
        dataset: String,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Show the slab requests for an array shape
    Plan {
        /// Array dimensions, outermost first
        #[arg(long, value_delimiter = ',', required = true)]
        dims: Vec<usize>,

        /// Maximum elements per slab request
        #[arg(long)]
        blob_budget: usize,

        /// Print every slab request
        #[arg(long)]
        list: bool,
    },

    /// Map Q vectors (sample frame, inverse Angstrom) onto a detector grid
    MapQ {
        /// Instrument configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Grid id; defaults to the first configured grid
        #[arg(long)]
        grid: Option<GridId>,

        /// Q vector as qx,qy,qz; may be repeated
        #[arg(long = "q", required = true, allow_hyphen_values = true, value_parser = parse_vector)]
        qs: Vec<Vector3<f64>>,

        /// NeXus file holding counts and time-of-flight arrays
        #[arg(long, requires_all = ["counts", "tof"])]
        data: Option<PathBuf>,

        /// Counts dataset, shape [rows, cols, channels]
        #[arg(long, requires = "data")]
        counts: Option<String>,

        /// Time-of-flight dataset (bin edges or sample points)
        #[arg(long, requires = "data")]
        tof: Option<String>,

        #[command(flatten)]
        budget: BudgetArgs,
    },
}

fn parse_vector(text: &str) -> std::result::Result<Vector3<f64>, String> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("{part:?}: {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected qx,qy,qz, got {text:?}")),
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Info {
            input,
            dataset,
            budget,
        } => match dataset {
            None => {
                println!("File: {}", input.display());
                for path in dataset_paths(&input)? {
                    println!("  {path}");
                }
                Ok(())
            }
            Some(dataset) => describe(&input, &dataset, budget),
        },
        Commands::Read {
            input,
            dataset,
            budget,
        } => read(&input, &dataset, budget),
        Commands::Plan {
            dims,
            blob_budget,
            list,
        } => {
            show_plan(&dims, blob_budget, list);
            Ok(())
        }
        Commands::MapQ {
            config,
            grid,
            qs,
            data,
            counts,
            tof,
            budget,
        } => {
            let arrays = match (data, counts, tof) {
                (Some(file), Some(counts), Some(tof)) => Some((file, counts, tof)),
                _ => None,
            };
            map_q(&config, grid, &qs, arrays, budget)
        }
    }
}

fn open_reader(
    input: &Path,
    dataset: &str,
    budget: BudgetArgs,
) -> Result<ChunkedReader<Hdf5Source>> {
    let source = Hdf5Source::open(input, dataset)?;
    Ok(ChunkedReader::new(source, &budget.reader_config())?)
}

fn describe(input: &Path, dataset: &str, budget: BudgetArgs) -> Result<()> {
    let mut reader = open_reader(input, dataset, budget)?;
    let info = reader.info()?;
    println!("Dataset: {dataset}");
    println!("Type: {} (read as {})", info.element_type, info.element_type.widened());
    println!(
        "Shape: {:?} ({} elements, {} bytes)",
        info.dims,
        info.len(),
        info.size_bytes()
    );
    match reader.blob_budget() {
        Some(elements) => println!("Blob budget: {elements} elements"),
        None => println!("Blob budget: unlimited"),
    }
    match reader.plan()? {
        Some(plan) => print_plan_summary(&plan),
        None => println!("Plan: single whole-array read"),
    }
    Ok(())
}

fn read(input: &Path, dataset: &str, budget: BudgetArgs) -> Result<()> {
    let mut reader = open_reader(input, dataset, budget)?;
    let slabs = reader.plan()?.map_or(1, |plan| plan.slab_count());
    let start = Instant::now();
    let value = reader.read()?;
    let elapsed = start.elapsed();

    println!("Dataset: {dataset}");
    println!("Type: {} -> {}", value.stored_type(), value.data().element_type());
    println!("Shape: {:?}", value.dims());
    println!(
        "Read {} elements in {} request(s), {:.3} s",
        value.len(),
        slabs,
        elapsed.as_secs_f64()
    );
    if let Some(text) = value.as_text() {
        println!("Text: {text:?}");
    } else {
        print_stats(&value);
    }
    Ok(())
}

fn print_stats(value: &NodeValue) {
    let values = value.to_f64_vec();
    if values.is_empty() {
        return;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = values.iter().sum();
    println!("Min: {min}");
    println!("Max: {max}");
    println!("Sum: {sum}");
}

fn print_plan_summary(plan: &BlockingPlan) {
    match plan.split_dimension() {
        Some(dim) => println!(
            "Plan: split dimension {dim}, step {}, {} slab(s) of at most {} elements",
            plan.step(),
            plan.slab_count(),
            plan.buffer_len()
        ),
        None => println!("Plan: one slab of {} elements", plan.buffer_len()),
    }
}

fn show_plan(dims: &[usize], blob_budget: usize, list: bool) {
    let total: usize = dims.iter().product();
    println!("Shape: {:?} ({} elements), blob budget {}", dims, total, blob_budget);
    let Some(plan) = BlockingPlan::for_budget(dims, blob_budget) else {
        println!("Plan: single whole-array read");
        return;
    };
    print_plan_summary(&plan);
    if list {
        println!("{:>6}  {:<24} {:<24} {:>10}", "slab", "start", "size", "offset");
        println!("{:-<68}", "");
        for (i, slab) in plan.slabs().enumerate() {
            println!(
                "{:>6}  {:<24} {:<24} {:>10}",
                i,
                format!("{:?}", slab.start),
                format!("{:?}", slab.size),
                slab.offset
            );
        }
    }
}

fn map_q(
    config_path: &Path,
    grid_id: Option<GridId>,
    qs: &[Vector3<f64>],
    arrays: Option<(PathBuf, String, String)>,
    budget: BudgetArgs,
) -> Result<()> {
    let config = InstrumentConfig::from_file(config_path)?;
    let store = config.grid_store()?;
    let grid_id = grid_id
        .or_else(|| config.grids.first().map(|g| g.id))
        .ok_or_else(|| CliError::Usage("no grid configured".to_string()))?;
    let grid = store
        .get(grid_id)
        .ok_or(nxgrid_core::Error::UnknownGrid(grid_id))?;
    let orientation = config.orientation();

    let mut data_set = DataSet::new(TOF_UNITS);
    let mapper = match arrays {
        Some((file, counts, tof)) => {
            let counts = open_reader(&file, &counts, budget)?.read()?;
            let tof = open_reader(&file, &tof, budget)?.read()?;
            let first = push_grid_spectra(&mut data_set, grid, &counts, &tof)?;
            for spectrum in &mut data_set.spectra[first..] {
                spectrum.initial_path = Some(config.initial_path_m);
                spectrum.t0_shift = Some(config.t0_shift_us);
            }
            data_set.orientation = Some(orientation);
            info!("loaded {} spectra for grid {grid_id}", data_set.len());
            let mut index = PixelIndex::new();
            QMapper::from_data_set(&data_set, &store, &mut index, 1)?
        }
        None => QMapper::<Spectrum>::geometry_only(
            grid,
            &orientation,
            config.initial_path_m,
            config.t0_shift_us,
        )?,
    };

    let with_data = !data_set.is_empty();
    for (q, hit) in qs.iter().zip(mapper.map_batch(qs)) {
        let label = format!("Q = ({:.4}, {:.4}, {:.4})", q.x, q.y, q.z);
        let Some(hit) = hit else {
            println!("{label}: no solution");
            continue;
        };
        print!("{label}: row {:.3}, col {:.3}, tof {:.2} us", hit.row, hit.col, hit.tof);
        if with_data {
            match mapper.map_q_to_row_col_channel(q) {
                Some(chan) => print!(", channel {:.3}", chan.channel),
                None => print!(", channel -"),
            }
            match mapper.try_interpolated_intensity(q) {
                Some(intensity) => print!(", intensity {intensity:.4}"),
                None => print!(", intensity -"),
            }
        }
        println!();
    }
    Ok(())
}
