use clap::{Parser, Subcommand};
use rasterops::{raster::ProcessingMode, OperationExpression};
use std::path::PathBuf;

/// Run raster operations against a catalog directory.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Directory holding definitions (`<name>.json`) and samples
    /// (`<name>.bin`). Results are written here too.
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Worker threads (defaults to one per core).
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Number of partitions each output is split into (defaults to 4
    /// per thread).
    #[arg(short, long)]
    pub partitions: Option<usize>,

    /// Process partitions one after another on a single thread.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,

    /// Memory map raster samples instead of reading them.
    #[arg(long, default_value_t = false)]
    pub mmap: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    pub fn processing_mode(&self) -> ProcessingMode {
        match (self.sequential, self.threads) {
            (true, _) => ProcessingMode::Sequential,
            (false, Some(threads)) => ProcessingMode::ParallelWith(threads),
            (false, None) => ProcessingMode::Parallel,
        }
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Resample a raster onto another georeference.
    Resample {
        /// Source raster.
        input: String,

        /// Target georeference.
        georef: String,

        /// nearestneighbour, bilinear or bicubic.
        #[arg(short, long, default_value = "nearestneighbour")]
        method: String,

        /// Name of the result.
        #[arg(short, long)]
        output: String,
    },

    /// Copy the defined cells of a raster into the output.
    Assignment {
        /// Source raster.
        input: String,

        /// Name of the result. An existing raster of the same size
        /// keeps its values where the source is undefined.
        #[arg(short, long)]
        output: String,
    },

    /// Apply a math function to every cell of a raster, or to a
    /// number.
    Unarymath {
        /// sin, cos, tan, sqrt, asin, acos, atan, log10, ln, abs, ceil,
        /// floor, cosh, exp, neg, rnd, sgn, sinh or tanh.
        op: String,

        /// Raster name or number.
        operand: String,

        /// Name of the result, when the operand is a raster.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Cut a pixel box or a single band out of a raster.
    Selection {
        /// Source raster.
        input: String,

        /// `boxes(x0 y0, x1 y1)` with both corner pixels included, or
        /// `zvalue(n)` for band `n`.
        subset: String,

        /// Name of the result.
        #[arg(short, long)]
        output: String,
    },

    /// Print the metadata of every operation as JSON.
    Metadata,
}

impl Command {
    /// The operation call this command stands for, if any.
    pub fn expression(&self) -> Option<OperationExpression> {
        match self {
            Self::Resample {
                input,
                georef,
                method,
                output,
            } => Some(
                OperationExpression::new("resample", [input, georef, method]).with_output(output),
            ),
            Self::Assignment { input, output } => {
                Some(OperationExpression::new("assignment", [input]).with_output(output))
            }
            Self::Unarymath {
                op,
                operand,
                output,
            } => {
                let expr = OperationExpression::new("unarymath", [op, operand]);
                Some(match output {
                    Some(output) => expr.with_output(output),
                    None => expr,
                })
            }
            Self::Selection {
                input,
                subset,
                output,
            } => Some(OperationExpression::new("selection", [input, subset]).with_output(output)),
            Self::Metadata => None,
        }
    }
}
