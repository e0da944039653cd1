mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use log::info;
use options::Cli;
use rasterops::{
    raster::{
        grid::{Envelope, Size},
        Raster, SampleMode,
    },
    Context, Output,
};
use serde::Serialize;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    env_logger::init();

    let Some(expression) = cli.cmd.expression() else {
        let json = serde_json::to_string_pretty(&rasterops::catalog_metadata())?;
        println!("{json}");
        return Ok(());
    };

    let mut ctx = Context::new()
        .catalog_dir(cli.catalog.clone())
        .processing_mode(cli.processing_mode())
        .sample_mode(if cli.mmap {
            SampleMode::MemMap
        } else {
            SampleMode::InMem
        });
    if let Some(partitions) = cli.partitions {
        ctx = ctx.partitions(partitions);
    }
    let catalog = ctx.open_catalog()?;

    info!("running {expression}");
    let mut operation = rasterops::create(expression)?;
    match operation.execute(&ctx, &catalog)? {
        Output::Number(v) => println!("{v}"),
        Output::Raster(raster) => {
            let raster = catalog.store(raster)?;
            print_summary(&raster)?;
        }
    }
    Ok(())
}

fn print_summary(raster: &Raster) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct Summary<'a> {
        name: &'a str,
        georef: &'a str,
        size: Size,
        envelope: Envelope,
        min: Option<f64>,
        max: Option<f64>,
    }

    let (min, max) = raster.min_max().unzip();
    let summary = Summary {
        name: raster.name(),
        georef: raster.georeference().name(),
        size: raster.size(),
        envelope: raster.envelope(),
        min,
        max,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
