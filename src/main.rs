//! valuetransformer's main application entry point.
//! Reads the configuration and documents, runs the pipeline and writes the result.

use std::io::Write;

use valuetransformer::{
    cli::{get_args, Args},
    config::Configuration,
    error::{default_error_handler, Result},
    pipeline::Pipeline,
    processor::Processed,
    resource_list::{read_stream, write_stream, ResourceList},
};

/// Main application entry point.
#[tokio::main]
async fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    if args.verbose {
        log::warn!("ValueTransformer debugging enabled");
    }

    if let Err(err) = run(args).await {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Reads the configuration and documents (envelope or legacy stream)
/// 2. Runs the pipeline over all documents
/// 3. Reports unresolved placeholders
/// 4. Writes every document once, after everything succeeded
async fn run(args: Args) -> Result<()> {
    let pipeline = Pipeline::default();
    let stdin = std::io::stdin();

    let mut output = Vec::new();
    match args.config {
        Some(config_path) => {
            let config = Configuration::load(&config_path)?;
            let items = read_stream(stdin.lock())?;
            let documents = report(pipeline.run(config, items).await?);
            write_stream(&documents, &mut output)?;
        }
        None => {
            let mut list = ResourceList::read(stdin.lock())?;
            let config = list.config()?;
            let items = std::mem::take(&mut list.items);
            list.items = report(pipeline.run(config, items).await?);
            list.write(&mut output)?;
        }
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}

fn report(processed: Vec<Processed>) -> Vec<serde_yaml::Value> {
    processed
        .into_iter()
        .map(|processed| {
            processed.report();
            processed.document
        })
        .collect()
}
