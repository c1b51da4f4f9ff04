//! Command-line interface implementation for valuetransformer.
//! Provides argument parsing using clap.

use crate::constants::DEBUG_ENV;
use clap::builder::FalseyValueParser;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments structure for valuetransformer.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "valuetransformer: substitute values from external sources into resource documents",
    long_about = None
)]
pub struct Args {
    /// Function configuration file.
    /// When given, stdin is read as a stream of documents instead of a ResourceList
    /// and the rewritten documents are written back as a stream.
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output on stderr
    #[arg(short, long, env = DEBUG_ENV, value_parser = FalseyValueParser::new())]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
pub fn get_args() -> Args {
    Args::parse()
}
