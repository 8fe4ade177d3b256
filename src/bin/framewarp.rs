use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::Parser;
use framewarp::{FrameStream, matrix, pipeline};

/// Apply a stream of 2-D affine matrices to a video frame stream.
///
/// Reads the frame stream from stdin and writes the transformed stream
/// to stdout. Each 3x3 xyza matrix frame supplies the coefficients for
/// one input frame.
#[derive(Parser, Debug)]
#[command(name = "framewarp", version)]
struct Cli {
    /// Path to the matrix stream (3x3 xyza frames).
    matrices: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut input =
        FrameStream::open(std::io::stdin().lock()).context("read stream header from <stdin>")?;

    let file = File::open(&cli.matrices)
        .with_context(|| format!("open matrix stream '{}'", cli.matrices.display()))?;
    let mut matrices = FrameStream::open(BufReader::new(file))
        .with_context(|| format!("read matrix stream header '{}'", cli.matrices.display()))?;
    matrix::check_matrix_stream(matrices.header())?;

    // The output stream inherits the input geometry and format; its
    // header goes out before any frame data.
    let mut sink = BufWriter::new(std::io::stdout().lock());
    input.header().write_to(&mut sink)?;

    pipeline::run(&mut input, &mut matrices, &mut sink)?;

    use std::io::Write as _;
    sink.flush().context("flush <stdout>")?;
    Ok(())
}
