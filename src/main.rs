use clap::Parser;
use recplot::plot::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use recplot::prelude::*;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const INFO: &str = "\
recplot: plot donor, acceptor and recombinant genotype tracks

Reads a whitespace-delimited variant table whose header has POS as its second
column and whose last three columns are per-sample genotype codes, prints the
positions collected for each sample, and writes a plot with the candidate
breakpoints marked. The image format follows the output extension
(svg, png, jpg, jpeg, bmp; png if there is none).

Example:

 $ recplot -v recomb.vcf -l 29903 -s1 11000 -s2 11300 -e1 21500 -e2 21800 \\
     -r node_1234 -o recomb.svg
";

/// Two-character flags that take a single dash on the command line.
const SINGLE_DASH_LONG: [&str; 4] = ["-s1", "-s2", "-e1", "-e2"];

#[derive(Parser, Debug)]
#[command(name = "recplot", version, about = INFO, allow_negative_numbers = true)]
struct Cli {
    /// variant table with donor, acceptor and recombinant columns (may be gzipped)
    #[arg(short = 'v', long = "vcf")]
    vcf: PathBuf,
    /// genome length
    #[arg(short = 'l', long = "length")]
    length: Position,
    /// start of the recombinant interval, low bound
    #[arg(long = "s1", value_name = "S1")]
    s1: Position,
    /// start of the recombinant interval, high bound
    #[arg(long = "s2", value_name = "S2")]
    s2: Position,
    /// end of the recombinant interval, low bound
    #[arg(long = "e1", value_name = "E1")]
    e1: Position,
    /// end of the recombinant interval, high bound
    #[arg(long = "e2", value_name = "E2")]
    e2: Position,
    /// output image path
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
    /// name of the recombinant sample column
    #[arg(short = 'r', long = "recomb")]
    recomb: Option<String>,
    /// image width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,
    /// image height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,
    /// increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

/// Rewrite `-s1 100` and `-s1=100` style flags to their `--s1` long form.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let is_single_dash_long = arg.to_str().map_or(false, |s| {
                let flag = s.split_once('=').map_or(s, |(flag, _)| flag);
                SINGLE_DASH_LONG.contains(&flag)
            });
            if is_single_dash_long {
                let mut long = OsString::from("-");
                long.push(&arg);
                long
            } else {
                arg
            }
        })
        .collect()
}

fn init_logging(debug: u8) {
    let filter = match debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), RecPlotError> {
    let tracks = RecombTracks::from_path(&cli.vcf, cli.recomb.as_deref())?;

    // the lists go to stdout before the image is written
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    tracks.write_lists(&mut writer)?;
    writer.flush()?;

    let breakpoints = Breakpoints::new(cli.s1, cli.s2, cli.e1, cli.e2);
    let plot = RecombPlot::new(cli.length, breakpoints).with_size(cli.width, cli.height);
    plot.render(&tracks, &cli.output)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_logging(cli.debug);
    match run(cli) {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
