use clap::Parser;
use mmsar::imaging::range::RangeSpectrum;
use mmsar::imaging::sweep::{par_sweep, sweep};
use mmsar::loading::stacker::load_scan;
use mmsar::utils::config::parse_depth_mm;
use mmsar::ReconstructionConfig;
use ndarray::Array2;
use std::path::PathBuf;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

fn depth_arg(value: &str) -> Result<f64, String> {
    parse_depth_mm(value).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Reconstructs a depth stack from gantry SAR captures", long_about = None)]
struct Args {
    /// Folder containing one capture file per scan line
    #[arg(long, default_value = "dumps")]
    folder: PathBuf,

    /// YAML configuration file, defaults are used for anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Single depth to focus at (e.g. 300, 300mm, 0.3m)
    #[arg(long, value_parser = depth_arg)]
    zindex: Option<f64>,

    /// First depth of the sweep
    #[arg(long, visible_alias = "z_start", value_parser = depth_arg)]
    zstart: Option<f64>,

    /// Last depth of the sweep
    #[arg(long, visible_alias = "z_end", value_parser = depth_arg)]
    zend: Option<f64>,

    /// Depth step of the sweep
    #[arg(long, value_parser = depth_arg)]
    zstep: Option<f64>,

    /// Receive channel 1-4, or 5 for the mean of all channels
    #[arg(long)]
    channel: Option<u8>,

    /// Focus depths on all cores
    #[arg(long)]
    parallel: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Location and value of the largest element.
fn peak(plane: &Array2<f64>) -> Option<((usize, usize), f64)> {
    plane
        .indexed_iter()
        .map(|(idx, v)| (idx, *v))
        .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })
}

fn bin_main() -> BinResult<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let mut config = match &args.config {
        Some(path) => ReconstructionConfig::from_yaml(path)?,
        None => ReconstructionConfig::default(),
    };
    if let Some(z) = args.zstart {
        config.sweep.start_mm = z;
    }
    if let Some(z) = args.zend {
        config.sweep.end_mm = z;
    }
    if let Some(z) = args.zstep {
        config.sweep.step_mm = z;
    }
    if args.zindex.is_some() {
        config.sweep.single_mm = args.zindex;
    }
    if let Some(channel) = args.channel {
        config.scan.channel_option = channel;
    }
    config.validate()?;

    let scan = load_scan(&args.folder, &config)?;
    let spectrum = RangeSpectrum::from_cube(&scan.cube, &config)?;
    let result = if args.parallel {
        par_sweep(&spectrum, &config)?
    } else {
        sweep(&spectrum, &config)?
    };
    let stack = &result.stack;

    println!("Scan lines zero-filled: {:?}", scan.missing_rows);
    for skipped in &result.skipped {
        println!(
            "Skipped depth {}mm (range bin {})",
            skipped.depth_mm, skipped.bin
        );
    }
    if stack.is_empty() {
        Err("no depth of the sweep falls inside the range FFT")?
    }

    let depths = stack.depths_mm();
    let (x, y) = (stack.x_axis(), stack.y_axis());
    println!(
        "Focused {} depths from {}mm to {}mm on a {} x {} grid",
        depths.len(),
        depths[0],
        depths[depths.len() - 1],
        x.len(),
        y.len()
    );
    if let Some(((z, i), v)) = peak(&stack.max_over_slow_axis()) {
        println!("X-Z projection peak {v:.3e} at x={:.1}mm z={}mm", x[i], depths[z]);
    }
    if let Some(((z, i), v)) = peak(&stack.max_over_fast_axis()) {
        println!("Y-Z projection peak {v:.3e} at y={:.1}mm z={}mm", y[i], depths[z]);
    }
    if let Some(((i, j), v)) = peak(&stack.max_over_depth()) {
        println!("X-Y projection peak {v:.3e} at x={:.1}mm y={:.1}mm", x[j], y[i]);
    }
    Ok(())
}
