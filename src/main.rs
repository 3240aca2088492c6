// src/main.rs
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use scopecap::{
    align_baseline, expand_to_baseline, label_regions, measure_regions, r_squared,
    render_channel_png, render_screen_png, threshold_regions, write_regions_csv,
    write_signal_csv, Capture, ChannelConfig, PlotStyle, SavitzkyGolay, SignalTable,
};
#[derive(Parser)]
#[command(version, about = "Inspect, export and plot oscilloscope captures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}
#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Decode the files as one capture and print a per-channel summary.
    Inspect {
        /// Capture files, in time order. A single `.json` export is also accepted.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Decode the files and write the merged capture as JSON.
    Export {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Plot one channel's calibrated waveform with its dips marked.
    Plot {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, requires = "end")]
        begin: Option<usize>,
        #[arg(long, requires = "begin")]
        end: Option<usize>,
    },
    /// Render one file-sized frame the way the instrument screen shows it.
    Screen {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value_t = 0)]
        frame: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Find regions above a threshold in one channel and measure them.
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        channel: String,
        #[command(flatten)]
        args: AnalyzeArgs,
    },
}
#[derive(Debug, clap::Args)]
struct AnalyzeArgs {
    /// Samples strictly above this value (after inversion and alignment) form a region.
    #[arg(long, allow_hyphen_values = true)]
    threshold: f64,
    #[arg(long, default_value_t = 10)]
    min_width: usize,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    baseline: f64,
    /// Negate the trace first, turning dips into peaks.
    #[arg(long)]
    invert: bool,
    /// Subtract the baseline so it sits at zero.
    #[arg(long)]
    align: bool,
    /// Grow each region outwards until the trace falls to the baseline.
    #[arg(long)]
    expand: bool,
    /// Savitzky-Golay smoothing before detection.
    #[arg(long)]
    smooth: bool,
    #[arg(long, default_value_t = 11)]
    window: usize,
    #[arg(long, default_value_t = 2)]
    order: usize,
    /// Write the processed trace and its labels as CSV.
    #[arg(long)]
    signal_out: Option<PathBuf>,
    /// Write the region table as CSV.
    #[arg(long)]
    table_out: Option<PathBuf>,
}
fn load(files: &[PathBuf]) -> Result<Capture> {
    let is_export = files.len() == 1
        && files[0]
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let capture = if is_export {
        Capture::load_json(&files[0])
    } else {
        Capture::from_paths(files)
    };
    capture.with_context(|| format!("failed to load capture from {files:?}"))
}
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}
/// Formatted min and max of a trace, `-` for both when it has no samples.
fn voltage_range(data: &[f64]) -> (String, String) {
    if data.is_empty() {
        return ("-".to_owned(), "-".to_owned());
    }
    let (lo, hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    (format!("{lo:.3}V"), format!("{hi:.3}V"))
}
fn inspect(capture: &Capture) {
    let config = &capture.config;
    println!("{} ({})", config.idn, config.model);
    println!(
        "timebase {} / div, {} samples per file, {} frame(s)",
        config.timebase.scale,
        config.sample.data_len,
        capture.frame_count()
    );
    for channel in capture.channels() {
        let (min, max) = voltage_range(&channel.calibrated_data);
        println!(
            "{:>4} display={:<3} probe={:<5} scale={:<6} read={} samples={} min={} max={} peaks={}",
            channel.name,
            channel.display,
            channel.probe,
            channel.scale,
            channel.successful_read,
            channel.calibrated_data.len(),
            min,
            max,
            channel.count_peaks(None)
        );
    }
}
fn analyze(channel: &ChannelConfig, args: &AnalyzeArgs) -> Result<()> {
    let mut samples = channel.calibrated_data.clone();
    if args.invert {
        samples = scopecap::invert(&samples);
    }
    let mut baseline = args.baseline;
    if args.align {
        samples = align_baseline(&samples, baseline);
        baseline = 0.0;
    }
    if args.smooth {
        let smoothed = SavitzkyGolay::new(args.window, args.order).smooth(&samples);
        if let Some(r2) = r_squared(&samples, &smoothed) {
            info!("smoothing R^2 = {r2:.4}");
        }
        samples = smoothed;
    }
    let mut labels = vec![0u8; samples.len()];
    for region in threshold_regions(&samples, args.threshold, args.min_width) {
        labels[region.start..=region.end].fill(region.label);
    }
    if args.expand {
        let grown = expand_to_baseline(&samples, &mut labels, baseline);
        info!("expanded regions by {grown} sample(s)");
    }
    let metrics = measure_regions(&samples, &label_regions(&labels), baseline);
    println!(
        "{:>3} {:>7} {:>7} {:>6} {:>9} {:>9} {:>10}",
        "id", "start", "end", "width", "fwhm", "max", "area"
    );
    for m in &metrics {
        println!(
            "{:>3} {:>7} {:>7} {:>6} {:>9.3} {:>9.3} {:>10.3}",
            m.id, m.start, m.end, m.width, m.fwhm, m.max_value, m.area
        );
    }
    if let Some(path) = &args.signal_out {
        let table = SignalTable {
            column: if args.smooth { "smoothed_signal" } else { "signal" },
            ..SignalTable::new(&samples, &labels)
        };
        let mut bytes = Vec::new();
        write_signal_csv(&mut bytes, &table)?;
        write_output(path, &bytes)?;
    }
    if let Some(path) = &args.table_out {
        let mut bytes = Vec::new();
        write_regions_csv(&mut bytes, &metrics)?;
        write_output(path, &bytes)?;
    }
    Ok(())
}
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { files } => inspect(&load(&files)?),
        Command::Export { files, out } => {
            let capture = load(&files)?;
            capture
                .save_json(&out)
                .with_context(|| format!("failed to export to {}", out.display()))?;
            info!("exported {} channel(s) to {}", capture.channels().len(), out.display());
        }
        Command::Plot {
            files,
            channel,
            out,
            title,
            begin,
            end,
        } => {
            let capture = load(&files)?;
            let Some(selected) = capture.channel(&channel) else {
                bail!("no channel named {channel}");
            };
            let range = begin.zip(end).map(|(b, e)| b..e);
            let title = title.unwrap_or_else(|| channel.clone());
            let png = render_channel_png(selected, &title, range, &PlotStyle::default())?;
            write_output(&out, &png)?;
        }
        Command::Screen { files, frame, out } => {
            let capture = load(&files)?;
            let png = render_screen_png(&capture, frame, &PlotStyle::default())?;
            write_output(&out, &png)?;
        }
        Command::Analyze {
            files,
            channel,
            args,
        } => {
            let capture = load(&files)?;
            let Some(selected) = capture.channel(&channel) else {
                bail!("no channel named {channel}");
            };
            analyze(selected, &args)?;
        }
    }
    Ok(())
}
