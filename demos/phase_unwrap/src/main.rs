use argh::FromArgs;
use std::{path::PathBuf, process::ExitCode, sync::mpsc};

use fringe::{
    image::Image,
    phase::gray_code::FringeSampling,
    pipeline::{self, ScanOutput},
    PipelineError, ScanConfig,
};

const VISUALIZATION_EXIT_CODE: u8 = 6;

#[derive(FromArgs)]
/// Generate phase-shifted fringe patterns and recover the absolute phase of a row
struct Args {
    /// path to a JSON scan configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// directory for the patterns and gray-code images
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,

    /// pattern width in pixels
    #[argh(option)]
    width: Option<usize>,

    /// pattern height in pixels
    #[argh(option)]
    height: Option<usize>,

    /// number of phase-shifted patterns
    #[argh(option, short = 'n')]
    num_patterns: Option<usize>,

    /// sinusoid period in pixels
    #[argh(option, short = 'p')]
    period: Option<f64>,

    /// phase shift between patterns in degrees
    #[argh(option)]
    phase_shift: Option<f64>,

    /// row of the absolute phase to inspect
    #[argh(option, short = 'r')]
    inspect_row: Option<usize>,

    /// write synthetic gray-code images before decoding
    #[argh(switch, short = 'g')]
    write_gray_codes: bool,

    /// decode the fringe order at every pixel
    #[argh(switch)]
    dense: bool,

    /// do not log the results to rerun
    #[argh(switch)]
    no_viz: bool,

    /// exit without waiting for a key press
    #[argh(switch)]
    no_wait: bool,
}

fn scan_config(args: &Args) -> Result<ScanConfig, PipelineError> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };

    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(width) = args.width {
        config.pattern.width = width;
    }
    if let Some(height) = args.height {
        config.pattern.height = height;
    }
    if let Some(num_patterns) = args.num_patterns {
        config.pattern.num_patterns = num_patterns;
    }
    if let Some(period) = args.period {
        config.pattern.period = period;
    }
    if let Some(phase_shift) = args.phase_shift {
        config.pattern.phase_shift_deg = phase_shift;
    }
    if args.inspect_row.is_some() {
        config.inspect_row = args.inspect_row;
    }
    if args.dense {
        config.sampling = FringeSampling::Dense;
    }

    Ok(config)
}

fn scan(args: &Args) -> Result<ScanOutput, PipelineError> {
    let config = scan_config(args)?;
    config.validate()?;

    if args.write_gray_codes {
        pipeline::write_gray_codes(&config)?;
    }

    pipeline::run(&config)
}

fn visualize(output: &ScanOutput) -> Result<(), Box<dyn std::error::Error>> {
    // create a Rerun recording stream
    let rec = rerun::RecordingStreamBuilder::new("Fringe App").spawn()?;

    for (k, pattern) in output.patterns.iter().enumerate() {
        rec.log(
            format!("patterns/{k}"),
            &rerun::Image::from_elements(
                pattern.as_slice(),
                pattern.size().into(),
                rerun::ColorModel::L,
            ),
        )?;
    }

    let phase: Image<f32, 1> = output.unwrapped_phase.cast()?;
    rec.log(
        "unwrapped_phase",
        &rerun::Image::from_elements(phase.as_slice(), phase.size().into(), rerun::ColorModel::L),
    )?;

    rec.log(
        "absolute_phase_line",
        &rerun::Image::from_elements(
            output.line_image.as_slice(),
            output.line_image.size().into(),
            rerun::ColorModel::L,
        ),
    )?;

    Ok(())
}

fn wait_for_key() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel();

    ctrlc::set_handler({
        let tx = tx.clone();
        move || {
            println!("Received Ctrl-C signal. Exiting.");
            let _ = tx.send(());
        }
    })?;

    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = tx.send(());
    });

    println!("Press Enter to exit.");
    rx.recv()?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let output = match scan(&args) {
        Ok(output) => output,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    if !args.no_viz {
        if let Err(err) = visualize(&output) {
            log::error!("Failed to visualize the results. {err}");
            return ExitCode::from(VISUALIZATION_EXIT_CODE);
        }
    }

    if !args.no_wait {
        if let Err(err) = wait_for_key() {
            log::warn!("Not waiting for a key press. {err}");
        }
    }

    ExitCode::SUCCESS
}
