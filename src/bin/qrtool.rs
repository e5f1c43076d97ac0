use clap::{ArgGroup, Args, Parser, Subcommand};
use qr_transfer::decoder::DecodeStats;
use qr_transfer::tools::{init_tracing, load_rgb};
use qr_transfer::{
    CancelToken, DecodeConfig, DecodePipeline, PayloadFramer, ProgressEvent, RenderConfig,
    RobustDecoder, SlideDeck, SlideshowController, TransferError,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "Send and receive files as QR slides")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render text or a file as a deck of QR slides
    Encode(EncodeArgs),
    /// Rebuild a payload from a screen recording
    Decode(DecodeArgs),
    /// Decode the QR symbol in a single image
    Scan {
        #[arg(long)]
        image: PathBuf,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
struct EncodeArgs {
    /// Text to send
    #[arg(long)]
    text: Option<String>,
    /// File to send
    #[arg(long)]
    file: Option<PathBuf>,
    /// Directory the slide PNGs are copied into
    #[arg(long, default_value = "slides")]
    out: PathBuf,
    /// Side of the square slide in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(64..))]
    canvas_side: Option<u32>,
    /// Code points per chunk
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    chunk_size: Option<u64>,
    /// Step through the slides after rendering
    #[arg(long)]
    play: bool,
    /// Milliseconds between slides with --play
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Args)]
struct DecodeArgs {
    /// Video file (overrides --video)
    #[arg(value_name = "VIDEO")]
    video_pos: Option<PathBuf>,
    /// Directory for change-frame snapshots (overrides --frames)
    #[arg(value_name = "FRAMES")]
    frames_pos: Option<PathBuf>,
    /// Directory for the rebuilt payload (overrides --out)
    #[arg(value_name = "OUTPUT")]
    out_pos: Option<PathBuf>,

    #[arg(long, default_value = "video/qrs.mp4")]
    video: PathBuf,
    #[arg(long, default_value = "frames")]
    frames: PathBuf,
    #[arg(long, default_value = "output")]
    out: PathBuf,
    /// Frames sampled per second
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    fps: Option<u32>,
    /// Change threshold in [0, 1]
    #[arg(long, value_parser = parse_unit_interval)]
    threshold: Option<f64>,
    /// Signature grid side
    #[arg(long, value_parser = clap::value_parser!(u64).range(8..))]
    analysis_size: Option<u64>,
    /// Frames sampled per segment (0 = default)
    #[arg(long)]
    decode_window: Option<usize>,
    /// Shorter runs are transient: decoded, misses not reported
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    min_segment_frames: Option<u64>,
    /// Decode samples one at a time
    #[arg(long)]
    sequential: bool,
}

fn parse_unit_interval(value: &str) -> Result<f64, String> {
    let v: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err("must be between 0 and 1".to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Encode(args) => encode_cmd(args),
        Command::Decode(args) => decode_cmd(args),
        Command::Scan { image } => match scan_cmd(&image) {
            Ok(true) => Ok(()),
            Ok(false) => return ExitCode::FAILURE,
            Err(err) => Err(err),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if err.is_input_error() {
                eprintln!("run `qrtool --help` for usage");
            }
            ExitCode::FAILURE
        }
    }
}

fn encode_cmd(args: EncodeArgs) -> Result<(), TransferError> {
    let mut config = RenderConfig::default().with_env_overrides();
    if let Some(side) = args.canvas_side {
        config.canvas_side = side;
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size as usize;
    }
    if let Some(delay) = args.delay_ms {
        config.slide_delay_ms = delay;
    }
    config.validate()?;

    let mut framer = PayloadFramer::new(config.chunk_size);
    let chunks = match (&args.text, &args.file) {
        (Some(text), _) => framer.frame_text(text)?,
        (None, Some(file)) => framer.frame_file(file)?,
        (None, None) => return Err(TransferError::EmptyInput),
    };
    println!("Chunks: {} (+ warmup)", chunks.len() - 1);

    let started = Instant::now();
    let observer = |event: ProgressEvent| {
        if let ProgressEvent::SlideRendered { done, total } = event {
            eprint!("\rRendering {done}/{total}");
            if done == total {
                eprintln!();
            }
        }
    };
    let deck = SlideDeck::render(&chunks, &config, Some(&observer), &CancelToken::new())?;
    let written = deck.export(&args.out)?;
    println!(
        "Wrote {} slides to {} in {:.2?}",
        written.len(),
        args.out.display(),
        started.elapsed()
    );

    if args.play {
        let mut controller = SlideshowController::new(config.slide_delay_ms);
        controller.start(deck);
        let shown = controller.play(|slide| {
            println!("{}  {}", slide.title, slide.path.display());
            true
        });
        println!("Shown {shown} slides");
    }
    Ok(())
}

fn decode_cmd(args: DecodeArgs) -> Result<(), TransferError> {
    let mut config = DecodeConfig::default().with_env_overrides();
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(threshold) = args.threshold {
        config.change_threshold = threshold;
    }
    if let Some(size) = args.analysis_size {
        config.analysis_size = size as usize;
    }
    if let Some(window) = args.decode_window {
        config.decode_window = window;
    }
    if let Some(min) = args.min_segment_frames {
        config.min_segment_frames = min as usize;
    }
    if args.sequential {
        config.parallel = false;
    }
    config.validate()?;

    let video = args.video_pos.unwrap_or(args.video);
    let frames = args.frames_pos.unwrap_or(args.frames);
    let out = args.out_pos.unwrap_or(args.out);

    let observer = |event: ProgressEvent| match event {
        ProgressEvent::FramesExtracted { frames } => eprintln!("Frames extracted: {frames}"),
        ProgressEvent::SegmentDecoded {
            ordinal,
            frames,
            text_len: None,
        } => eprintln!("Segment {ordinal} ({frames} frames): no QR"),
        _ => {}
    };

    let report = DecodePipeline::new(config).run(&video, &frames, &out, Some(&observer))?;
    let payload = &report.payload;
    println!("Payload: {}", payload.output_path.display());
    println!("  type: {}", payload.mime_type);
    println!("  bytes: {}", payload.payload_bytes);
    println!("  chunks: {}", payload.chunk_count);
    if let Some(name) = &payload.original_file_name {
        println!("  sent as: {name}");
    }
    if let Some(dir) = &payload.extracted_dir {
        println!("  extracted to: {}", dir.display());
    }
    let t = &report.telemetry;
    println!(
        "Frames: {}  segments: {}  missed: {}  repeats: {}  changes: {}  time: {:.2?}",
        t.frames,
        t.segments,
        t.missed_segments,
        t.repeated_segments,
        t.segmenter.radical_changes,
        report.elapsed
    );
    Ok(())
}

/// Decode one image; `Ok(false)` when no symbol is found.
fn scan_cmd(image: &Path) -> Result<bool, TransferError> {
    let rgb = load_rgb(image)?;
    println!("Image: {} ({}x{})", image.display(), rgb.width(), rgb.height());

    let mut stats = DecodeStats::default();
    match RobustDecoder::new().decode_with_stats(&rgb, &mut stats) {
        Some(hit) => {
            println!(
                "Decoded with crop={:?} scale={} binarizer={} after {} attempts",
                hit.crop_ratio, hit.scale, hit.binarizer, stats.attempts
            );
            println!("{}", hit.text);
            Ok(true)
        }
        None => {
            println!("No QR found after {} attempts", stats.attempts);
            Ok(false)
        }
    }
}
