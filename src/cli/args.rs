// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::{Args, Parser, Subcommand};

use crate::classifier::Exercise;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Run Options:
    --model, -m <MODEL>        Path to a single-pose ONNX model
    --source, -s <SOURCE>      Camera device path, device index, or video file [default: auto]
    --exercise, -e <EXERCISE>  push-up, plank, sit-up, lunge, squat, or none [default: squat]
    --color <COLOR>            Good-posture skeleton color (name or #rrggbb) [default: green]
    --width <WIDTH>            Viewport width [default: 960]
    --height <HEIGHT>          Viewport height [default: 720]
    --min-score <SCORE>        Minimum pose score to keep a detection [default: 0.2]
    --imgsz <IMGSZ>            Model input size [default: 192]
    --rotate <DEGREES>         Rotate captured frames (0, 90, 180, 270)
    --verbose                  Show verbose output

Examples:
    posefit run --model movenet.onnx
    posefit run --model movenet.onnx --exercise push-up --color cyan
    posefit run -m movenet.onnx -s /dev/video2 --rotate 90
    posefit run -m movenet.onnx -s workout.mp4 --exercise lunge --verbose"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an exercise session on a camera or video stream
    Run(RunArgs),
}

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to a single-pose ONNX model
    #[arg(short, long)]
    pub model: String,

    /// Camera device path, device index, or video file ("auto" selects a camera)
    #[arg(short, long, default_value = "auto")]
    pub source: String,

    /// Exercise to evaluate
    #[arg(short, long, default_value = "squat")]
    pub exercise: Exercise,

    /// Good-posture skeleton color (name or #rrggbb)
    #[arg(long, default_value = "green")]
    pub color: String,

    /// Viewport width
    #[arg(long, default_value_t = 960)]
    pub width: u32,

    /// Viewport height
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Minimum pose score to keep a detection
    #[arg(long, default_value_t = 0.2)]
    pub min_score: f32,

    /// Model input size (square)
    #[arg(long, default_value_t = 192)]
    pub imgsz: u32,

    /// Rotate captured frames by this many degrees
    #[arg(long)]
    pub rotate: Option<i32>,

    /// Show verbose output
    #[arg(long)]
    pub verbose: bool,
}
