use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use surfacekit::commands;
use surfacekit::{init_logging, Anchor, Config, SectionRecorder, BUILD_DATE, VERSION};

#[derive(Parser, Debug)]
#[command(name = "surfacekit")]
#[command(about = "Drape flat G-code toolpaths onto scanned or meshed surfaces")]
#[command(version)]
struct Cli {
    /// Settings file (.toml or .json); defaults to the platform config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Conform a program to a section file or STL surface
    Conform {
        /// Program to conform
        input: PathBuf,
        /// Section file, or an STL mesh when the extension is .stl
        #[arg(long)]
        surface: PathBuf,
        /// Output program
        #[arg(short, long)]
        output: PathBuf,
        /// Centre the conformed program on this anchor
        #[arg(long)]
        center: Option<Anchor>,
        /// Sample a triangulated mesh instead of the raw grid
        #[arg(long)]
        mesh: bool,
        /// Skip height-map smoothing
        #[arg(long)]
        no_smoothing: bool,
        /// Print the job summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Smooth a section file into a new section file
    Smooth {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Triangulate a section file and save it as STL
    Mesh {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Physical X and Y size of the scanned area
        #[arg(long, num_args = 2, value_names = ["X_LENGTH", "Y_LENGTH"])]
        size: Option<Vec<f64>>,
        /// Centre the mesh on the XY origin
        #[arg(long)]
        center: bool,
    },

    /// Write the line pattern program
    Generate {
        /// Output program, defaults to the configured save directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        lines: Option<usize>,
        #[arg(long)]
        spacing: Option<f64>,
        #[arg(long)]
        length: Option<f64>,
    },

    /// Record probe readings into a section file
    Record {
        /// Section file to write
        #[arg(short, long)]
        output: PathBuf,
        /// Serial port to read; stdin when omitted and none is configured
        #[arg(long)]
        port: Option<String>,
        #[arg(long)]
        baud: Option<u32>,
        /// Stop after this many seconds when reading a serial port
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Print the point count and XY extents of a program
    Preview {
        input: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    Config::load_or_create(&path)
        .with_context(|| format!("loading settings from {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    info!("surfacekit {} ({})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::Conform {
            input,
            surface,
            output,
            center,
            mesh,
            no_smoothing,
            json,
        } => {
            if let Some(anchor) = center {
                config.output.center_program = true;
                config.output.centering_anchor = anchor;
            }
            config.heightmap.use_mesh |= mesh;
            config.smoothing.enabled &= !no_smoothing;

            let summary = commands::conform_job(&config, &input, &output, &surface).run()?;
            if json {
                println!("{}", summary.to_json()?);
            } else {
                println!(
                    "Wrote {} lines to {} ({} duplicates removed, {} surface)",
                    summary.output_lines,
                    output.display(),
                    summary.duplicates_removed,
                    summary.surface
                );
            }
        }

        Commands::Smooth { input, output } => {
            let report = commands::smooth_sections(&config, &input, &output)?;
            println!(
                "{} passes, {} adjustments, converged: {}",
                report.passes, report.adjustments, report.converged
            );
        }

        Commands::Mesh {
            input,
            output,
            size,
            center,
        } => {
            if let Some([x_length, y_length]) = size.as_deref() {
                config.heightmap.x_length = Some(*x_length);
                config.heightmap.y_length = Some(*y_length);
            }
            config.heightmap.center |= center;
            config.validate()?;

            let mesh = commands::mesh_from_sections(&config, &input, &output)?;
            let (dx, dy, dz) = mesh.dimensions();
            println!(
                "Wrote {} triangles to {} ({:.3} x {:.3} x {:.3})",
                mesh.triangle_count(),
                output.display(),
                dx,
                dy,
                dz
            );
        }

        Commands::Generate {
            output,
            lines,
            spacing,
            length,
        } => {
            let params = &mut config.line_pattern;
            params.line_count = lines.unwrap_or(params.line_count);
            params.line_spacing = spacing.unwrap_or(params.line_spacing);
            params.x_length = length.unwrap_or(params.x_length);

            let output =
                output.unwrap_or_else(|| commands::default_output(&config, "line_pattern.gcode"));
            let count = commands::generate_line_pattern(&config, &output)?;
            println!("Wrote {} lines to {}", count, output.display());
        }

        Commands::Record {
            output,
            port,
            baud,
            seconds,
        } => {
            let port = port.unwrap_or_else(|| config.recorder.serial_port.clone());
            let baud = baud.unwrap_or(config.recorder.baud_rate);

            let stats = if port.is_empty() {
                info!("Reading probe values from stdin");
                commands::record_lines(&config, std::io::stdin().lock(), &output)?
            } else {
                let serial = serialport::new(&port, baud)
                    .timeout(Duration::from_millis(config.recorder.timeout_ms))
                    .open()
                    .with_context(|| format!("opening serial port {}", port))?;
                info!("Reading probe values from {} at {} baud", port, baud);

                let handle = SectionRecorder::new(&output, config.recorder_config())
                    .start_reading(BufReader::new(serial))?;
                let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
                while handle.is_running() && deadline.map_or(true, |d| Instant::now() < d) {
                    thread::sleep(Duration::from_millis(100));
                }
                handle.stop()?
            };
            println!(
                "Recorded {} readings in {} sections to {}",
                stats.readings,
                stats.sections,
                output.display()
            );
        }

        Commands::Preview { input, json } => {
            let summary = commands::preview(&config, &input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{} commands, {} motion", summary.commands, summary.motion_commands);
                println!("{} polyline points", summary.points);
                if let (Some((x_min, x_max)), Some((y_min, y_max))) = (summary.x, summary.y) {
                    println!("X {:.3} .. {:.3}", x_min, x_max);
                    println!("Y {:.3} .. {:.3}", y_min, y_max);
                }
            }
        }
    }

    Ok(())
}
