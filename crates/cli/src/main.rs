#![deny(unsafe_code)]
//! CLI binary for shaderkit.
//!
//! Subcommands:
//! - `check <vertex> <fragment>` / `check --preset <name>`: build a shader
//!   pair against the headless backend and report the outcome
//! - `presets`: print the stock shader pair names

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use shaderkit_core::{
    BuildDiagnostic, BuildPhase, HeadlessGl, ShaderPreset, ShaderProgramBuilder, ShaderSource,
    ShaderStage,
};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "shaderkit", about = "Check GLSL ES shader pairs")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log driver calls and build steps to stderr (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile and link a vertex/fragment pair.
    Check {
        /// Vertex shader source file.
        #[arg(required_unless_present = "preset", requires = "fragment")]
        vertex: Option<PathBuf>,

        /// Fragment shader source file.
        fragment: Option<PathBuf>,

        /// Check a built-in pair instead of files.
        #[arg(short, long, conflicts_with_all = ["vertex", "fragment"])]
        preset: Option<String>,
    },
    /// List built-in shader pairs.
    Presets,
}

/// Shader text for both stages plus a label for reporting.
struct Pair {
    label: String,
    vertex: String,
    fragment: String,
}

fn read_source(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))
}

fn load_pair(
    vertex: Option<PathBuf>,
    fragment: Option<PathBuf>,
    preset: Option<String>,
) -> Result<Pair, CliError> {
    if let Some(name) = preset {
        let preset = ShaderPreset::from_name(&name)?;
        return Ok(Pair {
            label: format!("preset {name}"),
            vertex: preset.vertex_source().to_string(),
            fragment: preset.fragment_source().to_string(),
        });
    }

    let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
        return Err(CliError::Input(
            "need both <vertex> and <fragment> paths, or --preset".to_string(),
        ));
    };
    Ok(Pair {
        label: format!("{} + {}", vertex.display(), fragment.display()),
        vertex: read_source(&vertex)?,
        fragment: read_source(&fragment)?,
    })
}

/// Builds `pair` on a fresh headless context. The program is released
/// before returning; only the outcome matters here.
fn check_pair(pair: &Pair) -> Result<(), CliError> {
    let gl = HeadlessGl::new();
    match ShaderProgramBuilder::new(&gl).build(&pair.vertex, &pair.fragment) {
        Ok(program) => {
            program.release(&gl);
            Ok(())
        }
        Err(diagnostic) => {
            let details = match diagnostic.stage() {
                Some(ShaderStage::Vertex) => {
                    ShaderSource::vertex(&pair.vertex).annotate(diagnostic.message())
                }
                Some(ShaderStage::Fragment) => {
                    ShaderSource::fragment(&pair.fragment).annotate(diagnostic.message())
                }
                None => diagnostic.message().to_string(),
            };
            let report = format!("{}: {}\n{details}", pair.label, summary(&diagnostic));
            Err(CliError::Build { diagnostic, report })
        }
    }
}

fn summary(diagnostic: &BuildDiagnostic) -> String {
    match diagnostic.stage() {
        Some(stage) => format!("{stage} shader failed to compile"),
        None => "program failed to link".to_string(),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Presets => {
            let names = ShaderPreset::list_names();
            if cli.json {
                let info = serde_json::json!({ "presets": names });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Presets:");
                for name in names {
                    println!("  {name}");
                }
            }
        }
        Command::Check {
            vertex,
            fragment,
            preset,
        } => {
            let pair = load_pair(vertex, fragment, preset)?;
            check_pair(&pair)?;

            if cli.json {
                let info = serde_json::json!({ "input": pair.label, "status": "ok" });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!("ok: {} compiled and linked", pair.label);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        // Failures are already reported on stderr; keep the log quiet.
        builder.filter_level(log::LevelFilter::Off);
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let mut j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            if let CliError::Build { diagnostic, .. } = &e {
                j["phase"] = serde_json::json!(match diagnostic.phase() {
                    BuildPhase::Compile => "compile",
                    BuildPhase::Link => "link",
                });
                j["stage"] = serde_json::json!(diagnostic.stage().map(|s| s.name()));
                j["log"] = serde_json::json!(diagnostic.message());
            }
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
