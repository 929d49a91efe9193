//! The Enki compiler CLI
//!
//! `enkic compile` runs the front-end pipeline and either writes the AST as
//! JSON (`-a`) or emits a C++ translation unit and hands it to the host
//! `g++`. `enkic serde` round-trips the AST through JSON to validate the
//! serialisation format. The `LOG` environment variable sets the diagnostic
//! log level.

use clap::{Parser, Subcommand};
use enki::ast::Program;
use enki::span::SourceFile;
use enki::{codegen, diagnostics, inject, lexer, modules, parser, serialize, typeck};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enkic")]
#[command(version = enki::VERSION)]
#[command(about = "The Enki compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an Enki source file
    Compile {
        /// Input file to compile
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output the AST as JSON instead of compiling
        #[arg(short = 'a', long = "ast")]
        ast: bool,

        /// Minimal AST output for visualisation (no spans or scopes)
        #[arg(long)]
        vis: bool,
    },

    /// Round-trip the AST through JSON to validate the serialisation format
    Serde {
        /// Input file to check
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn init_logging() {
    let level = std::env::var("LOG").unwrap_or_else(|_| "info".to_string());
    // spdlog spells the top severity "critical"; tracing calls it error
    let level = if level.eq_ignore_ascii_case("critical") {
        "error".to_string()
    } else {
        level
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Run lexer, parser, injection and type checker on one input file.
/// Diagnostics are rendered to stderr; the returned error only carries the
/// failing stage.
fn compile_front(input: &Path) -> miette::Result<(SourceFile, Program)> {
    let source = fs::read_to_string(input)
        .map_err(|e| miette::miette!("failed to read {}: {}", input.display(), e))?;
    let file = SourceFile::new(input.to_string_lossy(), source);

    let tokens = match lexer::lex(&file) {
        Ok(tokens) => tokens,
        Err(err) => {
            diagnostics::emit(&file, err.span(), &err.to_string());
            return Err(miette::miette!("lexing failed"));
        }
    };

    let mut modules = modules::ModuleCache::new();
    let mut program = match parser::parse(&tokens, &file, &mut modules) {
        Ok(program) => program,
        Err(err) => {
            diagnostics::emit(&file, err.span(), &err.to_string());
            return Err(miette::miette!("parsing failed"));
        }
    };

    inject::perform_injections(&mut program);

    if let Err(err) = typeck::typecheck(&mut program) {
        diagnostics::emit(&file, err.span, &err.to_string());
        return Err(miette::miette!("type checking failed"));
    }

    Ok((file, program))
}

/// Default output location: ./build/<input stem><extension>
fn default_output_path(input: &Path, extension: &str) -> miette::Result<PathBuf> {
    let build_dir = Path::new("./build");
    fs::create_dir_all(build_dir)
        .map_err(|e| miette::miette!("failed to create {}: {}", build_dir.display(), e))?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    Ok(build_dir.join(format!("{}{}", stem, extension)))
}

fn compile_command(
    input: PathBuf,
    output: Option<PathBuf>,
    ast: bool,
    vis: bool,
) -> miette::Result<()> {
    if output.as_deref() == Some(input.as_path()) {
        return Err(miette::miette!(
            "do not use the same file for both input and output"
        ));
    }

    let (_file, program) = compile_front(&input)?;

    if ast {
        let out_path = match output {
            Some(path) => path,
            None => default_output_path(&input, ".ast.json")?,
        };
        let json = if vis {
            serialize::to_vis_json(&program)
        } else {
            serialize::to_json(&program)
        }
        .map_err(|e| miette::miette!("failed to serialise AST: {}", e))?;
        fs::write(&out_path, json + "\n")
            .map_err(|e| miette::miette!("failed to write {}: {}", out_path.display(), e))?;
        tracing::info!("wrote AST to {}", out_path.display());
        return Ok(());
    }

    let out_path = match output {
        Some(path) => path,
        None => default_output_path(&input, "")?,
    };
    let cpp_path = PathBuf::from(format!("{}.cpp", out_path.display()));
    fs::write(&cpp_path, codegen::codegen(&program))
        .map_err(|e| miette::miette!("failed to write {}: {}", cpp_path.display(), e))?;
    tracing::info!("wrote C++ code to {}", cpp_path.display());

    // Hand the translation unit to the host C++ compiler
    let status = Command::new("g++")
        .arg("-std=c++17")
        .arg("-o")
        .arg(&out_path)
        .arg(&cpp_path)
        .status()
        .map_err(|e| miette::miette!("failed to run g++: {}", e))?;
    if !status.success() {
        return Err(miette::miette!("failed to compile generated C++ code"));
    }
    tracing::info!("compiled {}", out_path.display());
    Ok(())
}

fn serde_command(input: PathBuf) -> miette::Result<()> {
    let (_file, program) = compile_front(&input)?;

    let json_path = default_output_path(&input, ".ast.json")?;
    let json = serialize::to_json(&program)
        .map_err(|e| miette::miette!("failed to serialise AST: {}", e))?;
    fs::write(&json_path, &json)
        .map_err(|e| miette::miette!("failed to write {}: {}", json_path.display(), e))?;
    tracing::info!("wrote AST to {}", json_path.display());

    let parsed = serialize::from_json(&json)
        .map_err(|e| miette::miette!("failed to deserialise AST: {}", e))?;

    if program.body.statements.len() != parsed.body.statements.len() {
        return Err(miette::miette!(
            "AST mismatch after serialisation round trip: {} statements became {}",
            program.body.statements.len(),
            parsed.body.statements.len()
        ));
    }

    let rejson = serialize::to_json(&parsed)
        .map_err(|e| miette::miette!("failed to re-serialise AST: {}", e))?;
    if json != rejson {
        return Err(miette::miette!(
            "AST serialisation is not stable across a round trip"
        ));
    }

    tracing::info!("AST serialisation round trip successful");
    Ok(())
}

fn main() -> miette::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            ast,
            vis,
        } => compile_command(input, output, ast, vis),
        Commands::Serde { input } => serde_command(input),
    }
}
