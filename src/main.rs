//! WhileSynth CLI
//!
//! Command-line front end for the While verifier and synthesizer

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;
use std::process;
use whilesynth::ast::printer::pretty;
use whilesynth::error::ToolError;
use whilesynth::{parser, Synthesizer};

#[derive(Parser)]
#[command(name = "whilesynth")]
#[command(about = "Verifier and sketch-based synthesizer for the While language", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a Hoare triple {pre} program {post}
    Verify {
        /// Program file ('-' reads standard input)
        file: PathBuf,

        /// Precondition predicate
        #[arg(long, default_value = "true")]
        pre: String,

        /// Postcondition predicate
        #[arg(long, default_value = "true")]
        post: String,

        /// Loop invariant predicate
        #[arg(long)]
        invariant: Option<String>,

        /// Maximum loop unfolding depth
        #[arg(long, default_value_t = whilesynth::verification::DEFAULT_MAX_UNFOLD_DEPTH)]
        max_depth: usize,
    },

    /// Fill the `??` holes of a sketch against input/output examples
    Synth {
        /// Sketch file ('-' reads standard input)
        file: PathBuf,

        /// Input example predicate (repeatable, zipped with --output)
        #[arg(long = "input")]
        inputs: Vec<String>,

        /// Output example predicate (repeatable, zipped with --input)
        #[arg(long = "output")]
        outputs: Vec<String>,

        /// Loop invariant predicate
        #[arg(long)]
        invariant: Option<String>,

        /// Maximum loop unfolding depth
        #[arg(long, default_value_t = whilesynth::verification::DEFAULT_MAX_UNFOLD_DEPTH)]
        max_depth: usize,
    },

    /// Parse a program and dump its AST
    Ast {
        /// Program file ('-' reads standard input)
        file: PathBuf,

        /// Emit the AST as JSON instead of normalized surface syntax
        #[arg(long)]
        json: bool,
    },

    /// Interactive synthesis dialog
    Interactive,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Verify {
            file,
            pre,
            post,
            invariant,
            max_depth,
        } => {
            let source = read_program(&file)?;
            let synthesizer = Synthesizer::new().max_unfold_depth(max_depth);
            let valid =
                synthesizer.verify_source(&source, &pre, &post, invariant.as_deref())?;
            if valid {
                println!("Triple is valid.");
                Ok(0)
            } else {
                println!("Could not prove the triple.");
                Ok(1)
            }
        }

        Commands::Synth {
            file,
            inputs,
            outputs,
            invariant,
            max_depth,
        } => {
            if inputs.len() != outputs.len() {
                return Err(ToolError::ExampleMismatch {
                    inputs: inputs.len(),
                    outputs: outputs.len(),
                }
                .into());
            }
            let examples: Vec<(String, String)> =
                inputs.into_iter().zip(outputs).collect();

            let source = read_program(&file)?;
            let synthesizer = Synthesizer::new().max_unfold_depth(max_depth);
            match synthesizer.synthesize_source(&source, invariant.as_deref(), &examples)? {
                Some(result) => {
                    println!(">> Found a model.");
                    if !result.model.is_empty() {
                        println!(">> Holes: {}", result.model);
                    }
                    println!("{}", result.source);
                    if result.verified {
                        println!(">> Verification successful.");
                        Ok(0)
                    } else {
                        println!(">> Verification of the completed program failed.");
                        Ok(1)
                    }
                }
                None => {
                    println!(">> Could not find a model.");
                    Ok(1)
                }
            }
        }

        Commands::Ast { file, json } => {
            let source = read_program(&file)?;
            let program = parser::parse(&source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&program)?);
            } else {
                println!("{}", pretty(&program, None));
            }
            Ok(0)
        }

        Commands::Interactive => interactive(),
    }
}

fn read_program(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("reading program from stdin")?;
        Ok(source)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading program from {}", path.display()))
    }
}

/// The interactive dialog: read a program terminated by `.`, collect
/// example pairs and an invariant, synthesize, and report
fn interactive() -> anyhow::Result<i32> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    let program_text;
    println!("Enter a program (finish with a line ending in '.'):");
    loop {
        let mut text = String::new();
        while !text.trim_end().ends_with('.') {
            match lines.next() {
                Some(line) => {
                    text.push_str(&line?);
                    text.push('\n');
                }
                None => return Ok(2),
            }
        }
        let text = text.trim_end().trim_end_matches('.').to_string();
        match parser::parse(&text) {
            Ok(_) => {
                program_text = text;
                break;
            }
            Err(error) => println!("Invalid program ({error}). Try again:"),
        }
    }
    let program = parser::parse(&program_text)?;
    let program_vars = program.variable_uses().names();
    println!("Program parsed successfully.");

    let mut examples: Vec<(String, String)> = Vec::new();
    println!("Do you want to provide input/output examples? (y/n)");
    while matches!(next_line(&mut lines)?.as_str(), "y" | "Y") {
        let pre = read_predicate(&mut lines, "Enter input example:", &program_vars)?;
        let post = read_predicate(&mut lines, "Enter output example:", &program_vars)?;
        examples.push((pre, post));
        println!("Do you want to provide more examples? (y/n)");
    }

    println!("Enter loop invariant (leave empty to omit):");
    let invariant = loop {
        let text = next_line(&mut lines)?;
        if text.is_empty() {
            break None;
        }
        match parser::parse_predicate(&text) {
            Ok(_) => break Some(text),
            Err(error) => println!("Invalid loop invariant ({error}). Try again:"),
        }
    };

    let synthesizer = Synthesizer::new();
    match synthesizer.synthesize_source(&program_text, invariant.as_deref(), &examples)? {
        Some(result) => {
            println!(">> Found a model.");
            println!(">> Full program:");
            println!("{}", result.source);
            if result.verified {
                println!(">> Verification successful.");
                Ok(0)
            } else {
                println!(">> Verification of the completed program failed.");
                Ok(1)
            }
        }
        None => {
            println!(">> Could not find a model.");
            Ok(1)
        }
    }
}

fn next_line(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
) -> anyhow::Result<String> {
    match lines.next() {
        Some(line) => Ok(line?.trim().to_string()),
        None => anyhow::bail!("unexpected end of input"),
    }
}

/// Prompt for a predicate restricted to the program's variables
fn read_predicate(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
    prompt: &str,
    program_vars: &std::collections::BTreeSet<String>,
) -> anyhow::Result<String> {
    println!("{prompt}");
    std::io::stdout().flush().ok();
    loop {
        let text = next_line(lines)?;
        match parser::parse_predicate(&text) {
            Ok(predicate) => {
                let used = predicate.variable_uses().names();
                if used.is_subset(program_vars) {
                    return Ok(text);
                }
                println!("Examples may only mention program variables. Try again:");
            }
            Err(error) => println!("Invalid predicate ({error}). Try again:"),
        }
    }
}
