//! Rubric CLI
//!
//! Usage:
//!   rubric grade config.json "m*(1-sin(2*m))"   - Grade submitted answers
//!   rubric parse "x^2 + 1"                      - Check a formula parses
//!   rubric parse --ast "x^2 + 1"                - Show the parsed tree

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use rubric_grade::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "rubric")]
#[command(version = "0.1.0")]
#[command(about = "Grade formula answers by sampled numerical equivalence", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grade one or more submitted answers against a grader configuration
    Grade {
        /// Grader configuration (JSON)
        config: PathBuf,

        /// Submitted answer text, one per input slot
        answers: Vec<String>,

        /// Print the verdict as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Parse a formula and report errors without grading
    Parse {
        /// The formula text
        formula: String,

        /// Show the parsed tree
        #[arg(short, long)]
        ast: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let code = match args.command {
        Command::Grade { config, answers, json } => run_grade(&config, &answers, json),
        Command::Parse { formula, ast } => run_parse(&formula, ast),
    };
    std::process::exit(code);
}

fn run_grade(config_path: &PathBuf, answers: &[String], json: bool) -> i32 {
    let source = match fs::read_to_string(config_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}: cannot read {}: {}", "error".red().bold(), config_path.display(), e);
            return 2;
        }
    };

    let config: GraderSpecConfig = match serde_json::from_str(&source) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: invalid grader config: {}", "error".red().bold(), e);
            return 2;
        }
    };

    let texts: Vec<&str> = answers.iter().map(String::as_str).collect();
    let verdict = grade(config, &texts);

    if json {
        match serde_json::to_string_pretty(&verdict) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                return 2;
            }
        }
    } else {
        let label = if verdict.ok {
            "correct".green().bold()
        } else if verdict.grade > 0.0 {
            "partially correct".yellow().bold()
        } else {
            "incorrect".red().bold()
        };
        println!("{} (grade {:.2})", label, verdict.grade);
        if !verdict.message.is_empty() {
            println!("{}", verdict.message);
        }
    }

    if verdict.ok {
        0
    } else {
        1
    }
}

fn run_parse(formula: &str, show_ast: bool) -> i32 {
    match rubric_parse::parse(formula) {
        Ok(expr) => {
            if show_ast {
                println!("{:#?}", expr);
            } else {
                println!("{} {}", "parsed:".green().bold(), expr);
            }
            0
        }
        Err(e) => {
            eprintln!("{}: {}", "parse error".red().bold(), e);
            1
        }
    }
}
