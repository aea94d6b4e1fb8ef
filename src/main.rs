mod ast;
mod builtins;
mod error;
mod evaluator;
mod lexer;
mod parser;
mod repl;
mod runner;
mod value;

use clap::{Arg, Command};
use std::fs;
use std::io;
use std::path::Path;

fn main() {
    let matches = Command::new("ember")
        .about("A small expression-oriented scripting language")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => run_file(file_path),
        _ => start_repl(),
    }
}

fn run_file(path: &str) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        std::process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            runner::run(&source, path.to_str());
        }
        Err(error) => {
            eprintln!("Error reading file '{}': {}", path.display(), error);
            std::process::exit(1);
        }
    }
}

fn start_repl() {
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(error) = repl::start(&mut stdin.lock(), &mut stdout.lock()) {
        eprintln!("Error reading input: {}", error);
        std::process::exit(1);
    }
}
