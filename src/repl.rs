use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, BufRead, Write};

pub const PROMPT: &str = ">> ";

/// Line-oriented driver: one program per line, evaluated against an
/// environment that persists for the whole session. End of input ends the
/// loop.
pub fn start(input: &mut dyn BufRead, output: &mut dyn Write) -> io::Result<()> {
    let mut evaluator = Evaluator::new();
    let mut line = String::new();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let source = line.trim();
        if source.is_empty() {
            continue;
        }

        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();

        if !parser.errors().is_empty() {
            for error in parser.errors() {
                writeln!(output, "Syntax error: {}", error)?;
            }
            continue;
        }

        match evaluator.evaluate_program(&program) {
            Ok(value) => writeln!(output, "{}", value)?,
            Err(error) => writeln!(output, "Error: {}", error)?,
        }
    }
}
