use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Runs a whole source text through the pipeline, rendering any errors as
/// source-annotated diagnostic reports.
pub fn run(source: &str, filename: Option<&str>) {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        for error in parser.errors() {
            error.report(source, filename);
        }
        return;
    }

    let mut evaluator = Evaluator::new();
    if let Err(error) = evaluator.evaluate_program(&program) {
        error.report(source, filename);
    }
}
