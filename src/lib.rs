//! A tree-walking interpreter for the Lox language.
//!
//! Four passes run in sequence over a source string: the [`scanner`] turns
//! bytes into tokens, the [`parser`] turns tokens into a statement tree, the
//! [`resolver`] binds every variable use to a lexical-scope distance, and the
//! [`interpreter`] executes the tree against a chained environment. Each pass
//! is skipped when its predecessor reported errors.
//!
//! [`Lox`] wires the passes together over a pair of output sinks:
//!
//! ```
//! use loxide::{Lox, RunStatus};
//!
//! let mut out: Vec<u8> = Vec::new();
//! let mut err: Vec<u8> = Vec::new();
//!
//! let mut lox = Lox::new(&mut out, &mut err);
//! assert_eq!(lox.run("print 1 + 2 * 3;"), RunStatus::Ok);
//!
//! drop(lox);
//! assert_eq!(out, b"7\n");
//! ```

pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// What a [`Lox::run`] invocation amounted to. Maps onto the process exit
/// codes the CLI uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    CompileError,
    RuntimeError,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::CompileError => 65,
            RunStatus::RuntimeError => 75,
        }
    }
}

/// The interpreter driver: scans, parses, resolves, executes.
///
/// Diagnostics go to `err`; `print` output goes to the interpreter's `out`
/// sink. Interpreter state survives across `run` calls so an interactive
/// session can define a function on one line and call it on the next.
pub struct Lox<Out: Write, ErrSink: Write> {
    interpreter: Interpreter<Out>,
    err: ErrSink,
    /// First expression id the next parse may use. Ids key the resolver's
    /// distance table and old trees stay alive inside closures, so they must
    /// never repeat across runs.
    next_expr_id: usize,
}

impl<Out: Write, ErrSink: Write> Lox<Out, ErrSink> {
    pub fn new(out: Out, err: ErrSink) -> Self {
        Lox {
            interpreter: Interpreter::new(out),
            err,
            next_expr_id: 0,
        }
    }

    /// Runs one source text through the full pipeline.
    ///
    /// Compile-time errors accumulate and are all reported before the run is
    /// abandoned; a runtime error aborts the script but leaves completed
    /// definitions in place.
    pub fn run(&mut self, source: &str) -> RunStatus {
        info!("Running {} bytes of source", source.len());

        // Pass 1: scan. Lexical errors are reported but scanning continues,
        // so one bad character does not hide the next.
        let mut tokens: Vec<Token> = Vec::new();
        let mut had_error = false;

        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),

                Err(e) => {
                    self.report(&e);
                    had_error = true;
                }
            }
        }

        if had_error {
            return RunStatus::CompileError;
        }

        // Pass 2: parse.
        let mut parser = Parser::with_first_id(tokens, self.next_expr_id);
        let (statements, parse_errors) = parser.parse();
        self.next_expr_id = parser.next_id();

        if !parse_errors.is_empty() {
            for e in &parse_errors {
                self.report(e);
            }

            return RunStatus::CompileError;
        }

        // Pass 3: resolve. Writes scope distances into the interpreter.
        let resolve_errors = Resolver::new(&mut self.interpreter).resolve(&statements);

        if !resolve_errors.is_empty() {
            for e in &resolve_errors {
                self.report(e);
            }

            return RunStatus::CompileError;
        }

        // Pass 4: execute.
        match self.interpreter.interpret(&statements) {
            Ok(()) => RunStatus::Ok,

            Err(e) => {
                self.report(&e);
                RunStatus::RuntimeError
            }
        }
    }

    fn report(&mut self, error: &LoxError) {
        debug!("Reporting diagnostic: {}", error);

        // A broken diagnostic sink leaves nowhere to report to.
        let _ = writeln!(self.err, "{}", error);
    }
}
