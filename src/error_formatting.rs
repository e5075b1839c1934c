use crate::bytecode::bytecode_interpreter::RuntimeError;
use crate::compiler;
use crate::config::ConfigError;
use crate::input;
use crate::scanner;

use colored::*;

fn format_input(input: &input::Input, line: usize, col: i64) {
    eprintln!(
        "in {}, at line {}, column {}:",
        input.name(),
        line,
        col
    );
    if let Some(text) = input.line(line) {
        eprintln!("{}", text);
        eprint!("{:~<1$}", "".blue().bold(), col.max(0) as usize);
        eprintln!("{}", "^".blue().bold());
    }
}

pub fn format_compiler_error(err: &compiler::Error, input: &input::Input) {
    match err {
        compiler::Error::Lexical(err) => format_lexical_error(err, input),
        compiler::Error::Parse(err) => {
            eprintln!(
                "stackvm: {}: {}",
                "parse error".red().bold(),
                err.what.white().bold(),
            );
            format_input(input, err.line, err.col);
        }
        compiler::Error::Internal(err) => {
            eprintln!(
                "stackvm: {}: {}",
                "internal error".red().bold(),
                err.white().bold()
            );
        }
    }
}

pub fn format_lexical_error(err: &scanner::Error, input: &input::Input) {
    eprintln!(
        "stackvm: {}: {}",
        "lexical error".red().bold(),
        err.what.white().bold(),
    );

    format_input(input, err.line, err.col);
}

pub fn format_runtime_error(err: &RuntimeError, input: &input::Input) {
    eprintln!(
        "stackvm: {}: {}",
        "runtime error".red().bold(),
        err.message.white().bold(),
    );
    eprintln!("[line {}] in {}", err.line, input.name());
    if let Some(text) = input.line(err.line.value) {
        eprintln!("{}", text);
    }
}

pub fn format_config_error(err: &ConfigError) {
    eprintln!(
        "stackvm: {}: {}",
        "config error".red().bold(),
        err.to_string().white().bold()
    );
}
