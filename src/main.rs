use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stackvm::bytecode::bytecode::Chunk;
use stackvm::bytecode::disassembler;
use stackvm::compiler;
use stackvm::error_formatting;
use stackvm::input::{Input, Source};
use stackvm::{InterpretResult, Interpreter, VmConfig};

mod line_reader;

const EXIT_USAGE: i32 = 64;
const EXIT_DATAERR: i32 = 65;
const EXIT_NOINPUT: i32 = 66;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "stackvm")]
#[command(about = "Compile and run scripts on a stack-based bytecode VM")]
struct Cli {
    /// Script to run. Starts a REPL when omitted.
    input: Option<PathBuf>,

    /// Run this source text instead of a file
    #[arg(short = 'c', long = "literal", conflicts_with = "input")]
    literal: Option<String>,

    /// Print the compiled chunk before running it
    #[arg(long)]
    disassemble: bool,

    /// Print the compiled chunk as JSON and exit without running it
    #[arg(long)]
    dump_chunk: bool,

    /// Log every instruction together with the stack
    #[arg(long)]
    trace: bool,

    /// Number of value slots in the evaluation stack
    #[arg(long)]
    stack_capacity: Option<usize>,

    /// JSON file with VM settings
    #[arg(long)]
    config: Option<PathBuf>,
}

struct Options {
    disassemble: bool,
    dump_chunk: bool,
}

fn init_logging(trace: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if trace => EnvFilter::new(format!("{},stackvm=trace", directives)),
        Ok(directives) => EnvFilter::new(directives),
        Err(_) if trace => EnvFilter::new("warn,stackvm=trace"),
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_config(cli: &Cli) -> Result<VmConfig, stackvm::ConfigError> {
    let config = match &cli.config {
        Some(path) => VmConfig::load(path)?,
        None => VmConfig::default(),
    };
    let mut config = config.with_env()?;
    if let Some(capacity) = cli.stack_capacity {
        config.stack_capacity = capacity;
    }
    if cli.trace {
        config.trace_execution = true;
    }
    config.validate()?;
    Ok(config)
}

fn report(res: &InterpretResult, input: &Input) {
    match res {
        InterpretResult::Ok => {}
        InterpretResult::CompileError(errors) => {
            for err in errors {
                error_formatting::format_compiler_error(err, input);
            }
        }
        InterpretResult::RuntimeError(err) => error_formatting::format_runtime_error(err, input),
    }
}

fn run_input(interpreter: &mut Interpreter, input: &Input, options: &Options) -> i32 {
    if !options.disassemble && !options.dump_chunk {
        let res = interpreter.interpret(&input.content);
        report(&res, input);
        return res.exit_code();
    }

    let chunk: Chunk = match compiler::compile(&input.content) {
        Ok(chunk) => chunk,
        Err(errors) => {
            let res = InterpretResult::CompileError(errors);
            report(&res, input);
            return res.exit_code();
        }
    };

    if options.dump_chunk {
        return match serde_json::to_string_pretty(&chunk) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(err) => {
                error!(%err, "could not serialize chunk");
                EXIT_DATAERR
            }
        };
    }

    println!("{}", disassembler::disassemble_chunk(&chunk, input.name()));
    let res = interpreter.interpret_chunk(&chunk);
    report(&res, input);
    res.exit_code()
}

fn repl(interpreter: &mut Interpreter, options: &Options) -> i32 {
    let mut reader = match line_reader::LineReader::new(".stackvm_history", ">>> ") {
        Ok(reader) => reader,
        Err(err) => {
            error!(%err, "could not start line editor");
            return EXIT_USAGE;
        }
    };

    println!(
        "===================================================\n\
         Welcome to stackvm {}! Press Ctrl-D to exit.\n\
         ===================================================",
        env!("CARGO_PKG_VERSION")
    );

    loop {
        match reader.readline() {
            line_reader::LineReadStatus::Line(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let input = Input::new(Source::Repl, line);
                let code = run_input(interpreter, &input, options);
                interpreter.take_output();
                debug!(code, "repl line finished");
            }
            line_reader::LineReadStatus::Done => return 0,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error_formatting::format_config_error(&err);
            process::exit(EXIT_USAGE);
        }
    };

    init_logging(config.trace_execution);

    if let Err(err) = ctrlc::set_handler(|| {
        process::exit(EXIT_INTERRUPTED);
    }) {
        error!(%err, "could not install Ctrl-C handler");
    }

    let options = Options {
        disassemble: cli.disassemble,
        dump_chunk: cli.dump_chunk,
    };

    let input = if let Some(literal) = cli.literal {
        Some(Input::new(Source::Literal, literal))
    } else if let Some(path) = cli.input {
        match fs::read_to_string(&path) {
            Ok(content) => Some(Input::new(
                Source::File(path.display().to_string()),
                content,
            )),
            Err(err) => {
                eprintln!("stackvm: could not read {}: {}", path.display(), err);
                process::exit(EXIT_NOINPUT);
            }
        }
    } else {
        None
    };

    let mut interpreter = Interpreter::new(config);
    interpreter.init();

    let code = match input {
        Some(input) => run_input(&mut interpreter, &input, &options),
        None => repl(&mut interpreter, &options),
    };

    interpreter.teardown();
    process::exit(code);
}
