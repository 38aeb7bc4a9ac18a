use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{Layer, Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hello_lang::bytecode::disasm::render_script;
use hello_lang::frontend::{Lexer, TokenDumper};
use hello_lang::{Compiler, CompilerOptions};

/// Compile Hello source into stack-machine script text
#[derive(Parser, Debug)]
#[command(name = "helloc", version, long_about = None)]
struct Cli {
    /// Source file, `-` reads standard input
    #[arg(value_name = "FILE")]
    input: String,

    /// Where to write the script text. Defaults to <FILE>.script, or stdout
    /// when reading standard input
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Elide redundant alt-stack transfers
    #[arg(short = 'O', long)]
    optimize: bool,

    /// Compile Assert(..) statements
    #[arg(long)]
    asserts: bool,

    /// Interleave the source of each statement as comments
    #[arg(long)]
    annotate: bool,

    /// Evaluate the compiled script after writing it
    #[arg(long)]
    run: bool,

    /// Print the token stream and stop
    #[arg(long)]
    tokens: bool,

    #[arg(long)]
    no_color: bool,

    /// Also write the compiled script as a binary artifact
    #[arg(long, value_name = "FILE")]
    emit_bin: Option<PathBuf>,

    /// -v for debug logging, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = read_source(&cli.input)?;

    if cli.tokens {
        return dump_tokens(&source, cli.no_color);
    }

    let options = CompilerOptions::empty()
        .with(CompilerOptions::OPTIMIZER_ENABLED, cli.optimize)
        .with(CompilerOptions::ASSERTS_ENABLED, cli.asserts)
        .with(CompilerOptions::OUTPUT_ANNOTATED_SCRIPT, cli.annotate);
    let mut compiler = Compiler::new().with_options(options);

    let script = compiler
        .compile(&source)
        .with_context(|| format!("Failed to compile '{}'", cli.input))?;

    let text = match &script.annotated {
        Some(annotated) => annotated.clone(),
        None => render_script(&script.instructions, compiler.opcode_names()),
    };

    match output_path(&cli) {
        Some(path) => {
            fs::write(&path, &text)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            tracing::info!(
                instructions = script.len(),
                "wrote {}",
                path.display()
            );
        }
        None => print!("{}", text),
    }

    if let Some(path) = &cli.emit_bin {
        let bytes = script.to_bytes().context("Failed to serialize script")?;
        fs::write(path, bytes).with_context(|| format!("Failed to write '{}'", path.display()))?;
    }

    if cli.run {
        let result = compiler.run(&script);
        if !result.success {
            bail!("{}", result.description);
        }
        eprintln!("{}", result.description);
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .compact()
        .with_filter(level);

    Registry::default().with(layer).init();
}

fn read_source(input: &str) -> Result<String> {
    if input == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read standard input")?;
        return Ok(source);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read '{}'", input))
}

fn output_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(path) = &cli.output {
        return Some(path.clone());
    }
    if cli.input == "-" {
        return None;
    }
    Some(Path::new(&cli.input).with_extension("script"))
}

fn dump_tokens(source: &str, no_color: bool) -> Result<()> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut dumper = TokenDumper::new();
    if no_color {
        dumper = dumper.no_color();
    }
    dumper.dump(&tokens);
    Ok(())
}
