//! textly — types marked-up text into the terminal one character at a time.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};

use textly::cancel::{cancel_pair, CancelToken};
use textly::config::{self, parse_duration, Config};
use textly::dsl::decorator::RESET;
use textly::dsl::{pipeline, Compiler, Program};
use textly::vm::Runner;
use textly::Error;

/// Typewriter-style text playback
#[derive(Parser)]
#[command(name = "textly", version)]
#[command(about = "Type out marked-up text like a typewriter")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand)]
enum Command {
    /// Compile and play a source file (`-` reads stdin)
    Run { file: PathBuf },
    /// Print the token stream
    Tokens { file: PathBuf },
    /// Print the compiled instructions
    Dump {
        file: PathBuf,
        /// Emit a replayable YAML program instead of the listing
        #[arg(long)]
        yaml: bool,
    },
    /// Play a program written by `dump --yaml`
    Replay { program: PathBuf },
}

#[derive(Args)]
struct Options {
    /// Pause after each character (e.g. 50ms, 0.2s)
    #[arg(long, global = true, value_parser = parse_duration)]
    delay: Option<Duration>,

    /// Length of one `{.}` beat
    #[arg(long, global = true, value_parser = parse_duration)]
    beat: Option<Duration>,

    /// One word per line
    #[arg(short, long, global = true)]
    list: bool,

    /// Merge adjacent instructions before playing
    #[arg(short = 'O', long, global = true)]
    optimize: bool,

    /// Apply deletions ahead of time (implies --optimize)
    #[arg(long, global = true)]
    flatten: bool,

    /// Config file [default: ~/.textly/config.yaml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Give up after this long
    #[arg(long, global = true, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Log level
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

impl Options {
    fn apply(&self, config: &mut Config) {
        if let Some(delay) = self.delay {
            config.delay = millis(delay);
        }
        if let Some(beat) = self.beat {
            config.beat = millis(beat);
        }
        config.list |= self.list;
        config.optimize |= self.optimize;
        config.flatten |= self.flatten;
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.options.log_level.as_str())
        .with_writer(io::stderr)
        .init();

    let (canceller, token) = cancel_pair();
    if let Err(e) = ctrlc::set_handler(move || canceller.cancel()) {
        warn!("could not install Ctrl+C handler: {e}");
    }
    let token = match cli.options.timeout {
        Some(timeout) => token.with_timeout(timeout),
        None => token,
    };

    match execute(cli, &token) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            // Playback may stop inside a colored span; dumps stay byte-exact.
            if e.is_interrupted_playback() {
                let mut stdout = io::stdout();
                let _ = stdout.write_all(RESET.as_bytes());
                let _ = stdout.flush();
            }
            eprintln!("\ncancelled");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli, cancel: &CancelToken) -> Result<(), Error> {
    let path = cli
        .options
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&path)?;
    cli.options.apply(&mut config);
    debug!(?config, path = %path.display(), "effective configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Run { file } => {
            let program = Compiler::new(config.compile_options()).compile(open(&file)?, cancel)?;
            info!(instructions = program.len(), "compiled");
            Runner::new(config.run_options()).run(&program, &mut out, cancel)?;
        }
        Command::Tokens { file } => pipeline::dump_tokens(open(&file)?, &mut out, cancel)?,
        Command::Dump { file, yaml } => {
            let program = Compiler::new(config.compile_options()).compile(open(&file)?, cancel)?;
            if yaml {
                out.write_all(program.to_yaml()?.as_bytes())?;
            } else {
                program.dump(&mut out)?;
            }
        }
        Command::Replay { program } => {
            let mut source = String::new();
            open(&program)?.read_to_string(&mut source)?;
            let mut program = Program::from_yaml(&source)?;
            if let Some(options) = config.compile_options().optimize {
                program.optimize(options)?;
            }
            info!(instructions = program.len(), "loaded program");
            Runner::new(config.run_options()).run(&program, &mut out, cancel)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Open `path` for reading; `-` is stdin.
fn open(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin()));
    }
    Ok(Box::new(File::open(path)?))
}
