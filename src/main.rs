use std::io::{self, Read};

use clap::{Parser as ClapParser, Subcommand};
use qmacro::MacroKind;
use qmacro::cli::{self, CheckMode, CheckOptions, CheckResult, CliError};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "qmacro")]
#[command(about = "qmacro - check, format and evaluate mail client macros")]
#[command(version)]
struct Cli {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct MacroArgs {
    /// The macro text
    source: String,

    /// Macro kind (color, column, filter, header, message, rule,
    /// syncfilter, template, search); all kinds if omitted
    #[arg(short, long)]
    kind: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate macro syntax
    Check {
        #[command(flatten)]
        args: MacroArgs,
    },

    /// Print the canonical form of a macro
    Format {
        #[command(flatten)]
        args: MacroArgs,
    },

    /// Evaluate a macro
    Eval {
        #[command(flatten)]
        args: MacroArgs,

        /// Message JSON (reads from stdin if piped)
        #[arg(short, long)]
        message: Option<String>,

        /// Global variable, NAME=VALUE (repeatable)
        #[arg(long = "var")]
        variables: Vec<String>,

        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        folder: Option<String>,

        /// Allow the macro to change message flags
        #[arg(long)]
        modify: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show the structured conditions of a macro
    Conditions {
        #[command(flatten)]
        args: MacroArgs,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List built-in functions and constants
    Functions,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { args } => run(args, CheckMode::Syntax, Vec::new(), false, |o| o),
        Commands::Format { args } => run(args, CheckMode::Format, Vec::new(), false, |o| o),
        Commands::Conditions { args, pretty } => {
            run(args, CheckMode::Conditions, Vec::new(), pretty, |o| o)
        }
        Commands::Eval {
            args,
            message,
            variables,
            account,
            folder,
            modify,
            pretty,
        } => run(args, CheckMode::Eval, variables, pretty, move |mut o| {
            o.message = message;
            o.account = account;
            o.folder = folder;
            o.modify = modify;
            o
        }),
        Commands::Functions => {
            print!("{}", cli::functions_listing());
            println!();
            print!("{}", cli::constants_listing());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(
    args: MacroArgs,
    mode: CheckMode,
    variables: Vec<String>,
    pretty: bool,
    configure: impl FnOnce(CheckOptions) -> CheckOptions,
) -> Result<(), CliError> {
    let kind = match args.kind {
        Some(name) => MacroKind::from_name_ignore_case(&name).ok_or(CliError::UnknownKind(name))?,
        None => MacroKind::all(),
    };
    let variables = variables
        .iter()
        .map(|v| cli::parse_assignment(v))
        .collect::<Result<Vec<_>, _>>()?;

    let mut options = configure(CheckOptions {
        source: args.source,
        kind,
        mode,
        variables,
        ..CheckOptions::default()
    });
    if mode == CheckMode::Eval && options.message.is_none() && !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        if !buffer.trim().is_empty() {
            options.message = Some(buffer);
        }
    }

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Formatted(text) => println!("{}", text),
        CheckResult::Value(json) | CheckResult::Conditions(json) => {
            let text = if pretty {
                serde_json::to_string_pretty(&json)?
            } else {
                serde_json::to_string(&json)?
            };
            println!("{}", text);
        }
        CheckResult::NotRepresentable => println!("Not representable as conditions"),
    }
    Ok(())
}
