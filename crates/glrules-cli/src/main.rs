mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use glrules_core::classify::MatchedByPolicy;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "glrules",
    version,
    about = "Classify card transactions into GL accounts from an authored rule table"
)]
struct Cli {
    /// Log rule evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where rules and budget mappings come from.
#[derive(clap::Args)]
pub struct SourceArgs {
    /// Rule file (.csv, .xlsx or compiled .json). Default: embedded sample rules
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Budget label → account map (JSON). Default: embedded map
    #[arg(short, long, value_name = "FILE")]
    budget_map: Option<PathBuf>,

    /// How matched_by is reported for the winning rule
    #[arg(long, value_enum, default_value = "conditions")]
    matched_by: PolicyArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Conditions,
    Notes,
}

impl From<PolicyArg> for MatchedByPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Conditions => MatchedByPolicy::Conditions,
            PolicyArg::Notes => MatchedByPolicy::Notes,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single transaction
    Classify {
        #[command(flatten)]
        source: SourceArgs,

        /// Evaluation request as a JSON file (mcc, merchant, amount, ...).
        /// Field flags override values from the file
        #[arg(long, value_name = "FILE")]
        request: Option<PathBuf>,

        /// Merchant category code
        #[arg(long)]
        mcc: Option<String>,

        /// Merchant name as printed on the statement
        #[arg(long)]
        merchant: Option<String>,

        /// Transaction amount
        #[arg(long)]
        amount: Option<String>,

        /// Cardholder team
        #[arg(long)]
        team: Option<String>,

        /// Cardholder email
        #[arg(long)]
        email: Option<String>,

        /// State match flag
        #[arg(long)]
        state: Option<String>,

        /// Budget the transaction was charged to, for the discrepancy check
        #[arg(long, value_name = "LABEL")]
        budget: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Classify a JSON array of transactions
    Batch {
        /// JSON file with [{"transaction": {...}, "employee": {...}, "budget_label": "..."}].
        /// `billcom_budget` is accepted for the budget label
        input_file: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Compile an authoring sheet (.csv or .xlsx) into a decision document
    Compile {
        /// Path to the rule sheet
        input_file: PathBuf,

        /// Write the document to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Inspect rule tables
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// List the rules of a table in evaluation order
    Show {
        /// Rule file (default: embedded sample rules)
        file: Option<PathBuf>,
    },
    /// Validate a rule file
    Validate {
        /// Path to the rule file
        file: PathBuf,
    },
    /// Print the authoring column reference
    Schema,
    /// Print the embedded sample rule sheet as CSV
    Sample,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Classify {
            source,
            request,
            mcc,
            merchant,
            amount,
            team,
            email,
            state,
            budget,
            output,
        } => {
            let fields = commands::classify::RequestFields {
                mcc,
                merchant,
                amount,
                team,
                email,
                state,
            };
            commands::classify::run(&source, request, fields, budget, &output)
        }
        Commands::Batch {
            input_file,
            source,
            output,
        } => commands::batch::run(input_file, &source, &output),
        Commands::Compile { input_file, out } => commands::compile::run(input_file, out),
        Commands::Rules { action } => match action {
            RulesAction::Show { file } => commands::rules::show(file.as_deref()),
            RulesAction::Validate { file } => commands::rules::validate(&file),
            RulesAction::Schema => commands::rules::schema(),
            RulesAction::Sample => commands::rules::sample(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("glrules_core=debug,glrules=debug")
    } else {
        EnvFilter::new("glrules_core=info,glrules=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
