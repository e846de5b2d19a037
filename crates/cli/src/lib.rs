pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use fleetdesk_client::SignatureParty;
use fleetdesk_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "fleetdesk",
    about = "Fleetdesk rental operations console",
    long_about = "Operate a van rental business from the terminal: fleet, bookings, \
contract signatures, and review of public rental requests.",
    after_help = "Examples:\n  fleetdesk login operator@example.com\n  fleetdesk dashboard\n  fleetdesk rental new --first-name Jan --last-name Novák ... --vehicle 1\n  fleetdesk requests approve 3"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Sign in to the store and persist the operator session")]
    Login {
        #[arg(help = "Operator email")]
        email: String,
        #[arg(long, help = "Password; omit to read FLEETDESK_PASSWORD")]
        password: Option<String>,
    },
    #[command(about = "Sign out and remove the persisted session")]
    Logout,
    #[command(about = "Show fleet, rental and request headline numbers")]
    Dashboard {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Inspect and grow the vehicle fleet")]
    Fleet(FleetCommand),
    #[command(about = "List rentals with customer and vehicle labels")]
    Rentals,
    #[command(subcommand, about = "Create and operate on rental contracts")]
    Rental(RentalCommand),
    #[command(subcommand, about = "Review public rental requests")]
    Requests(RequestCommand),
    #[command(about = "Load the demo dataset through the store gateway")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, session presence, and store reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum FleetCommand {
    #[command(about = "List vehicles with rates and validity dates")]
    List,
    #[command(about = "Add a vehicle to the fleet")]
    Add(FleetAddArgs),
}

#[derive(Debug, Args)]
pub struct FleetAddArgs {
    #[arg(long)]
    pub brand: String,
    #[arg(long = "plate")]
    pub license_plate: String,
    #[arg(long)]
    pub vin: String,
    #[arg(long)]
    pub year: i32,
    #[arg(long, help = "4-hour rate in CZK")]
    pub price_4h: Option<Decimal>,
    #[arg(long, help = "12-hour rate in CZK")]
    pub price_12h: Option<Decimal>,
    #[arg(long, help = "Daily rate in CZK")]
    pub price_day: Option<Decimal>,
    #[arg(long, help = "Monthly rate in CZK")]
    pub price_month: Option<Decimal>,
    #[arg(long, help = "Technical inspection valid until (YYYY-MM-DD)")]
    pub inspection_until: NaiveDate,
    #[arg(long, help = "Insurer and policy number")]
    pub insurance: String,
    #[arg(long, help = "Highway vignette valid until (YYYY-MM-DD)")]
    pub vignette_until: NaiveDate,
}

#[derive(Debug, Subcommand)]
enum RentalCommand {
    #[command(about = "Run the booking steps in one shot and create a rental")]
    New(BookingArgs),
    #[command(about = "Render the contract text for a rental")]
    Show {
        #[arg(help = "Rental id")]
        id: i64,
    },
    #[command(about = "Attach a signature to an existing rental")]
    Sign {
        #[arg(help = "Rental id")]
        id: i64,
        #[arg(long, value_enum)]
        party: Party,
        #[arg(long, help = "Image file with the signature")]
        signature_file: PathBuf,
    },
    #[command(about = "Close a rental out")]
    Complete {
        #[arg(help = "Rental id")]
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct BookingArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long = "id-card")]
    pub id_card_number: String,
    #[arg(long = "license")]
    pub license_number: String,
    #[arg(long, help = "Vehicle id from `fleetdesk fleet list`")]
    pub vehicle: i64,
    #[arg(long, help = "Rental start (RFC 3339, e.g. 2024-06-10T09:00:00Z)")]
    pub start: DateTime<Utc>,
    #[arg(long, help = "Rental end (RFC 3339)")]
    pub end: DateTime<Utc>,
    #[arg(long, help = "Image file with the customer signature")]
    pub signature_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum RequestCommand {
    #[command(about = "List pending rental requests")]
    List,
    #[command(about = "Show a request's submitted fields")]
    Show {
        #[arg(help = "Request id")]
        id: i64,
    },
    #[command(about = "Approve a pending request")]
    Approve {
        #[arg(help = "Request id")]
        id: i64,
    },
    #[command(about = "Reject a pending request")]
    Reject {
        #[arg(help = "Request id")]
        id: i64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Party {
    Customer,
    Company,
}

impl From<Party> for SignatureParty {
    fn from(party: Party) -> Self {
        match party {
            Party::Customer => SignatureParty::Customer,
            Party::Company => SignatureParty::Company,
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Login { email, password } => commands::login::run(&email, password.as_deref()),
        Command::Logout => commands::logout::run(),
        Command::Dashboard { json } => commands::dashboard::run(json),
        Command::Fleet(FleetCommand::List) => commands::fleet::list(),
        Command::Fleet(FleetCommand::Add(args)) => commands::fleet::add(&args),
        Command::Rentals => commands::rentals::list(),
        Command::Rental(RentalCommand::New(args)) => commands::rental::new(&args),
        Command::Rental(RentalCommand::Show { id }) => commands::rental::show(id),
        Command::Rental(RentalCommand::Sign { id, party, signature_file }) => {
            commands::rental::sign(id, party.into(), &signature_file)
        }
        Command::Rental(RentalCommand::Complete { id }) => commands::rental::complete(id),
        Command::Requests(RequestCommand::List) => commands::requests::list(),
        Command::Requests(RequestCommand::Show { id }) => commands::requests::show(id),
        Command::Requests(RequestCommand::Approve { id }) => commands::requests::approve(id),
        Command::Requests(RequestCommand::Reject { id }) => commands::requests::reject(id),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output stays parseable. A config that does
/// not load falls back to the default level and format; the command itself
/// reports the config failure.
fn init_logging() {
    let (level, format) = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => (config.logging.level.clone(), config.logging.format),
        Err(_) => ("info".to_string(), LogFormat::Compact),
    };

    let log_level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
