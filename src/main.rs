use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dentifrice::api::{Dentifrice, ExchangeMode, FileTokenStore};
use dentifrice::clock::model::format_reading;
use dentifrice::clock::{Clock, ClockEditor, Count, FormField, Preview};
use dentifrice::config::{ClientConfig, DEFAULT_TIMEOUT_MS, DEFAULT_TOKEN_PATH};
use dentifrice::notify::ConsoleNotifier;
use dentifrice::session::Session;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCount {
    Up,
    Down,
}

impl From<CliCount> for Count {
    fn from(value: CliCount) -> Self {
        match value {
            CliCount::Up => Count::Up,
            CliCount::Down => Count::Down,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dentifrice",
    version,
    about = "Create and list count-up/count-down clocks on a Dentifrice service"
)]
struct Cli {
    #[arg(long, env = "DENTIFRICE_BASE_URL", global = true)]
    base_url: Option<String>,

    #[arg(long, default_value = DEFAULT_TOKEN_PATH, global = true)]
    tokens: PathBuf,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange an OAuth authorization code for tokens.
    Login {
        #[arg(long)]
        code: String,
    },
    /// Exchange the stored refresh token for a new token pair.
    Refresh,
    /// Print every stored clock with its current reading.
    List,
    /// Validate a new clock and send it to the service.
    Create(CreateArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    start_date: Option<String>,

    #[arg(long)]
    start_time: Option<String>,

    #[arg(long)]
    end_date: Option<String>,

    #[arg(long)]
    end_time: Option<String>,

    #[arg(long, value_enum, default_value_t = CliCount::Down)]
    count: CliCount,

    /// Set an editor input by name (name, startdate, starttime, enddate,
    /// endtime, count). Applied after the other flags.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    set: Vec<(FormField, String)>,

    /// Only show the preview; do not contact the service.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Login { code } => {
            let client = connect(&cli)?;
            client
                .exchange_code(code, ExchangeMode::Code)
                .context("login failed")?;
            println!("Logged in; tokens saved to {}", cli.tokens.display());
        }
        Command::Refresh => {
            let client = connect(&cli)?;
            let tokens = client.tokens();
            let Some(refresh) = tokens.refresh() else {
                bail!(
                    "no refresh token in {}; run `dentifrice login` first",
                    cli.tokens.display()
                );
            };
            client
                .exchange_code(refresh, ExchangeMode::Refresh)
                .context("token refresh failed")?;
            println!("Tokens refreshed");
        }
        Command::List => {
            let session = Session::new(Arc::new(connect(&cli)?));
            let clocks = session
                .load_clocks()
                .wait()
                .flatten()
                .ok_or_else(|| anyhow!("clock list unavailable"))?;
            if clocks.is_empty() {
                println!("No clocks yet");
            }
            for clock in &clocks {
                println!("{}", describe(clock));
            }
        }
        Command::Create(args) => {
            let editor = fill_editor(args);
            match editor.preview() {
                Preview::Error(message) => bail!("{message}"),
                Preview::Clock(clock) => println!("{}", describe(clock)),
            }
            if args.dry_run {
                return Ok(());
            }

            let session = Session::new(Arc::new(connect(&cli)?));
            session
                .submit(&editor)?
                .wait()
                .ok_or_else(|| anyhow!("clock creation was cancelled"))?
                .context("failed to create clock")?;
            println!("Created clock '{}'", editor.clock().name);
        }
    }
    Ok(())
}

fn connect(cli: &Cli) -> Result<Dentifrice> {
    let Some(base_url) = cli.base_url.as_deref() else {
        bail!("--base-url (or DENTIFRICE_BASE_URL) is required for this command");
    };
    let config = ClientConfig::new(base_url, cli.tokens.clone(), cli.timeout_ms)?;
    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    Dentifrice::new(config, store, Arc::new(ConsoleNotifier))
        .context("failed to set up the Dentifrice client")
}

fn fill_editor(args: &CreateArgs) -> ClockEditor<Local> {
    let mut editor = ClockEditor::new(Local, None, Utc::now());
    let inputs = [
        (FormField::Name, args.name.as_deref()),
        (FormField::StartDate, args.start_date.as_deref()),
        (FormField::StartTime, args.start_time.as_deref()),
        (FormField::EndDate, args.end_date.as_deref()),
        (FormField::EndTime, args.end_time.as_deref()),
        (FormField::Count, Some(Count::from(args.count).as_token())),
    ];
    for (field, value) in inputs {
        if let Some(value) = value {
            editor.set_field(field, value);
        }
    }
    for (field, value) in &args.set {
        editor.set_field(*field, value);
    }
    editor
}

fn parse_assignment(input: &str) -> Result<(FormField, String), String> {
    let (field, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{input}'"))?;
    let field = field
        .trim()
        .parse::<FormField>()
        .map_err(|err| err.to_string())?;
    Ok((field, value.to_string()))
}

fn describe(clock: &Clock) -> String {
    let reading = clock
        .reading(Utc::now())
        .map(format_reading)
        .unwrap_or_else(|| "--:--:--".to_string());
    let boundary = match (clock.count, clock.start, clock.end) {
        (Count::Up, Some(start), _) => format!("since {}", local_minute(start)),
        (Count::Down, _, Some(end)) => format!("until {}", local_minute(end)),
        _ => String::new(),
    };
    format!("{}  [{}]  {boundary}  {reading}", clock.name, clock.count)
}

fn local_minute(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
