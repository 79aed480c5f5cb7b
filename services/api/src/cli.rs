use crate::infra::parse_assignment;
use crate::report::{run_health, run_performance, run_predict, run_schema};
use crate::server;
use clap::{Args, Parser, Subcommand};
use credit_desk::config::DeskConfig;
use credit_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Credit Decision Desk",
    about = "Serve or drive the credit application decision desk from the command line",
    version
)]
struct Cli {
    /// Override the scoring service base URL (CREDIT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the feature schema declared by the scoring service
    Schema,
    /// Fill the form from defaults or a sample and submit it once
    Predict(PredictArgs),
    /// Print the model's offline evaluation figures
    Performance,
    /// Probe the scoring service once
    Health,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PredictArgs {
    /// Start from a random historical application instead of the defaults
    #[arg(long)]
    pub(crate) sample: bool,
    /// Keep the sample's recorded outcome and compare it with the decision
    #[arg(long, requires = "sample")]
    pub(crate) with_label: bool,
    /// Override a field before submitting, e.g. --set age=41
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub(crate) assignments: Vec<(String, String)>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = DeskConfig::load()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config.backend = config.backend.with_base_url(api_url)?;
    }

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Schema => run_schema(&config).await,
        Command::Predict(args) => run_predict(&config, args).await,
        Command::Performance => run_performance(&config).await,
        Command::Health => run_health(&config).await,
    }
}
