mod config;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use giveaway_core::{
    draw_winner, rank, tally, total_entries, CoreError, ErrorExt, TallyOptions,
};
use instagram_client::{ClientConfig, InstagramClient};

use crate::config::{AppConfig, AuthOverrides, EnvConfig, FileConfig};

/// Compute participants, probabilities and winners for a Jorbites Instagram
/// giveaway by parsing recipe links in post comments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (default: giveaway.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    auth: AuthArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct AuthArgs {
    /// Path to the session file to load/save (or IG_SESSION_FILE)
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Instagram login username, used when no valid session exists (or IG_USERNAME)
    #[arg(long)]
    login_username: Option<String>,

    /// Instagram login password, used when no valid session exists (or IG_PASSWORD)
    #[arg(long)]
    login_password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch comments, tally entries and print/export the probability table
    Tally {
        /// Instagram post URL of the giveaway (e.g. https://www.instagram.com/p/SHORTCODE/)
        #[arg(long)]
        post_url: String,

        /// Count only unique recipe IDs per user across all comments
        #[arg(long)]
        dedupe_recipes_per_user: bool,

        /// Count every recipe link in a comment as an entry
        /// (ignored with --dedupe-recipes-per-user)
        #[arg(long)]
        count_multiple_links_per_comment: bool,

        /// Path to write the CSV summary
        #[arg(long, default_value = "participants.csv")]
        out_csv: PathBuf,

        /// Path to write the JSON details
        #[arg(long, default_value = "participants.json")]
        out_json: PathBuf,
    },
    /// Fetch comments and draw a weighted random winner (one entry per valid comment)
    Draw {
        /// Instagram post URL of the giveaway
        #[arg(long)]
        post_url: String,

        /// RNG seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.log_error();
            eprintln!("Error: {}", e.user_friendly_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let app_config = load_config(&cli)?;
    let client = InstagramClient::new(client_config(&app_config));

    match cli.command {
        Command::Tally {
            post_url,
            dedupe_recipes_per_user,
            count_multiple_links_per_comment,
            out_csv,
            out_json,
        } => {
            let (shortcode, comments) = client.fetch_giveaway_comments(&post_url).await?;
            let options = TallyOptions {
                dedupe_recipes_per_user,
                count_multiple_links_per_comment,
            };
            let participants = tally(&comments, options);
            let results = rank(&participants);

            println!(
                "Post: https://www.instagram.com/p/{}/  | Total valid entries: {}",
                shortcode,
                total_entries(&participants)
            );
            println!();
            print!("{}", output::render_table(&results));
            println!();

            output::write_csv(&out_csv, &results, &participants)?;
            output::write_json(&out_json, &results, &participants)?;
            println!("Wrote CSV: {}", out_csv.display());
            println!("Wrote JSON: {}", out_json.display());
        }
        Command::Draw { post_url, seed } => {
            let (_, comments) = client.fetch_giveaway_comments(&post_url).await?;
            let participants = tally(&comments, TallyOptions::default());

            let mut rng = match seed {
                Some(seed) => fastrand::Rng::with_seed(seed),
                None => fastrand::Rng::new(),
            };
            match draw_winner(&participants, &mut rng) {
                Some(outcome) => {
                    println!();
                    print!("{}", output::render_winner_box(&outcome));
                    println!();
                }
                None => println!("No eligible participants found."),
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig, CoreError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path, true)?,
        None => FileConfig::load(Path::new("giveaway.toml"), false)?,
    };
    let flags = AuthOverrides {
        login_username: cli.auth.login_username.clone(),
        login_password: cli.auth.login_password.clone(),
        session_file: cli.auth.session_file.clone(),
    };
    Ok(AppConfig::resolve(file, EnvConfig::capture(), flags))
}

fn client_config(app_config: &AppConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new(app_config.session_file.clone());
    client_config.login_username = app_config.login_username.clone();
    client_config.login_password = app_config.login_password.clone();
    if let Some(user_agent) = &app_config.user_agent {
        client_config.user_agent = user_agent.clone();
    }
    client_config
}
