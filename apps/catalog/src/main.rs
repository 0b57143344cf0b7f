use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    CarApi, CarForm, CatalogSession, HttpCarApi, QueryState, ResultState, SessionOptions,
};
use shared::domain::{CarId, SortPreset};
use storage::SqliteStore;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod shell;

use config::{load_settings, normalize_cache_url, Settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "catalog", about = "Browse and manage the car catalog")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides `api_url` from the config file and environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    cache_url: Option<String>,
    #[arg(long)]
    search_debounce_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List cars matching the given filters.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "type")]
        car_type: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_enum, default_value_t = SortArg::NameAsc)]
        sort: SortArg,
    },
    Show {
        id: i64,
    },
    Types,
    Tags,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        image_url: String,
        #[arg(long = "type")]
        car_type: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Restore the server's seed data.
    Reset,
    /// Interactive session with debounced search.
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SortArg {
    NameAsc,
    NameDesc,
    Newest,
    Oldest,
}

impl From<SortArg> for SortPreset {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::NameAsc => SortPreset::NameAscending,
            SortArg::NameDesc => SortPreset::NameDescending,
            SortArg::Newest => SortPreset::NewestFirst,
            SortArg::Oldest => SortPreset::OldestFirst,
        }
    }
}

impl From<SortPreset> for SortArg {
    fn from(preset: SortPreset) -> Self {
        match preset {
            SortPreset::NameAscending => SortArg::NameAsc,
            SortPreset::NameDescending => SortArg::NameDesc,
            SortPreset::NewestFirst => SortArg::Newest,
            SortPreset::OldestFirst => SortArg::Oldest,
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(&cli.config)?;
    if let Some(v) = &cli.api_url {
        settings.api_url = v.clone();
    }
    if let Some(v) = &cli.cache_url {
        settings.cache_url = v.clone();
    }
    if let Some(v) = cli.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    settings.cache_url = normalize_cache_url(&settings.cache_url);
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let api = Arc::new(HttpCarApi::new(&settings.api_url)?);
    info!(api_url = %api.base_url(), "catalog: using api");

    match cli.command {
        Command::List {
            search,
            car_type,
            tags,
            sort,
        } => {
            let options = SortPreset::from(sort).options();
            let query = QueryState::default()
                .with_search(search.unwrap_or_default())
                .with_type_and_tags(car_type, tags)
                .with_sort(options.sort_by, options.sort_order);
            let items = api.list_cars(&query.to_list_query()).await?;
            let results = ResultState {
                items,
                status: client_core::FetchStatus::Ready,
                error_message: None,
            };
            println!("{}", shell::render_results(&results));
        }
        Command::Show { id } => {
            let car = api.get_car(CarId(id)).await?;
            println!("{}", shell::render_car(&car));
        }
        Command::Types => {
            for car_type in api.car_types().await? {
                println!("{car_type}");
            }
        }
        Command::Tags => {
            for tag in api.car_tags().await? {
                println!("{tag}");
            }
        }
        Command::Add {
            name,
            description,
            image_url,
            car_type,
            tags,
        } => {
            let form = CarForm {
                name,
                description,
                image_url,
                car_type,
                tags,
            };
            let new_car = match form.validate() {
                Ok(new_car) => new_car,
                Err(errors) => {
                    for (field, message) in errors.iter() {
                        eprintln!("{}: {message}", field.as_str());
                    }
                    bail!("car not created: {errors}");
                }
            };
            let created = api.create_car(&new_car).await?;
            println!("created #{} {}", created.id, created.name);
        }
        Command::Delete { id, yes } => {
            let car = api.get_car(CarId(id)).await?;
            if !yes && !confirm(&format!("Delete {} ?", car.name)).await? {
                println!("cancelled");
                return Ok(());
            }
            api.delete_car(car.id).await?;
            println!("deleted #{}", car.id);
        }
        Command::Reset => {
            api.reset_catalog().await?;
            println!("catalog reset");
        }
        Command::Shell => {
            let store = SqliteStore::new(&settings.cache_url)
                .await
                .with_context(|| format!("failed to open options cache '{}'", settings.cache_url))?;
            let session = CatalogSession::new_with_options(
                api,
                Arc::new(store),
                SessionOptions {
                    search_debounce: settings.search_debounce(),
                    ..SessionOptions::default()
                },
            );
            shell::run(session).await?;
        }
    }

    Ok(())
}

async fn confirm(prompt: &str) -> Result<bool> {
    println!("{prompt} [y/N]");
    let mut line = String::new();
    BufReader::new(io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
