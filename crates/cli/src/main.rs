use clap::{Parser, Subcommand};
use casebook_core::config::core_config_from_env_values;
use casebook_core::constants::DEFAULT_LATEST_COUNT;
use casebook_core::markdown::decode;
use casebook_core::word_count::word_count;
use casebook_core::{CaseDirectory, CaseId, CaseStore, CaseSummary, StorageEnv, VersionToken};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "casebook")]
#[command(about = "Casebook case store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List cases, newest first
    List {
        /// Show only the most recent N cases
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the most recent cases
    Latest {
        /// How many cases to show
        #[arg(default_value_t = DEFAULT_LATEST_COUNT)]
        count: usize,
    },
    /// Print one case as stored
    Show {
        /// Case id
        id: String,
    },
    /// Import a markdown file with frontmatter as a new case
    Import {
        /// Path to the `.md` file
        file: PathBuf,
    },
    /// Delete a case
    Delete {
        /// Case id
        id: String,
        /// Only delete if the case is still at this version
        #[arg(long)]
        version: Option<String>,
    },
    /// Print the plain-text length of a markdown file's body
    Words {
        /// Path to the markdown file
        file: PathBuf,
    },
}

fn open_store() -> Result<CaseStore, Box<dyn std::error::Error>> {
    let env = StorageEnv::from_lookup(|key| std::env::var(key).ok());
    let cfg = core_config_from_env_values(env)?;
    Ok(CaseStore::from_config(&cfg)?)
}

fn print_cases(cases: &[CaseSummary]) {
    if cases.is_empty() {
        println!("No cases found.");
        return;
    }
    for case in cases {
        println!(
            "{}  {}  {} ({} chars)",
            case.meta.date, case.meta.id, case.meta.title, case.word_count
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("casebook_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List { limit }) => {
            let directory = CaseDirectory::new(open_store()?);
            let cases = match limit {
                Some(n) => directory.latest(n).await?,
                None => directory.list_sorted().await?,
            };
            print_cases(&cases);
        }
        Some(Commands::Latest { count }) => {
            let directory = CaseDirectory::new(open_store()?);
            print_cases(&directory.latest(count).await?);
        }
        Some(Commands::Show { id }) => {
            let store = open_store()?;
            let case = store.get(&CaseId::parse(&id)?).await?;
            println!("id:          {}", case.meta.id);
            println!("title:       {}", case.meta.title);
            println!("description: {}", case.meta.description);
            println!("date:        {}", case.meta.date);
            println!("image:       {}", case.meta.image);
            println!("tags:        {}", case.meta.tags.join(", "));
            if let Some(version) = &case.version {
                println!("version:     {}", version);
            }
            println!();
            println!("{}", case.content);
        }
        Some(Commands::Import { file }) => {
            let raw = std::fs::read_to_string(&file)?;
            let store = open_store()?;
            match store.import(&raw).await {
                Ok(meta) => println!("Imported {} as case {}", file.display(), meta.id),
                Err(e) => eprintln!("Error importing {}: {}", file.display(), e),
            }
        }
        Some(Commands::Delete { id, version }) => {
            let store = open_store()?;
            let id = CaseId::parse(&id)?;
            match store.delete(&id, version.map(VersionToken::new)).await {
                Ok(()) => println!("Deleted case {}", id),
                Err(e) => eprintln!("Error deleting case {}: {}", id, e),
            }
        }
        Some(Commands::Words { file }) => {
            let raw = std::fs::read_to_string(&file)?;
            let document = decode(&raw)?;
            println!("{}", word_count(&document.body));
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}
