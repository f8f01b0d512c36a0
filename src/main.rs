use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use family_tree::config::AppConfig;
use family_tree::models::RegisterInput;
use family_tree::tree::{render_view, ExpansionState, TracingLogger, TreeView};
use family_tree::{api, db};

#[derive(Parser)]
#[command(name = "famtree")]
#[command(about = "Family tree server and tools")]
struct Cli {
    /// SQLite database file (overrides config and FAMTREE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the family tree
    Tree {
        /// Individual ids to show collapsed
        #[arg(long = "collapse", value_name = "ID")]
        collapsed: Vec<i64>,
    },
    /// Create an approved administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "family_tree=debug,tower_http=debug".into()),
    );

    // Logs go to stderr so `famtree tree` output stays clean on stdout
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &AppConfig) -> anyhow::Result<db::Database> {
    let database = match &config.database_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    database.migrate()?;
    Ok(database)
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let database = open_database(&config)?;
    let addr = format!("{}:{}", config.bind_address, config.port);

    tracing::info!("Starting family tree server on {}", addr);
    let app = api::create_router(database, config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Family tree server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = AppConfig::load();
    if let Some(path) = cli.db {
        config.database_path = Some(path);
    }

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await?;
        }
        Some(Commands::Tree { collapsed }) => {
            let database = open_database(&config)?;

            let mut expansion = ExpansionState::new();
            for id in collapsed {
                expansion.collapse(id);
            }

            let mut view = TreeView::new(Arc::new(TracingLogger)).with_expansion(expansion);
            view.load(&database)?;
            print!("{}", render_view(&view));
        }
        Some(Commands::CreateAdmin {
            email,
            name,
            password,
        }) => {
            let database = open_database(&config)?;
            let user = database.create_admin(RegisterInput {
                email,
                name,
                password,
            })?;
            println!("Created administrator {} ({})", user.email, user.id);
        }
        None => serve(config).await?,
    }

    Ok(())
}
