use clap::Parser;
use satire_core::{
    Article, ArticleStorage, Error, GenerationOutcome, GenerationRequest, NewArticle, Result,
};
use satire_inference::{create_model, Config, ContentGenerationPipeline, ModelKind};
use satire_storage::StorageKind;
use satire_web::AppState;
use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Satirical rewrites and illustrations for news articles", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "SATIRE_STORAGE", default_value = "sqlite")]
    storage: String,
    #[arg(long, env = "SATIRE_DB_PATH", default_value = satire_storage::DEFAULT_DB_PATH)]
    db_path: PathBuf,
    #[arg(long, env = "SATIRE_MODEL", default_value = "openai", help = "Generation provider. Available models: openai (default), offline")]
    model: String,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "OPENAI_BASE_URL", default_value = satire_inference::DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, env = "SATIRE_CHAT_MODEL", default_value = satire_inference::DEFAULT_CHAT_MODEL)]
    chat_model: String,
    /// HTTP timeout for each provider call (e.g. 30s, 2m)
    #[arg(long, value_parser = humantime::parse_duration)]
    request_timeout: Option<Duration>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the article API
    Serve {
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Submit one article and print the result
    Process {
        /// Article text. Read from --file or stdin when omitted.
        content: Option<String>,
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        source: Option<String>,
    },
    /// List stored articles
    List,
    /// Show one stored article
    Show {
        id: Uuid,
    },
}

impl Cli {
    fn inference_config(&self) -> Result<Config> {
        Ok(Config {
            model: self.model.parse::<ModelKind>()?,
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            chat_model: self.chat_model.clone(),
            request_timeout: self.request_timeout,
        })
    }
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(content) = content {
        return Ok(content);
    }
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn print_article(article: &Article) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(article)?);
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("🛑 Shutdown requested");
    cancel.cancel();
}

async fn process_article(
    storage: &Arc<dyn ArticleStorage>,
    pipeline: &ContentGenerationPipeline,
    input: NewArticle,
) -> Result<()> {
    let article = storage.create_article(&input).await?;
    info!("📰 Processing article {}", article.id);

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));
    let result = pipeline
        .process_article(&GenerationRequest::new(article.content.clone(), cancel))
        .await;

    let Some(outcome) = GenerationOutcome::from_result(&result) else {
        warn!("Generation cancelled, article {} left pending", article.id);
        return Err(Error::Cancelled);
    };
    let article = storage.record_generation(article.id, &outcome).await?;
    print_article(&article)?;

    match result {
        Ok(_) => Ok(()),
        Err(e) if e.partial_summary().is_some() => {
            warn!("⚠️ Summary stored without image: {}", e.chain());
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn run(cli: Cli, storage: &Arc<dyn ArticleStorage>) -> Result<()> {
    match cli.command {
        Commands::Serve { ref host, port } => {
            let config = cli.inference_config()?;
            let provider = create_model(&config)?;
            let pipeline = ContentGenerationPipeline::from_provider(&provider, &config.chat_model);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .map_err(|e| Error::Configuration(format!("Invalid listen address {}:{}: {}", host, port, e)))?;

            let cancel = CancellationToken::new();
            tokio::spawn(shutdown_signal(cancel.clone()));
            satire_web::serve(
                AppState::new(storage.clone(), pipeline),
                addr,
                async move { cancel.cancelled().await },
            )
            .await
        }
        Commands::Process { ref content, ref file, ref title, ref source } => {
            let config = cli.inference_config()?;
            let provider = create_model(&config)?;
            let pipeline = ContentGenerationPipeline::from_provider(&provider, &config.chat_model);
            let input = NewArticle {
                content: read_content(content.clone(), file.clone())?,
                title: title.clone(),
                source: source.clone(),
            };
            process_article(storage, &pipeline, input).await
        }
        Commands::List => {
            for article in storage.list_articles().await? {
                println!(
                    "{}  {:<14}  {}",
                    article.id,
                    article.status.as_str(),
                    article.satirical_summary.as_deref().unwrap_or(&article.title)
                );
            }
            Ok(())
        }
        Commands::Show { id } => {
            let article = storage
                .get_article(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
            print_article(&article)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    // Fail on a bad provider configuration before anything is opened.
    cli.inference_config()?;
    let storage = satire_storage::create_storage(cli.storage.parse::<StorageKind>()?, Some(&cli.db_path)).await?;

    let result = run(cli, &storage).await;
    if let Err(e) = storage.close().await {
        error!("Failed to close storage: {}", e);
    }
    if let Err(e) = &result {
        error!("{}", e.chain());
    }
    result
}
