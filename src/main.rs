use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use docquery::{
   config::Config,
   types::{ExportFormat, Language, SortOrder},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "docquery", version, about = "Natural-language document search")]
struct Cli {
   /// Extra TOML config layered over ~/.docquery/config.toml
   #[arg(long, global = true, env = "DOCQUERY_CONFIG")]
   config: Option<PathBuf>,

   /// Override the search backend base URL
   #[arg(long, global = true, env = "DOCQUERY_BASE_URL")]
   base_url: Option<String>,

   #[arg(short, long, global = true)]
   verbose: bool,

   #[command(subcommand)]
   command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
   /// Classify a query and show the extracted entities
   Analyze {
      query: String,

      #[arg(short, long, value_enum)]
      lang: Option<LangArg>,

      /// JSON user context enabling history and department suggestions
      #[arg(short, long)]
      user: Option<PathBuf>,

      #[arg(long)]
      json: bool,
   },

   /// Search the document index
   Search(SearchArgs),

   /// Autocomplete suggestions for a prefix
   Suggest {
      prefix: String,

      #[arg(short = 't', long = "type")]
      types: Vec<String>,

      #[arg(short, long)]
      limit: Option<usize>,
   },

   /// Export matching results in a server-rendered format
   Export {
      query: String,

      #[arg(short, long, value_enum, default_value = "csv")]
      format: FormatArg,

      #[arg(short, long = "out")]
      out: PathBuf,

      #[arg(long)]
      content: bool,

      #[arg(long)]
      metadata: bool,

      #[arg(long = "field")]
      fields: Vec<String>,
   },

   /// Index one or more documents from a JSON file
   Index {
      file: PathBuf,
   },

   /// Remove a document from the index
   Remove {
      id: String,
   },

   /// Start a reindex job
   Reindex {
      ids: Vec<String>,
   },

   /// Show index health
   Status,

   /// Print the effective configuration
   Config,
}

#[derive(Args)]
struct SearchArgs {
   query: String,

   #[arg(short, long, default_value_t = 1)]
   page: usize,

   #[arg(short = 'n', long = "size")]
   page_size: Option<usize>,

   #[arg(short, long, value_enum, default_value = "relevance")]
   sort: SortArg,

   #[arg(short = 't', long = "type")]
   types: Vec<String>,

   #[arg(short, long = "author")]
   authors: Vec<String>,

   #[arg(long)]
   from: Option<String>,

   #[arg(long)]
   to: Option<String>,

   /// Metadata filter as key=value
   #[arg(short, long = "meta", value_parser = parse_key_value)]
   metadata: Vec<(String, String)>,

   /// Derive filters from the entities found in the query
   #[arg(short, long)]
   interpret: bool,

   #[arg(long)]
   json: bool,

   #[arg(long)]
   plain: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LangArg {
   En,
   Ar,
}

impl From<LangArg> for Language {
   fn from(lang: LangArg) -> Self {
      match lang {
         LangArg::En => Self::En,
         LangArg::Ar => Self::Ar,
      }
   }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
   Relevance,
   Date,
   Title,
   Author,
}

impl From<SortArg> for SortOrder {
   fn from(sort: SortArg) -> Self {
      match sort {
         SortArg::Relevance => Self::Relevance,
         SortArg::Date => Self::Date,
         SortArg::Title => Self::Title,
         SortArg::Author => Self::Author,
      }
   }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
   Csv,
   Json,
   Xlsx,
   Pdf,
}

impl From<FormatArg> for ExportFormat {
   fn from(format: FormatArg) -> Self {
      match format {
         FormatArg::Csv => Self::Csv,
         FormatArg::Json => Self::Json,
         FormatArg::Xlsx => Self::Xlsx,
         FormatArg::Pdf => Self::Pdf,
      }
   }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
   match raw.split_once('=') {
      Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
      _ => Err(format!("expected key=value, got '{raw}'")),
   }
}

fn init_tracing(verbose: bool) {
   let default = if verbose { "docquery=debug" } else { "docquery=warn" };
   tracing_subscriber::registry()
      .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
      .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
      .init();
}

#[tokio::main]
async fn main() -> Result<()> {
   let cli = Cli::parse();
   init_tracing(cli.verbose);

   let mut config = Config::load(cli.config.as_deref())?;
   if let Some(base_url) = cli.base_url {
      config.search.base_url = base_url;
   }

   match cli.command {
      Cmd::Analyze { query, lang, user, json } => {
         commands::analyze::execute(&query, lang.map(Language::from), user.as_deref(), json)
      },
      Cmd::Search(args) => {
         let options = commands::search::SearchOptions {
            page:      args.page,
            page_size: args.page_size.unwrap_or(config.search.default_page_size),
            sort:      args.sort.into(),
            types:     args.types,
            authors:   args.authors,
            from:      args.from,
            to:        args.to,
            metadata:  args.metadata.into_iter().collect(),
            interpret: args.interpret,
            json:      args.json,
            plain:     args.plain,
         };
         commands::search::execute(&config, &args.query, options).await
      },
      Cmd::Suggest { prefix, types, limit } => {
         commands::search::suggest(&config, &prefix, &types, limit).await
      },
      Cmd::Export { query, format, out, content, metadata, fields } => {
         let options = docquery::types::ExportOptions {
            format:           format.into(),
            include_content:  content,
            include_metadata: metadata,
            selected_fields:  fields,
         };
         commands::search::export(&config, &query, &options, &out).await
      },
      Cmd::Index { file } => commands::index::execute(&config, &file).await,
      Cmd::Remove { id } => commands::index::remove(&config, &id).await,
      Cmd::Reindex { ids } => commands::index::reindex(&config, &ids).await,
      Cmd::Status => commands::status::execute(&config).await,
      Cmd::Config => commands::config::execute(&config),
   }
}
