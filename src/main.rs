use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ncp_core::config::{
    cache_ttl_from_env_value, language_from_env_value, lookup_timeout_from_env_value,
};
use ncp_core::constants::{DEFAULT_CACHE_MAX_ENTRIES, GENERIC_CODED_VALUE};
use ncp_core::{
    parse_document, CatalogueClient, CodedValue, CoreConfig, Diagnostics, DocumentContract,
    DocumentFormat, InMemoryCatalogue, ResolutionEngine, ResolutionPass,
};
use ncp_types::LanguageCode;

#[derive(Parser)]
#[command(name = "ncp-run")]
#[command(about = "NCP terminology translation runner")]
struct Cli {
    /// Catalogue YAML file (overrides NCP_CATALOGUE_PATH)
    #[arg(long, global = true)]
    catalogue: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one coded value
    Lookup {
        /// Concept code
        #[arg(long)]
        code: String,
        /// Code system OID or URI
        #[arg(long)]
        system: String,
        /// Source text carried by the document (optional)
        #[arg(long)]
        text: Option<String>,
        /// Target language (defaults to NCP_DEFAULT_LANGUAGE)
        #[arg(long)]
        language: Option<String>,
        /// Placeholder shown when nothing else resolves
        #[arg(long, default_value = GENERIC_CODED_VALUE)]
        placeholder: String,
        /// Include every language the catalogue holds
        #[arg(long)]
        all: bool,
    },
    /// Resolve every entity of a FHIR document
    Resolve {
        /// Document file (FHIR Bundle or single resource)
        document: PathBuf,
        /// Target language (defaults to NCP_DEFAULT_LANGUAGE)
        #[arg(long)]
        language: Option<String>,
        /// Document format (inferred from the file extension when omitted)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

impl From<Format> for DocumentFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => DocumentFormat::Json,
            Format::Yaml => DocumentFormat::Yaml,
        }
    }
}

/// Main entry point for the NCP runner
///
/// # Environment Variables
/// - `NCP_CATALOGUE_PATH`: catalogue YAML file (default: none, every lookup misses)
/// - `NCP_DEFAULT_LANGUAGE`: display language (default: "en")
/// - `NCP_LOOKUP_TIMEOUT_MS`: bound on one catalogue lookup (default: 2000)
/// - `NCP_CACHE_TTL_SECS`: lifetime of a cached catalogue answer (default: 300)
///
/// Exits with an error only for fatal problems: bad configuration, an unreadable catalogue
/// or a malformed document.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ncp=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let catalogue_path = cli
        .catalogue
        .or_else(|| std::env::var("NCP_CATALOGUE_PATH").ok().map(PathBuf::from));
    let cfg = CoreConfig::new(
        catalogue_path,
        language_from_env_value(std::env::var("NCP_DEFAULT_LANGUAGE").ok())?,
        lookup_timeout_from_env_value(std::env::var("NCP_LOOKUP_TIMEOUT_MS").ok())?,
        cache_ttl_from_env_value(std::env::var("NCP_CACHE_TTL_SECS").ok())?,
        DEFAULT_CACHE_MAX_ENTRIES,
    )?;

    let catalogue = load_catalogue(cfg.catalogue_path())?;
    let client = CatalogueClient::from_config(catalogue, &cfg);

    match cli.command {
        Commands::Lookup {
            code,
            system,
            text,
            language,
            placeholder,
            all,
        } => {
            let language = target_language(language, &cfg)?;
            let engine = ResolutionEngine::new(client).with_all_languages(all);
            let value = CodedValue::new(code, system, text.as_deref());

            let mut diagnostics = Diagnostics::new();
            let term = engine
                .resolve_with_fallback(&value, &language, &placeholder, &mut diagnostics)
                .await;
            diagnostics.emit();

            println!("{}", serde_json::to_string_pretty(&term)?);
        }
        Commands::Resolve {
            document,
            language,
            format,
        } => {
            let language = target_language(language, &cfg)?;
            let format = format
                .map(DocumentFormat::from)
                .unwrap_or_else(|| infer_format(&document));
            let text = std::fs::read_to_string(&document)
                .with_context(|| format!("failed to read {}", document.display()))?;
            let parsed = parse_document(&text, format)?;

            let contract = DocumentContract::for_document_type(parsed.document_type.as_ref());
            tracing::info!(
                contract = contract.name(),
                resources = parsed.len(),
                "resolving {}",
                document.display()
            );

            let pass = ResolutionPass::new(ResolutionEngine::new(client));
            let report = pass.run(&parsed, &contract, &language).await?;
            report.diagnostics.emit();

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_catalogue(path: Option<&Path>) -> anyhow::Result<InMemoryCatalogue> {
    let Some(path) = path else {
        tracing::warn!("no catalogue configured; every lookup will fall back");
        return Ok(InMemoryCatalogue::new());
    };

    let catalogue = InMemoryCatalogue::load(path)
        .with_context(|| format!("failed to load catalogue {}", path.display()))?;
    tracing::info!(entries = catalogue.len(), "loaded catalogue {}", path.display());
    Ok(catalogue)
}

fn target_language(arg: Option<String>, cfg: &CoreConfig) -> anyhow::Result<LanguageCode> {
    match arg {
        Some(tag) => Ok(LanguageCode::parse(tag)?),
        None => Ok(cfg.default_language().clone()),
    }
}

fn infer_format(path: &Path) -> DocumentFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => DocumentFormat::Yaml,
        _ => DocumentFormat::Json,
    }
}
