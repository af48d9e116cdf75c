//! CLI binary for flashgen.
//!
//! A thin shim over the library crate: `serve` runs the HTTP server,
//! `generate` produces one study package from a file and prints it.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flashgen::{
    generate_from_pdf, generate_notes, resolve_backend, server, to_anki, to_markdown,
    GenerationConfig, GenerationRequest, ImageTarget, PdfiumExtractor, ServerConfig,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the API (and a web UI from ./public) on port 3000
  flashgen serve --public-dir public

  # One-shot generation from a PDF, printed as JSON
  flashgen generate course.pdf --flashcards 30 --qcm 10

  # Anki import file from a text file
  flashgen generate notes.txt --format anki -o flashcards_anki.txt

  # Use another provider through edgequake-llm
  flashgen --provider openai --model gpt-4.1-mini generate notes.txt

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY     Mistral API key (default provider)
  FLASHGEN_PROVIDER   mistral (default), auto, openai, anthropic, gemini, ollama, …
  FLASHGEN_MODEL      Model ID (default: mistral-large-latest)
  PDFIUM_LIB_PATH     Directory or file of the pdfium shared library
  RUST_LOG            Log filter override (e.g. flashgen=debug)
"#;

/// Generate flashcards, QCM and revision sheets from documents with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "flashgen",
    version,
    about = "Generate flashcards, QCM and revision sheets from documents with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FLASHGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "FLASHGEN_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM provider: mistral, auto, or any edgequake-llm provider name.
    #[arg(long, global = true, env = "FLASHGEN_PROVIDER", default_value = "mistral")]
    provider: String,

    /// Model ID.
    #[arg(long, global = true, env = "FLASHGEN_MODEL")]
    model: Option<String>,

    /// Base URL of the Mistral-compatible API.
    #[arg(long, global = true, env = "FLASHGEN_API_BASE")]
    api_base: Option<String>,

    /// API key for the mistral provider.
    #[arg(long, global = true, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Max output tokens of the model call.
    #[arg(long, global = true, env = "FLASHGEN_MAX_TOKENS", default_value_t = 24_000)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, env = "FLASHGEN_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Timeout of the model call in seconds (none by default).
    #[arg(long, global = true, env = "FLASHGEN_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "FLASHGEN_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Pages rendered as images from uploaded PDFs.
    #[arg(long, global = true, env = "FLASHGEN_MAX_PDF_IMAGES", default_value_t = 15)]
    max_pdf_images: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Generate one study package from a PDF or text file.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "FLASHGEN_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Directory for uploaded PDFs and extracted images.
    #[arg(long, env = "FLASHGEN_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory of a static web UI served at `/`.
    #[arg(long, env = "FLASHGEN_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// PDF or UTF-8 text file.
    input: PathBuf,

    /// Number of flashcards.
    #[arg(long, default_value_t = 20)]
    flashcards: usize,

    /// Number of multiple-choice questions.
    #[arg(long, default_value_t = 15)]
    qcm: usize,

    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where page images of a PDF input are written.
    #[arg(long, default_value = "flashgen_images")]
    image_dir: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Anki,
    Markdown,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let generation = build_generation_config(&cli.model)?;

    match cli.command {
        Command::Serve(args) => {
            let mut builder = ServerConfig::builder()
                .host(args.host)
                .port(args.port)
                .upload_dir(args.upload_dir)
                .generation(generation);
            if let Some(dir) = args.public_dir {
                builder = builder.public_dir(dir);
            }
            let config = builder.build().context("Invalid server configuration")?;

            let state = server::AppState::from_config(config)
                .context("Failed to initialise the generation backend")?;
            server::serve(state).await.context("Server stopped")?;
        }
        Command::Generate(args) => generate_once(args, &generation).await?,
    }
    Ok(())
}

fn build_generation_config(args: &ModelArgs) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .provider_name(&args.provider)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .max_pdf_images(args.max_pdf_images);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref base) = args.api_base {
        builder = builder.api_base(base);
    }
    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(secs) = args.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt from {}", path.display()))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid generation configuration")
}

async fn generate_once(args: GenerateArgs, config: &GenerationConfig) -> Result<()> {
    let backend = resolve_backend(config).context("Failed to initialise the generation backend")?;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let output = if flashgen::pipeline::input::is_pdf_bytes(&bytes) {
        let extractor = PdfiumExtractor::from_config(config);
        let url_prefix = args.image_dir.display().to_string();
        let images = ImageTarget::new(&args.image_dir, url_prefix);
        generate_from_pdf(
            &args.input,
            args.flashcards,
            args.qcm,
            &extractor,
            backend.as_ref(),
            config,
            &images,
        )
        .await
        .context("Generation failed")?
    } else {
        let text = String::from_utf8(bytes)
            .with_context(|| format!("{} is neither a PDF nor UTF-8 text", args.input.display()))?;
        let request = GenerationRequest::new(text, args.flashcards, args.qcm);
        generate_notes(&request, backend.as_ref(), config)
            .await
            .context("Generation failed")?
    };

    if let Some(ref warning) = output.warning {
        tracing::warn!("{}", warning);
    }

    let rendered = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&output).context("Failed to serialise output")? + "\n"
        }
        OutputFormat::Anki => to_anki(&output.result.flashcards),
        OutputFormat::Markdown => to_markdown(&output.result.revision),
    };

    match args.output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?,
    }
    Ok(())
}
