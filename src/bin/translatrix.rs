//! CLI binary for translatrix.
//!
//! A thin shim over the library crate: `serve` runs the HTTP API,
//! `translate` translates one local file, `providers` reports which engines
//! have credentials.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use translatrix::config::ServiceStatus;
use translatrix::language::parse_target;
use translatrix::server::{self, AppState};
use translatrix::{
    Credentials, FilePayload, Language, OrchestrationObserver, ProviderId, Translator,
    TranslatorConfig,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn tick(ok: bool) -> String {
    if ok {
        green("✓")
    } else {
        red("✗")
    }
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Shows which provider is being tried and logs every fallback step above
/// the spinner.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Translating");
        bar.set_message("extracting text…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl OrchestrationObserver for SpinnerObserver {
    fn on_provider_start(&self, provider: &str, position: usize, total: usize) {
        self.bar.set_message(format!("{provider} ({position}/{total})"));
    }

    fn on_provider_declined(&self, provider: &str, reason: &str) {
        self.bar
            .println(format!("  {} {:<16} {}", dim("·"), provider, dim(reason)));
    }

    fn on_provider_rejected(&self, provider: &str, reason: &str) {
        let msg = if reason.chars().count() > 80 {
            let cut: String = reason.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            reason.to_string()
        };
        self.bar
            .println(format!("  {} {:<16} {}", red("✗"), provider, red(&msg)));
    }

    fn on_accepted(&self, provider: &str, chars: usize) {
        self.bar.println(format!(
            "  {} {:<16} {}",
            green("✓"),
            provider,
            dim(&format!("{chars} chars"))
        ));
    }

    fn on_exhausted(&self, attempted: &[String]) {
        self.bar.println(format!(
            "  {} {}",
            red("✘"),
            bold(&format!("all {} providers failed", attempted.len()))
        ));
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"ENVIRONMENT:
  GEMINI_API_KEY          Gemini vision (images) and language detection
  ANTHROPIC_API_KEY       Claude document reading (PDF, images)
  OPENAI_API_KEY          GPT vision (images) and text translation
  OPENROUTER_API_KEY      OpenRouter text translation
  LIBRETRANSLATE_API_KEY  Optional key for the LibreTranslate free tier
  RUST_LOG                Overrides --verbose / --quiet

  A .env file in the working directory is loaded on startup.
  With no keys at all, the free public translators are still used.
"#;

/// Translate documents to English through a chain of AI and free providers.
#[derive(Parser, Debug)]
#[command(
    name = "translatrix",
    version,
    about = "Translate documents to English through a chain of AI and free providers",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show debug logs.
    #[arg(short, long, global = true, env = "TRANSLATRIX_VERBOSE")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long, global = true, env = "TRANSLATRIX_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "TRANSLATRIX_HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(short, long, env = "PORT", default_value_t = 5000)]
        port: u16,

        /// Directory for staged uploads (system temp dir if unset).
        #[arg(long, env = "TRANSLATRIX_UPLOAD_DIR")]
        upload_dir: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Translate one local file and print the result.
    Translate {
        /// Image, PDF, DOCX, text or JSON file.
        file: PathBuf,

        /// Source language (spanish, french, german, mandarin, hindi, english).
        #[arg(short, long)]
        source: String,

        /// Target language; only english is supported.
        #[arg(short, long, default_value = "english")]
        target: String,

        /// Print the full TranslationResult as JSON.
        #[arg(long)]
        json: bool,

        /// Disable the spinner.
        #[arg(long, env = "TRANSLATRIX_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// List translation engines and whether their credentials are set.
    Providers,
}

#[derive(Args, Debug, Clone)]
struct Tuning {
    /// Attempts per provider before falling back.
    #[arg(long, env = "TRANSLATRIX_MAX_ATTEMPTS", default_value_t = 2)]
    max_attempts: u32,

    /// Wall-clock budget for one translation, in seconds.
    #[arg(long, env = "TRANSLATRIX_REQUEST_TIMEOUT", default_value_t = 300)]
    request_timeout: u64,

    /// Timeout for a single provider call, in seconds.
    #[arg(long, env = "TRANSLATRIX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Check the document's language against the declared source.
    #[arg(long, env = "TRANSLATRIX_VERIFY_LANGUAGE")]
    verify_language: bool,

    /// Upload size cap in MiB.
    #[arg(long, env = "TRANSLATRIX_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,
}

impl Tuning {
    fn config(&self, observer: Option<Arc<dyn OrchestrationObserver>>) -> Result<TranslatorConfig> {
        let mut builder = TranslatorConfig::builder()
            .max_attempts(self.max_attempts)
            .request_timeout_secs(self.request_timeout)
            .api_timeout_secs(self.api_timeout)
            .verify_language(self.verify_language)
            .max_upload_bytes(self.max_upload_mb * 1024 * 1024);
        if let Some(observer) = observer {
            builder = builder.observer(observer);
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs during a one-shot translation.
    let spinner = matches!(
        &cli.command,
        Command::Translate { json: false, no_progress: false, .. }
    ) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
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

    let credentials = Credentials::from_env();

    match cli.command {
        Command::Serve {
            host,
            port,
            upload_dir,
            tuning,
        } => {
            let config = tuning.config(None)?;
            let mut translator = Translator::new(config, &credentials);
            if let Some(dir) = upload_dir {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create upload dir {}", dir.display()))?;
                translator = translator.with_upload_dir(dir);
            }
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("Invalid listen address {host}:{port}"))?;

            if !cli.quiet {
                print_banner(&addr, &credentials.status());
            }
            server::serve(addr, AppState::new(translator, credentials))
                .await
                .context("Server error")?;
        }

        Command::Translate {
            file,
            source,
            target,
            json,
            no_progress: _,
            tuning,
        } => {
            let source: Language = source.parse().context("Invalid --source")?;
            let target = parse_target(Some(&target)).context("Invalid --target")?;

            let observer = spinner.then(SpinnerObserver::new);
            let config = tuning.config(
                observer
                    .clone()
                    .map(|o| o as Arc<dyn OrchestrationObserver>),
            )?;
            let payload = FilePayload::from_path(&file, config.max_upload_bytes)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let translator = Translator::new(config, &credentials);
            let outcome = translator.translate_file(payload, source, target).await;
            if let Some(o) = &observer {
                o.finish();
            }
            let result = outcome.context("Translation failed")?;

            if json {
                let out =
                    serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
                println!("{out}");
            } else {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(result.translated_text.as_bytes())
                    .context("Failed to write to stdout")?;
                if !result.translated_text.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
                if !cli.quiet {
                    eprintln!(
                        "{} {} words via {}  {}",
                        green("✔"),
                        result.translated_word_count,
                        bold(&result.metadata.model),
                        dim(&format!("{:.2}s", result.kpis.latency)),
                    );
                }
            }
        }

        Command::Providers => {
            let status = credentials.status();
            println!("{}", bold("Translation engines (priority order per input):"));
            for (id, ok) in engine_rows(&status) {
                println!("  {} {:<16}", tick(ok), id.as_str());
            }
            println!(
                "  {} {:<16} {}",
                tick(true),
                ProviderId::FreeFallback.as_str(),
                dim("Google Translate, MyMemory, LibreTranslate")
            );
        }
    }

    Ok(())
}

fn engine_rows(status: &ServiceStatus) -> [(ProviderId, bool); 5] {
    [
        (ProviderId::GeminiVision, status.gemini),
        (ProviderId::OpenAiVision, status.openai),
        (ProviderId::ClaudeDocument, status.claude),
        (ProviderId::OpenAiText, status.openai),
        (ProviderId::OpenRouterText, status.openrouter),
    ]
}

fn print_banner(addr: &SocketAddr, status: &ServiceStatus) {
    let rule = "=".repeat(72);
    eprintln!("\n{rule}");
    eprintln!("{} {}", cyan("◆"), bold("translatrix document translator"));
    eprintln!("{rule}");
    eprintln!("  Server: http://{addr}");
    eprintln!("  Health: http://{addr}/api/health");
    eprintln!();
    eprintln!("  {}", bold("Engines:"));
    for (id, ok) in engine_rows(status) {
        eprintln!("    {} {}", tick(ok), id.as_str());
    }
    eprintln!(
        "    {} {} {}",
        tick(true),
        ProviderId::FreeFallback.as_str(),
        dim("(no key needed)")
    );
    eprintln!();
    eprintln!(
        "  {} Spanish, French, German, Mandarin, Hindi, English → English",
        bold("Languages:")
    );
    eprintln!("  {} images, PDF, DOCX, text, JSON", bold("Formats:"));
    eprintln!("{rule}\n");
}
