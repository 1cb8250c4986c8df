use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use unicode_width::UnicodeWidthStr;

use lipi_engine::backend::DEFAULT_SERVICE_URL;
use lipi_engine::settings::{BackendKind, Settings};
use lipi_engine::{script, trace_init, unicode, RemoteServiceConversion, TransliterationEngine};

#[derive(Parser)]
#[command(name = "lipitool", about = "Lipi transliteration diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct BackendArgs {
    /// Settings file (defaults to the built-in settings)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Use the conversion service at this URL
    #[arg(long, conflicts_with = "embedded")]
    remote: Option<String>,
    /// Use the in-process converter (requires the `vidyut` feature)
    #[arg(long)]
    embedded: bool,
    /// Service timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported scripts
    Scripts,

    /// Guess the script of a text
    Detect {
        text: String,
    },

    /// Convert text between two scripts
    Convert {
        text: String,
        /// Source script (defaults to the configured source script)
        #[arg(long)]
        from: Option<String>,
        /// Target script (defaults to the configured default script)
        #[arg(long)]
        to: Option<String>,
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Convert text into every supported script
    All {
        text: String,
        /// Source script (defaults to the configured source script)
        #[arg(long)]
        from: Option<String>,
        /// Print a JSON table suitable for corpus `transliterations` fields
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Query a conversion service's health and script list
    Health {
        #[arg(long, default_value = DEFAULT_SERVICE_URL)]
        url: String,
        /// Timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout: u64,
    },
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {err}");
    process::exit(1);
}

fn open_engine(args: &BackendArgs) -> TransliterationEngine {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .unwrap_or_else(|e| fail(&format!("Failed to load settings {}", path.display()), e)),
        None => Settings::default(),
    };
    if let Some(url) = &args.remote {
        settings.backend.kind = BackendKind::Remote;
        settings.backend.url = url.clone();
    }
    if args.embedded {
        settings.backend.kind = BackendKind::Embedded;
    }
    if let Some(ms) = args.timeout {
        settings.backend.timeout_ms = ms;
    }
    TransliterationEngine::from_settings(&settings)
        .unwrap_or_else(|e| fail("Failed to start engine", e))
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(s));
    format!("{s}{}", " ".repeat(fill))
}

fn print_scripts() {
    let scripts = script::supported_scripts();
    let id_width = scripts.iter().map(|s| s.identifier.width()).max().unwrap_or(0);
    let label_width = scripts.iter().map(|s| s.label.width()).max().unwrap_or(0);
    for s in scripts {
        println!(
            "{}  {}  {}",
            pad(s.identifier, id_width),
            pad(s.label, label_width),
            s.engine_code
        );
    }
}

fn main() {
    trace_init::init_stderr();
    let cli = Cli::parse();

    match cli.command {
        Command::Scripts => print_scripts(),

        Command::Detect { text } => {
            let detected = unicode::detect_script(&text);
            println!("{detected} ({})", script::label_for(detected));
        }

        Command::Convert {
            text,
            from,
            to,
            backend,
        } => {
            let engine = open_engine(&backend);
            let out = engine.transliterate_now(&text, from.as_deref(), to.as_deref());
            println!("{out}");
        }

        Command::All {
            text,
            from,
            json,
            backend,
        } => {
            let engine = open_engine(&backend);
            let table = engine.transliterate_to_all_scripts(&text, from.as_deref());
            if json {
                let out = serde_json::to_string_pretty(&table)
                    .unwrap_or_else(|e| fail("Failed to encode table", e));
                println!("{out}");
            } else {
                let source = from.as_deref().unwrap_or(engine.source_script());
                println!("source: {}", script::label_for(source));
                let width = table.iter().map(|(s, _)| s.width()).max().unwrap_or(0);
                for (id, converted) in table.iter() {
                    println!("  {}  {converted}", pad(id, width));
                }
            }
        }

        Command::Health { url, timeout } => {
            let service = RemoteServiceConversion::new(url, Duration::from_millis(timeout));
            let health = service
                .health()
                .unwrap_or_else(|e| fail(&format!("{} unreachable", service.base_url()), e));
            println!("status:            {}", health.status);
            println!("vidyut available:  {}", health.vidyut_available);
            match service.scripts() {
                Ok(scripts) => {
                    println!("scripts ({}):", scripts.count);
                    for name in &scripts.scripts {
                        println!("  {name}");
                    }
                }
                Err(e) => eprintln!("Failed to list scripts: {e}"),
            }
        }
    }
}
