use clap::{Parser, Subcommand};
use richtext_core::outline::{layout_report, parse_outline, to_outline};
use richtext_core::richtext::font::{FixedWidthFonts, FontRole, FontSet, TrueTypeFonts};
use richtext_core::{Document, EditorConfig, TextSoup};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "richtext")]
#[command(about = "Inspect how the rich-text core wraps and lays out text", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the per-user editor.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// TrueType font used for measuring instead of fixed-width metrics
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Wrap width in pixels, overriding the config
    #[arg(short, long, global = true)]
    width: Option<f32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wrap plain text and print one line per wrapped line
    Wrap {
        /// Text to wrap (read from stdin when omitted)
        text: Option<String>,
    },
    /// Load an outline file and print its block layout
    Layout {
        /// Outline file: one block per line, "# ", "## ", "- " and "1. " prefixes, two-space indents
        file: PathBuf,
    },
    /// Load an outline file and print it back normalized
    Format {
        file: PathBuf,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config file as well
        #[arg(long)]
        save: bool,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("richtext_core=warn,richtext=info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_fonts(font: Option<&Path>, config: &EditorConfig) -> Result<Box<dyn FontSet>, String> {
    let Some(path) = font else {
        return Ok(Box::new(FixedWidthFonts::from_sizes(&config.fonts)));
    };
    let bytes = fs::read(path)
        .map_err(|e| format!("Failed to read font '{}': {}", path.display(), e))?;
    let fonts = TrueTypeFonts::from_bytes(bytes, &config.fonts)
        .ok_or_else(|| format!("'{}' is not a usable TrueType font", path.display()))?;
    info!(font = %path.display(), "measuring with TrueType metrics");
    Ok(Box::new(fonts))
}

fn load_document(file: &Path, fonts: Box<dyn FontSet>, config: &EditorConfig) -> Result<Document, String> {
    let text = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
    let blocks = parse_outline(&text);
    debug!(blocks = blocks.len(), file = %file.display(), "loaded outline");
    Ok(Document::from_config(fonts, config).with_blocks(blocks))
}

fn cmd_wrap(text: Option<String>, fonts: &dyn FontSet, config: &EditorConfig) -> Result<(), String> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            input.trim_end_matches('\n').to_string()
        }
    };

    let font = fonts.font(FontRole::Paragraph);
    for line in TextSoup::plain(text).wrap_lines(config.wrap_width, |s| font.measure(s)) {
        println!("{:>6.1} {:?}", font.measure(line.text()), line.text());
    }
    Ok(())
}

fn cmd_config(args: &Args, config: &EditorConfig, save: bool) -> Result<(), String> {
    let toml = config.to_toml_string().map_err(|e| e.to_string())?;
    print!("{}", toml);

    if save {
        let path = args
            .config
            .clone()
            .or_else(EditorConfig::config_path)
            .ok_or("No config directory available")?;
        config.save(&path).map_err(|e| e.to_string())?;
        info!(path = %path.display(), "saved config");
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), String> {
    let mut config = EditorConfig::load_or_default(args.config.as_deref());
    if let Some(width) = args.width {
        config.wrap_width = width;
    }
    let fonts = load_fonts(args.font.as_deref(), &config)?;

    match &args.command {
        Commands::Wrap { text } => cmd_wrap(text.clone(), fonts.as_ref(), &config),
        Commands::Layout { file } => {
            let doc = load_document(file, fonts, &config)?;
            print!("{}", layout_report(&doc));
            Ok(())
        }
        Commands::Format { file } => {
            let doc = load_document(file, fonts, &config)?;
            print!("{}", to_outline(&doc));
            Ok(())
        }
        Commands::Config { save } => cmd_config(args, &config, *save),
    }
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
