use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glyphtex_fonts::FontDirectory;
use glyphtex_layout::{
    batch, markup_to_glyphs, CachedMetrics, FixedMetrics, FontMetrics, Layout, LayoutConfig,
    Substituting,
};
use glyphtex_syntax::{GapPolicy, Lexer, Token};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glyphtex")]
#[command(about = "Lay out LaTeX math markup into positioned glyphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize markup and emit the tokens as JSON
    Tokens {
        /// Markup to tokenize, or `-` for stdin
        markup: String,
        /// Fail on characters no rule matches
        #[arg(long)]
        strict: bool,
    },
    /// Parse markup and print the segment tree
    Tree {
        /// Markup to parse, or `-` for stdin
        markup: String,
    },
    /// Lay out markup and emit the glyphs as JSON
    Layout(RenderArgs),
    /// Lay out markup and emit render batches as JSON
    Batches(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Markup to lay out, or `-` for stdin
    markup: String,
    /// Root font size
    #[arg(long)]
    size: Option<f64>,
    /// Directory holding the .ttf faces; uniform metrics are used without it
    #[arg(long, value_name = "DIR")]
    font_dir: Option<PathBuf>,
    /// JSON layout config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Fail on characters no rule matches
    #[arg(long)]
    strict: bool,
    /// Draw this character for glyphs the fonts lack
    #[arg(long, value_name = "CHAR")]
    substitute: Option<char>,
}

impl RenderArgs {
    fn layout_config(&self) -> anyhow::Result<LayoutConfig> {
        let mut config = match &self.config {
            Some(path) => LayoutConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => LayoutConfig::default(),
        };
        if let Some(size) = self.size {
            config.root_size = size;
        }
        if self.strict {
            config.gap_policy = GapPolicy::Fail;
        }
        Ok(config)
    }

    fn metrics(&self) -> anyhow::Result<Box<dyn FontMetrics>> {
        let metrics: Box<dyn FontMetrics> = match &self.font_dir {
            Some(dir) => {
                let fonts = FontDirectory::open(dir)
                    .with_context(|| format!("opening font directory {}", dir.display()))?;
                Box::new(CachedMetrics::new(fonts))
            }
            None => Box::new(FixedMetrics::default()),
        };
        Ok(match self.substitute {
            Some(placeholder) => Box::new(Substituting::new(metrics, placeholder)),
            None => metrics,
        })
    }

    fn render(&self) -> anyhow::Result<(Layout, Box<dyn FontMetrics>)> {
        let markup = read_markup(&self.markup)?;
        let config = self.layout_config()?;
        let metrics = self.metrics()?;
        let layout = markup_to_glyphs(&markup, metrics.as_ref(), &config)
            .with_context(|| format!("laying out {:?}", markup))?;
        Ok((layout, metrics))
    }
}

fn read_markup(arg: &str) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut markup = String::new();
    std::io::stdin()
        .read_to_string(&mut markup)
        .context("reading markup from stdin")?;
    Ok(markup.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Tokens { markup, strict } => {
            let markup = read_markup(markup)?;
            let policy = if *strict {
                GapPolicy::Fail
            } else {
                GapPolicy::Skip
            };
            let lexer = Lexer::latex().with_gap_policy(policy);
            let tokens = lexer
                .tokenize(&markup)
                .collect::<Result<Vec<Token>, _>>()
                .context("tokenizing markup")?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Commands::Tree { markup } => {
            let markup = read_markup(markup)?;
            let tree = glyphtex_syntax::parse(&markup).context("parsing markup")?;
            println!("{}", tree);
        }
        Commands::Layout(args) => {
            let (layout, _) = args.render()?;
            log::info!("{} glyphs", layout.glyphs.len());
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Commands::Batches(args) => {
            let (layout, metrics) = args.render()?;
            let batches = batch(&layout.glyphs, metrics.as_ref());
            println!("{}", serde_json::to_string_pretty(&batches)?);
        }
    }
    Ok(())
}
