//! stylescope - edit the CSS rules of one element

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use stylescope::css::{self, Block, BlockKind, InsertPosition, ReplaceOptions};
use stylescope::dom::Document;
use stylescope::{Error, Result};

#[derive(Parser)]
#[command(name = "stylescope")]
#[command(version, about = "Selector-scoped CSS editing", long_about = None)]
#[command(after_help = "EXAMPLES:
    stylescope extract theme.css --html login.html --node '#kc-code p'
    stylescope replace theme.css --html login.html --node '#kc-code p' --with edit.css -i
    stylescope replace-selector theme.css --with rule.css --insert-at start
    stylescope blocks theme.css --json")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rules that belong to an element
    Extract {
        /// Stylesheet to read
        css: PathBuf,
        #[command(flatten)]
        node: NodeArgs,
    },
    /// Replace an element's rules with new CSS
    Replace {
        css: PathBuf,
        #[command(flatten)]
        node: NodeArgs,
        #[command(flatten)]
        edit: EditArgs,
    },
    /// Replace rules whose selectors appear in the new CSS
    ReplaceSelector {
        css: PathBuf,
        #[command(flatten)]
        edit: EditArgs,
    },
    /// Exit with status 0 if any rule in the CSS styles the element, 1 otherwise
    Targets {
        css: PathBuf,
        #[command(flatten)]
        node: NodeArgs,
    },
    /// List the top-level blocks of a stylesheet
    Blocks { css: PathBuf },
}

#[derive(Args)]
struct NodeArgs {
    /// HTML document containing the element
    #[arg(long, value_name = "FILE")]
    html: PathBuf,

    /// Selector locating the element (first match in document order)
    #[arg(long, value_name = "SELECTOR")]
    node: String,
}

#[derive(Args)]
struct EditArgs {
    /// Replacement CSS file, or - for stdin
    #[arg(long = "with", value_name = "FILE")]
    with: PathBuf,

    /// Where to put the new CSS when no existing rule matches
    #[arg(long, value_enum, default_value_t = InsertPosition::End)]
    insert_at: InsertPosition,

    /// Write the result back to the stylesheet instead of printing it
    #[arg(short, long)]
    in_place: bool,
}

#[derive(Serialize)]
struct ReplaceReport<'a> {
    changed: bool,
    options: ReplaceOptions,
    css: &'a str,
}

#[derive(Serialize)]
struct BlockSummary<'a> {
    kind: BlockKind,
    prelude: &'a str,
    raw: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<BlockSummary<'a>>,
}

impl<'a> From<&Block<'a>> for BlockSummary<'a> {
    fn from(block: &Block<'a>) -> Self {
        Self {
            kind: block.kind,
            prelude: block.prelude,
            raw: block.raw,
            children: block.children.iter().map(BlockSummary::from).collect(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "stylescope=debug",
        _ => "stylescope=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Command::Extract { css, node } => {
            let source = std::fs::read_to_string(css)?;
            let doc = load_document(&node.html)?;
            let element = doc.select(&node.node)?;

            let fragment = css::get_css_for_element_from_text(&source, &element);
            if cli.json {
                print_json(&serde_json::json!({ "css": fragment }));
            } else if !fragment.is_empty() {
                println!("{fragment}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Replace { css, node, edit } => {
            let source = std::fs::read_to_string(css)?;
            let doc = load_document(&node.html)?;
            let element = doc.select(&node.node)?;
            let new_css = read_input(&edit.with)?;
            let options = ReplaceOptions::insert_at(edit.insert_at);

            let next = css::replace_css_for_element_in_text(&source, &element, &new_css, options);
            finish_replace(cli, css, &source, &next, edit)
        }
        Command::ReplaceSelector { css, edit } => {
            let source = std::fs::read_to_string(css)?;
            let new_css = read_input(&edit.with)?;
            let options = ReplaceOptions::insert_at(edit.insert_at);

            let next = css::replace_css_by_selector_in_text(&source, &new_css, options);
            finish_replace(cli, css, &source, &next, edit)
        }
        Command::Targets { css, node } => {
            let source = std::fs::read_to_string(css)?;
            let doc = load_document(&node.html)?;
            let element = doc.select(&node.node)?;

            let targets = css::does_css_target_element(&source, &element);
            if cli.json {
                print_json(&serde_json::json!({ "targets": targets }));
            } else {
                println!("{targets}");
            }
            Ok(if targets {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Blocks { css } => {
            let source = std::fs::read_to_string(css)?;
            let blocks = css::parse_blocks(&source);

            if cli.json {
                let summary: Vec<BlockSummary<'_>> = blocks.iter().map(BlockSummary::from).collect();
                print_json(&summary);
            } else {
                for block in &blocks {
                    print_block(block, 0);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn finish_replace(
    cli: &Cli,
    path: &Path,
    source: &str,
    next: &str,
    edit: &EditArgs,
) -> Result<ExitCode> {
    let changed = next != source;

    if edit.in_place {
        if changed {
            std::fs::write(path, next)?;
            tracing::info!(path = %path.display(), "stylesheet updated");
        }
        if cli.json {
            print_json(&serde_json::json!({ "changed": changed }));
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.json {
        print_json(&ReplaceReport {
            changed,
            options: ReplaceOptions::insert_at(edit.insert_at),
            css: next,
        });
    } else {
        println!("{next}");
    }
    Ok(ExitCode::SUCCESS)
}

fn load_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    let html = String::from_utf8(bytes)?;
    Ok(Document::parse_html(&html))
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(Error::Io)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn print_block(block: &Block<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    let kind = match block.kind {
        BlockKind::Rule => "rule",
        BlockKind::Media => "media",
        BlockKind::AtRule => "at-rule",
        BlockKind::Comment => "comment",
    };
    println!("{indent}{kind:<8} {}", block.prelude);
    for child in &block.children {
        print_block(child, depth + 1);
    }
}
