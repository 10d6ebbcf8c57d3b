//! marginalia - Extract annotations from library documents

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use marginalia::export::{ConsoleExporter, Exporter, NotesExporter};
use marginalia::format::FormatterKind;
use marginalia::{Config, Error, ExtractorRegistry, Library, extract_documents};

#[derive(Parser)]
#[command(name = "marginalia")]
#[command(version, about = "Extract highlights and notes from library documents", long_about = None)]
#[command(after_help = "EXAMPLES:
    marginalia author:shannon               Print annotations as Markdown
    marginalia -o count                     Count annotations of every entry
    marginalia -w -g year:1948              Add new annotations to notes and commit
    marginalia -e pocketbook -o csv '*'     Export PocketBook highlights as CSV")]
struct Cli {
    /// Query selecting library entries (`key:value` or plain terms; all match when empty)
    #[arg(value_name = "QUERY")]
    query: Vec<String>,

    /// Library directory (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only use the named extractor (repeatable: pdf, pocketbook)
    #[arg(short, long = "extractor", value_name = "NAME")]
    extractors: Vec<String>,

    /// Output format: markdown, markdown-atx, markdown-setext, count, csv
    #[arg(short, long, value_name = "FORMAT", default_value = "markdown")]
    output: String,

    /// Write annotations into each entry's notes file instead of printing
    #[arg(short, long)]
    write: bool,

    /// Append annotations even if they are already in the notes file
    #[arg(short, long, requires = "write")]
    force: bool,

    /// Open each notes file in the editor after writing
    #[arg(short, long, requires = "write")]
    manual: bool,

    /// Commit changed notes files with git
    #[arg(short, long, requires = "write")]
    git: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = Config::load(cli.config.as_deref())?;
    let format: FormatterKind = cli.output.parse()?;

    let root = cli
        .library
        .clone()
        .or_else(|| config.library.clone())
        .ok_or(Error::NoLibrary)?;
    let library = Library::open(&root)?.with_notes_name(config.notes_name.as_str());
    let documents = library.query(&cli.query.join(" "));
    if documents.is_empty() {
        log::warn!("No documents match the query.");
        return Ok(());
    }

    let registry = ExtractorRegistry::default();
    let extractors = registry.select(&cli.extractors)?;
    let annotated = extract_documents(&documents, &extractors, &config.extract);

    let formatter = format.build();
    if cli.write {
        NotesExporter::new(formatter)
            .with_notes_name(library.notes_name())
            .with_minimum_similarity(config.extract.minimum_similarity)
            .with_force(cli.force)
            .with_edit(cli.manual)
            .with_git(cli.git)
            .export(&annotated)
    } else {
        ConsoleExporter::new(formatter).export(&annotated)
    }
}
