use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reflow_core::Margins;
use reflow_core::config_file::{self, ConfigFile};
use reflow_ingest::{BackendRegistry, convert_document_with, default_registry, find_annotation, find_blocks};
use reflow_parsing::{DocumentConverter, ParsingConfig, ParsingConfigBuilder};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Reflow - Rebuild paragraphs and reference lists from PDF, DOCX and RTF documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file (default: REFLOW_CONFIG, then the platform and ./.reflow.toml cascade)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preferred extraction backend (see `reflow backends`)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert documents into paragraphs
    Convert {
        /// Paths to the PDF, DOCX or RTF files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Emit HTML (`<p>` per paragraph) instead of plain text
        #[arg(long)]
        html: bool,

        /// Write one output file per document into this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Drop УДК/DOI/e-mail/copyright lines before merging
        #[arg(long)]
        drop_service_lines: bool,
    },

    /// Print the normalized references block of a document
    References {
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Locate labelled blocks (abstract, keywords) on PDF pages
    FindBlocks {
        file: PathBuf,

        /// Term to search for; repeatable (default: configured block terms)
        #[arg(short, long = "term")]
        terms: Vec<String>,

        /// Box expansion in points: left,top,right,bottom
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        expand: Option<Vec<f32>>,

        /// Only the first abstract-like block, expanded downward
        #[arg(long, conflicts_with_all = ["terms", "expand"])]
        annotation: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List extraction backends and whether this build can use them
    Backends {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let file_config = resolve_config_file(cli.config.as_deref())?;
    let prefer = cli
        .backend
        .clone()
        .or_else(|| file_config.backend.as_ref().and_then(|b| b.prefer.clone()));
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Convert {
            files,
            html,
            out_dir,
            drop_service_lines,
        } => {
            let config = parsing_config(&file_config, drop_service_lines)?;
            convert(&files, html, out_dir.as_deref(), config, prefer.as_deref(), color)
        }
        Command::References { file, json } => {
            let config = parsing_config(&file_config, false)?;
            references(&file, json, config, prefer.as_deref(), color)
        }
        Command::FindBlocks {
            file,
            terms,
            expand,
            annotation,
            json,
        } => {
            let config = parsing_config(&file_config, false)?;
            let expand = match expand.as_deref() {
                Some([left, top, right, bottom]) => Margins::new(*left, *top, *right, *bottom),
                Some(other) => anyhow::bail!("--expand takes 4 values, got {}", other.len()),
                None => Margins::ZERO,
            };
            find(&file, terms, expand, annotation, json, &config, color)
        }
        Command::Backends { json } => backends(&default_registry(), json, color),
    }
}

/// Resolve the config file: `--config` > `REFLOW_CONFIG` > platform/CWD cascade.
fn resolve_config_file(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("REFLOW_CONFIG").ok().map(PathBuf::from));
    match path {
        Some(path) => config_file::load_from_path(&path)
            .ok_or_else(|| anyhow::anyhow!("Could not read config file {}", path.display())),
        None => Ok(config_file::load_config()),
    }
}

/// Map config file values onto the parsing builder. CLI flags win.
fn parsing_config(file: &ConfigFile, drop_service_lines: bool) -> anyhow::Result<ParsingConfig> {
    let mut builder = ParsingConfigBuilder::new();

    if let Some(layout) = &file.layout {
        if let Some(v) = layout.gutter_ratio {
            builder = builder.gutter_ratio(v);
        }
        if let Some(v) = layout.min_words_per_column {
            builder = builder.min_words_per_column(v);
        }
        if let Some(v) = layout.line_tolerance {
            builder = builder.line_tolerance(v);
        }
        if let Some(v) = layout.max_paragraph_chars {
            builder = builder.max_paragraph_chars(v);
        }
    }
    if let Some(filter) = &file.filter {
        if let Some(v) = filter.min_repeats {
            builder = builder.min_repeats(v);
        }
        if let Some(v) = filter.page_ratio {
            builder = builder.page_ratio(v);
        }
        if let Some(v) = filter.edge_lines {
            builder = builder.edge_lines(v);
        }
        if let Some(v) = filter.drop_service_lines {
            builder = builder.drop_service_lines(v);
        }
    }
    if let Some(refs) = &file.references {
        if let Some(re) = &refs.header_regex {
            builder = builder.references_header_regex(re);
        }
        if let Some(re) = &refs.end_regex {
            builder = builder.references_end_regex(re);
        }
        if let Some(v) = refs.min_entry_chars {
            builder = builder.min_entry_chars(v);
        }
    }
    if drop_service_lines {
        builder = builder.drop_service_lines(true);
    }

    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid regex in config: {}", e))
}

fn convert(
    files: &[PathBuf],
    html: bool,
    out_dir: Option<&Path>,
    config: ParsingConfig,
    prefer: Option<&str>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let registry = default_registry();
    let converter = DocumentConverter::with_config(config);

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
    }

    // progress only when stdout is not carrying the documents themselves
    let progress = (out_dir.is_some() && files.len() > 1).then(|| {
        let bar = indicatif::ProgressBar::new(files.len() as u64);
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    });

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let mut failed = 0usize;

    for path in files {
        let name = display_name(path);
        if let Some(bar) = &progress {
            bar.set_message(name.clone());
        }

        match convert_document_with(path, &converter, &registry, prefer) {
            Ok(conversion) => {
                output::print_warnings(&mut stderr, &name, &conversion.warnings, color)?;
                match out_dir {
                    Some(dir) => {
                        let target = output_path(dir, path, html);
                        let mut file = std::fs::File::create(&target)?;
                        write_document(&mut file, &conversion, html)?;
                        if progress.is_none() {
                            output::print_conversion_summary(&mut stdout, &name, &conversion, color)?;
                        }
                    }
                    None => write_document(&mut stdout, &conversion, html)?,
                }
            }
            Err(e) => {
                failed += 1;
                tracing::error!(path = %path.display(), error = %e, "conversion failed");
                writeln!(stderr, "Error: {}: {}", name, e)?;
            }
        }

        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish_with_message("done");
    }

    if failed > 0 {
        anyhow::bail!("{} of {} documents failed", failed, files.len());
    }
    Ok(())
}

fn write_document(w: &mut dyn Write, conversion: &reflow_parsing::Conversion, html: bool) -> std::io::Result<()> {
    if html {
        writeln!(w, "{}", conversion.html)
    } else {
        output::print_paragraphs(w, &conversion.paragraphs)
    }
}

fn references(
    file: &Path,
    json: bool,
    config: ParsingConfig,
    prefer: Option<&str>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let converter = DocumentConverter::with_config(config);
    let conversion = convert_document_with(file, &converter, &default_registry(), prefer)?;

    let mut stdout = std::io::stdout();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&conversion.references)?)?;
    } else {
        output::print_references(&mut stdout, conversion.references.as_ref(), color)?;
    }
    Ok(())
}

fn find(
    file: &Path,
    terms: Vec<String>,
    expand: Margins,
    annotation: bool,
    json: bool,
    config: &ParsingConfig,
    color: ColorMode,
) -> anyhow::Result<()> {
    let matches = if annotation {
        find_annotation(file, config)?.into_iter().collect()
    } else {
        let terms = if terms.is_empty() { config.block_terms() } else { terms };
        find_blocks(file, &terms, expand, config)?
    };

    let mut stdout = std::io::stdout();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&matches)?)?;
    } else {
        output::print_blocks(&mut stdout, &matches, color)?;
    }
    Ok(())
}

fn backends(registry: &BackendRegistry, json: bool, color: ColorMode) -> anyhow::Result<()> {
    let infos = registry.infos();
    let mut stdout = std::io::stdout();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&infos)?)?;
    } else {
        output::print_backends(&mut stdout, &infos, color)?;
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `<out_dir>/<stem>.html` or `<out_dir>/<stem>.txt`.
fn output_path(out_dir: &Path, input: &Path, html: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{}.{}", stem, if html { "html" } else { "txt" }))
}
