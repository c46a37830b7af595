use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;
use serde_json::json;
use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use worksheet::{
    open_path, read_line, read_sync, Flow, Page, PageReader, ReadOutcome, ReaderConfig, Record,
    Utf8Checker,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// one JSON object per data row
    Line,
    /// one JSON object per page
    Page,
    /// collect everything, then print (`--limit` only truncates the output)
    Sync,
}

#[derive(Parser)]
#[command(author, version, about = "Stream a CSV sheet as JSON records")]
struct Args {
    /// .csv file to read
    path: PathBuf,
    #[arg(long, value_enum, default_value_t = Mode::Line)]
    mode: Mode,
    /// records per page (overrides WORKSHEET_PAGE_SIZE)
    #[arg(long)]
    page_size: Option<usize>,
    /// bytes to validate as UTF-8, 0 for the whole file (overrides WORKSHEET_CHECK_SIZE)
    #[arg(long)]
    check_size: Option<usize>,
    /// stop after this many data rows (sync mode reads the whole file first)
    #[arg(long)]
    limit: Option<usize>,
    /// text encoding label, e.g. windows-1252 or gbk (default utf-8)
    #[arg(long)]
    encoding: Option<String>,
    #[arg(long)]
    skip_encoding_check: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    // ─── 2) resolve config ───────────────────────────────────────────
    let mut cfg = ReaderConfig::from_env()?;
    if let Some(n) = args.page_size {
        cfg = cfg.with_page_size(n);
    }
    if let Some(n) = args.check_size {
        cfg = cfg.with_check_size(n);
    }
    let cfg = cfg.validate()?;
    let limit = args.limit.filter(|&n| n > 0);
    let encoding = resolve_encoding(args.encoding.as_deref())?;

    // ─── 3) encoding check (UTF-8 input only) ────────────────────────
    if !args.skip_encoding_check && encoding == UTF_8 {
        let utf8 = Utf8Checker::new(cfg.check_size)
            .check_path(&args.path)
            .with_context(|| format!("checking encoding of {}", args.path.display()))?;
        if !utf8 {
            bail!("{} does not look like UTF-8", args.path.display());
        }
    }

    // ─── 4) read ─────────────────────────────────────────────────────
    let mut source = open_path(&args.path)
        .with_context(|| format!("opening {}", args.path.display()))?
        .with_encoding(encoding);
    let mut out = BufWriter::new(io::stdout().lock());

    let outcome = match args.mode {
        Mode::Line => print_lines(&mut source, &mut out, limit)?,
        Mode::Page => print_pages(&mut source, &mut out, &cfg, limit)?,
        Mode::Sync => {
            print_sync(&mut source, &mut out, limit)?;
            None
        }
    };

    out.flush().context("flushing stdout")?;
    if let Some(outcome) = outcome {
        info!(outcome = %serde_json::to_string(&outcome)?, "done");
    }
    Ok(())
}

fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        None => Ok(UTF_8),
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| anyhow!("unknown encoding '{}'", label)),
    }
}

fn print_lines<W: Write>(
    source: &mut worksheet::CsvRowSource<impl io::Read>,
    out: &mut W,
    limit: Option<usize>,
) -> Result<Option<ReadOutcome>> {
    let mut failure = None;
    let mut delivered = 0usize;

    let outcome = read_line(source, &mut |row_index: usize, record: Option<Record>| {
        delivered += 1;
        if let Err(e) = write_json(&mut *out, &json!({ "row": row_index, "record": record })) {
            failure = Some(e);
            return Flow::Stop;
        }
        if limit.is_some_and(|n| delivered >= n) {
            Flow::Stop
        } else {
            Flow::Continue
        }
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok(Some(outcome)),
    }
}

fn print_pages<W: Write>(
    source: &mut worksheet::CsvRowSource<impl io::Read>,
    out: &mut W,
    cfg: &ReaderConfig,
    limit: Option<usize>,
) -> Result<Option<ReadOutcome>> {
    let mut failure = None;
    let mut delivered = 0usize;

    let outcome = PageReader::from_config(cfg)?.read(source, |page: Page| {
        delivered += page.len();
        if let Err(e) = write_json(&mut *out, &page) {
            failure = Some(e);
            return Flow::Stop;
        }
        if limit.is_some_and(|n| delivered >= n) {
            Flow::Stop
        } else {
            Flow::Continue
        }
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok(Some(outcome)),
    }
}

/// Sync reads have no early stop; `limit` trims what is printed.
fn print_sync<W: Write>(
    source: &mut worksheet::CsvRowSource<impl io::Read>,
    out: &mut W,
    limit: Option<usize>,
) -> Result<usize> {
    let records = read_sync(source)?;
    let n = limit.unwrap_or(records.len()).min(records.len());
    for record in &records[..n] {
        write_json(&mut *out, record)?;
    }
    Ok(n)
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("encoding JSON")?;
    out.write_all(b"\n").context("writing stdout")?;
    Ok(())
}
