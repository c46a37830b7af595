use anyhow::{bail, Context, Result};
use glob::glob;
use rayon::prelude::*;
use std::{env, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use worksheet::{format::classify_path, ReaderConfig, Utf8Checker};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Expect exactly one CLI argument: a glob pattern.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!(
            "Usage: {} <GLOB>   e.g. 'exports/**/*.csv'",
            program_name(&args)
        );
        exit(1);
    }
    let pattern = &args[1];

    let cfg = ReaderConfig::from_env()?;
    let checker = Utf8Checker::new(cfg.check_size);

    // 1) expand the pattern
    let paths: Vec<PathBuf> = glob(pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    if paths.is_empty() {
        bail!("No files found under '{}'", pattern);
    }
    info!(files = paths.len(), check_size = cfg.check_size, "checking");

    // 2) each file is its own stream, so check them in parallel
    let verdicts: Vec<_> = paths
        .into_par_iter()
        .map(|path| {
            let verdict = checker.check_path(&path);
            (path, verdict)
        })
        .collect();

    // 3) report
    let mut rejected = 0usize;
    for (path, verdict) in &verdicts {
        let kind = format!("{:?}", classify_path(path));
        match verdict {
            Ok(true) => println!("utf-8      {:<16} {}", kind, path.display()),
            Ok(false) => {
                rejected += 1;
                println!("not-utf-8  {:<16} {}", kind, path.display());
            }
            Err(e) => {
                rejected += 1;
                error!(path = %path.display(), "check failed: {}", e);
            }
        }
    }

    info!(files = verdicts.len(), rejected, "done");
    if rejected > 0 {
        exit(2);
    }
    Ok(())
}

/// argv[0], which the OS does not guarantee to pass.
fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("check_utf8")
}
