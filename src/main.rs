use std::{env, fs, io::{self, Read}, path::Path, process::ExitCode, time::Instant};

use tab_cluster::{Configuration, EngineSnapshot, GroupingEngine, Tab};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: tab-cluster [OPTIONS] [TABS_FILE]");
    eprintln!();
    eprintln!("Groups tabs read from TABS_FILE (or stdin), one per line:");
    eprintln!("  <id>\\t<url>\\t<title>[\\tpinned]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --algorithm NAME   tfidf | bm25 | keyphrase | hac (default: tfidf)");
    eprintln!("  --threshold X      similarity threshold in [0, 1] (default: 0.3)");
    eprintln!("  --k1 X             BM25 saturation (default: 1.5)");
    eprintln!("  --b X              BM25 length normalization (default: 0.75)");
    eprintln!("  --name-len N       maximum group name length (default: 15)");
    eprintln!("  --snapshot PATH    resume from / save engine state to PATH");
    eprintln!("  -h, --help         show this message");
    eprintln!();
    eprintln!("Log level via RUST_LOG (e.g. RUST_LOG=tab_cluster=debug).");
}

struct Args {
    config: Configuration,
    input: Option<String>,
    snapshot: Option<String>,
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut args = env::args().skip(1);
    let mut config = Configuration::default();
    let mut input = None;
    let mut snapshot = None;

    fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
        args.next().ok_or_else(|| format!("{flag} requires a value"))
    }
    fn number<T: std::str::FromStr>(raw: String, flag: &str) -> Result<T, String> {
        raw.parse().map_err(|_| format!("{flag}: not a number: {raw}"))
    }

    while let Some(a) = args.next() {
        match a.as_str() {
            "--algorithm" => {
                config.grouping_algorithm = value(&mut args, &a)?.parse().map_err(|e| format!("{e}"))?;
            }
            "--threshold" => config.similarity_threshold = number(value(&mut args, &a)?, &a)?,
            "--k1" => config.bm25_k1 = number(value(&mut args, &a)?, &a)?,
            "--b" => config.bm25_b = number(value(&mut args, &a)?, &a)?,
            "--name-len" => config.max_group_name_length = number(value(&mut args, &a)?, &a)?,
            "--snapshot" => snapshot = Some(value(&mut args, &a)?),
            "-h" | "--help" => return Ok(None),
            other if input.is_none() => input = Some(other.to_string()),
            other => warn!(arg = other, "extra argument ignored"),
        }
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(Some(Args { config, input, snapshot }))
}

/// `id \t url \t title [\t pinned]`; blank lines and `#` comments are skipped.
fn parse_tabs(text: &str) -> Vec<Tab> {
    let mut tabs = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(url), Some(title)) => {
                let mut tab = Tab::new(id, url, title);
                tab.pinned = matches!(fields.next().map(str::trim), Some("pinned" | "true" | "1"));
                tabs.push(tab);
            }
            _ => warn!(line = line_no + 1, "malformed tab line skipped"),
        }
    }
    tabs
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn load_engine(snapshot: Option<&str>, config: &Configuration) -> Result<GroupingEngine, String> {
    match snapshot {
        Some(path) if Path::new(path).exists() => {
            let bytes = fs::read(path).map_err(|e| format!("{path}: {e}"))?;
            let engine = EngineSnapshot::from_cbor(&bytes)
                .and_then(GroupingEngine::load)
                .map_err(|e| format!("{path}: {e}"))?;
            info!(path, documents = engine.doc_num(), "snapshot loaded");
            Ok(engine)
        }
        _ => GroupingEngine::from_config(config).map_err(|e| e.to_string()),
    }
}

fn run(args: Args) -> Result<(), String> {
    let start = Instant::now();
    let text = read_input(args.input.as_deref()).map_err(|e| format!("cannot read tabs: {e}"))?;
    let tabs = parse_tabs(&text);

    let mut engine = load_engine(args.snapshot.as_deref(), &args.config)?;
    let outcome = engine.group_tabs(&tabs, &args.config).map_err(|e| e.to_string())?;

    for (id, err) in &outcome.failures {
        eprintln!("[skip] {id}: {err}");
    }
    for group in &outcome.groups {
        println!("{}\t{}", group.name, group.doc_ids.join(","));
    }

    if let Some(path) = args.snapshot.as_deref() {
        let bytes = engine.dump().to_cbor().map_err(|e| e.to_string())?;
        fs::write(path, bytes).map_err(|e| format!("{path}: {e}"))?;
        info!(path, documents = engine.doc_num(), "snapshot saved");
    }

    info!(
        tabs = tabs.len(),
        groups = outcome.groups.len(),
        algorithm = %args.config.grouping_algorithm,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("[error] {msg}");
            print_usage();
            return ExitCode::from(2);
        }
    };
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("[error] {msg}");
            ExitCode::FAILURE
        }
    }
}
