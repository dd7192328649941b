//! plog - Tool for inspecting and replaying perception log archives.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use perception_log::inspect::{collect_channels, get_data, print_file_info, Tree};
use perception_log::playback::{DisplaySink, FrameDumpSink, HeadlessSink, ImageDecoder, Playback};
use perception_log::{open_log, Container, InspectorConfig};

/// Global options parsed before the command.
struct Options {
    level: &'static str,
    config: Option<PathBuf>,
    args: Vec<String>,
}

fn parse_options(raw: &[String]) -> Result<Options> {
    let mut level = "info";
    let mut config = None;
    let mut args = Vec::new();

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "--config" => {
                let path = iter.next().context("--config needs a file argument")?;
                config = Some(PathBuf::from(path));
            }
            _ => args.push(arg.clone()),
        }
    }
    Ok(Options { level, config, args })
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("perception_log={level},plog={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();

    let options = match parse_options(&raw) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    init_logging(options.level);

    if let Err(e) = run(options) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(options: Options) -> Result<()> {
    let config = match &options.config {
        Some(p) => InspectorConfig::load_from(p)
            .with_context(|| format!("failed to load config {}", p.display()))?,
        None => InspectorConfig::load(),
    };

    let args: Vec<&str> = options.args.iter().map(String::as_str).collect();
    let Some((&command, rest)) = args.split_first() else {
        print_help();
        return Ok(());
    };

    match command {
        "list" | "l" => cmd_list(&config),
        "info" | "i" => cmd_info(&config, rest.first().copied()),
        "tree" | "t" => cmd_tree(&config, rest.first().copied()),
        "channels" | "c" => {
            let json = has_flag(rest, &["--json", "-j"]);
            let file = positional(rest).first().copied();
            cmd_channels(&config, file, json)
        }
        "stack" | "s" => {
            let json = has_flag(rest, &["--json", "-j"]);
            match positional(rest).as_slice() {
                [file, namespace] => cmd_stack(&config, Some(*file), namespace, json),
                [namespace] => cmd_stack(&config, None, namespace, json),
                _ => bail!("usage: plog stack [file] <namespace> [--json]"),
            }
        }
        "play" | "p" => cmd_play(&config, rest),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            print_version();
            Ok(())
        }
        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(&config, Some(other))
            } else {
                print_help();
                bail!("unknown command: {other}")
            }
        }
    }
}

fn print_help() {
    println!("plog - perception log inspector");
    println!();
    println!("USAGE:");
    println!("    plog [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    l, list                               List log files in the configured directory");
    println!("    i, info     [file]                    Show per-group summary table");
    println!("    t, tree     [file]                    List all groups, then all datasets");
    println!("    c, channels [file] [--json]           List groups holding frame sequences");
    println!("    s, stack    [file] <ns> [--json]      Stack numbered frames of a namespace");
    println!("    p, play     [file] <channel>...       Replay image channels ('q' to stop)");
    println!("          --dump <dir>                    Write frames as PNG instead of showing them");
    println!("          --window                        Show frames in a window (feature `window`)");
    println!("    h, help                               Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose      Debug output");
    println!("    -vv, --trace       Trace output (very verbose)");
    println!("    -q, --quiet        Errors only");
    println!("    --config <file>    Use this config file instead of the default");
    println!();
    println!("Without [file], the configured log_dir/log_file is opened.");
    println!("Files ending in .hdf5/.h5 are read as HDF5 (feature `hdf5`).");
}

fn print_version() {
    println!(
        "plog {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("PLOG_BUILD_DATE"),
        env!("PLOG_BUILD_TIME")
    );
}

fn has_flag(args: &[&str], names: &[&str]) -> bool {
    args.iter().any(|a| names.contains(a))
}

fn positional<'a>(args: &[&'a str]) -> Vec<&'a str> {
    args.iter().copied().filter(|a| !a.starts_with('-')).collect()
}

/// An opened log and where it came from.
struct OpenLog {
    path: PathBuf,
    container: Box<dyn Container>,
}

impl OpenLog {
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn open(config: &InspectorConfig, file: Option<&str>) -> Result<OpenLog> {
    let path = config.resolve(file.map(Path::new))?;
    tracing::info!("Opening archive: {}", path.display());
    let container = open_log(&path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(OpenLog { path, container })
}

fn cmd_list(config: &InspectorConfig) -> Result<()> {
    let logs = config
        .list_logs()
        .with_context(|| format!("failed to list {}", config.log_dir.display()))?;
    println!("Directory: {}", config.log_dir.display());
    for (i, log) in logs.iter().enumerate() {
        let name = log.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("File: {} {}", i, name);
    }
    if logs.is_empty() {
        println!("(no log files)");
    }
    Ok(())
}

fn cmd_info(config: &InspectorConfig, file: Option<&str>) -> Result<()> {
    let log = open(config, file)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    print_file_info(&log.container, &log.file_name(), &mut out)?;
    out.flush()?;
    Ok(())
}

fn cmd_tree(config: &InspectorConfig, file: Option<&str>) -> Result<()> {
    let log = open(config, file)?;
    let tree = Tree::collect(&log.container)?;

    println!("Archive: {}", log.path.display());
    println!();
    println!("Groups ({}):", tree.groups.len());
    for g in &tree.groups {
        println!("  {}", g);
    }
    println!();
    println!("Datasets ({}):", tree.datasets.len());
    for d in &tree.datasets {
        match log.container.node(d)? {
            perception_log::Node::Dataset { dtype, shape } => println!("  {:<60} {:<8} {:?}", d, dtype, shape),
            perception_log::Node::Group { .. } => println!("  {}", d),
        }
    }
    Ok(())
}

fn cmd_channels(config: &InspectorConfig, file: Option<&str>, json: bool) -> Result<()> {
    let log = open(config, file)?;
    let channels = collect_channels(&log.container, &config.channel_rules())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&channels)?);
        return Ok(());
    }

    println!("{:<45} {:<10} {:<8} {:<8}", "Channel", "Count", "Type", "Inferred");
    for c in &channels {
        println!("{:<45} {:<10} {:<8} {:<8}", c.name, c.count, c.dtype, c.inferred);
    }
    println!();
    println!("Total channels: {}", channels.len());
    Ok(())
}

fn cmd_stack(config: &InspectorConfig, file: Option<&str>, namespace: &str, json: bool) -> Result<()> {
    let log = open(config, file)?;
    let stacked = get_data(&log.container, namespace)?;

    if json {
        let doc = serde_json::json!({
            "namespace": namespace,
            "dtype": stacked.dtype().name(),
            "rows": stacked.rows(),
            "cols": stacked.cols(),
            "data": stacked.to_f64_rows(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Namespace: {}", namespace);
    println!("Shape: ({}, {})  dtype: {}", stacked.rows(), stacked.cols(), stacked.dtype());
    for (i, row) in stacked.to_f64_rows().iter().enumerate() {
        println!("  [{:>5}] {:?}", i, row);
    }
    Ok(())
}

/// Arguments of the `play` command.
#[derive(Debug, PartialEq, Eq)]
struct PlayArgs<'a> {
    file: Option<&'a str>,
    channels: Vec<&'a str>,
    dump: Option<PathBuf>,
    window: bool,
}

/// Split `play` arguments. A first positional naming an existing file
/// (per `is_file`) is the log; the remaining positionals are channels.
fn parse_play_args<'a>(rest: &[&'a str], is_file: impl Fn(&str) -> bool) -> Result<PlayArgs<'a>> {
    let mut dump = None;
    let mut window = false;
    let mut positional = Vec::new();

    let mut iter = rest.iter();
    while let Some(&arg) = iter.next() {
        match arg {
            "--dump" | "-d" => {
                let dir = iter.next().context("--dump needs a directory")?;
                dump = Some(PathBuf::from(dir));
            }
            "--window" | "-w" => window = true,
            _ => positional.push(arg),
        }
    }

    let (file, channels) = match positional.split_first() {
        Some((&first, tail)) if is_file(first) => (Some(first), tail.to_vec()),
        _ => (None, positional),
    };
    if channels.is_empty() {
        bail!("usage: plog play [file] <channel>... [--dump <dir>] [--window]");
    }
    Ok(PlayArgs {
        file,
        channels,
        dump,
        window,
    })
}

fn cmd_play(config: &InspectorConfig, rest: &[&str]) -> Result<()> {
    let args = parse_play_args(rest, |p| Path::new(p).is_file())?;

    let log = open(config, args.file)?;
    let sink = make_sink(args.dump, args.window)?;
    let report = Playback::new(&log.container, &args.channels, ImageDecoder, sink)?
        .with_options(config.playback_options())
        .run()?;

    println!(
        "Played {} rounds, {} frames ({} undecodable), stopped: {:?}",
        report.rounds, report.frames_rendered, report.decode_failures, report.stop
    );
    Ok(())
}

fn make_sink(dump: Option<PathBuf>, window: bool) -> Result<Box<dyn DisplaySink>> {
    if let Some(dir) = dump {
        return Ok(Box::new(FrameDumpSink::new(&dir)?));
    }
    if window {
        #[cfg(feature = "window")]
        {
            return Ok(Box::new(perception_log::playback::WindowSink::new("Perception Log")));
        }
        #[cfg(not(feature = "window"))]
        {
            bail!("window display not available. Rebuild with: cargo build --features window");
        }
    }
    Ok(Box::new(HeadlessSink::new()))
}
