use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use services::{OpenOutcome, ProgressStore, SnapshotService};
use storage::Storage;
use study_core::Course;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Command;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidCourse { raw: String },
    InvalidNumber { name: &'static str, raw: String },
    InvalidRating { raw: String },
    InvalidFile { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidCourse { raw } => {
                write!(f, "invalid --course value: {raw} (expected cst301 or cst303)")
            }
            ArgsError::InvalidNumber { name, raw } => {
                write!(f, "invalid <{name}>: {raw} (expected a number starting at 1)")
            }
            ArgsError::InvalidRating { raw } => {
                write!(f, "invalid rating: {raw} (expected unset, low, medium or high)")
            }
            ArgsError::InvalidFile { raw } => write!(f, "invalid --file value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  study-tracker [--course <id>] [--file <path>] <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  init                                  create the progress file if missing");
    eprintln!("  status                                overall and per-module progress");
    eprintln!("  topics <module>                       list topics in a module");
    eprintln!("  show <module> <topic>                 content and your notes for a topic");
    eprintln!("  done | undone <module> <topic>        mark a topic (un)done");
    eprintln!("  rate <module> <topic> <unset|low|medium|high>");
    eprintln!("  notes <module> <topic> <text>");
    eprintln!("  link-add <module> <topic> <url>");
    eprintln!("  link-rm <module> <topic> <n>");
    eprintln!("  attach <module> <topic> <path>        PNG, JPG or PDF");
    eprintln!("  attach-rm <module> <topic> <n>");
    eprintln!("  extract <module> <topic> <n> <out-path>");
    eprintln!("  questions <module>                    list practice questions");
    eprintln!("  answer <module> <q> <text>");
    eprintln!("  answer-attach <module> <q> <path>");
    eprintln!("  answer-attach-rm <module> <q> <n>");
    eprintln!("  export <path|->                       write a copy of the progress file");
    eprintln!("  import <path>                         replace progress from a saved file");
    eprintln!();
    eprintln!("<module> and <topic> accept a number from the listing, the exact name,");
    eprintln!("or any unique part of the name. Numbers start at 1.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --course cst301");
    eprintln!("  --file   <course>_progress.json in the current directory");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_TRACKER_COURSE, STUDY_TRACKER_FILE,");
    eprintln!("  STUDY_TRACKER_LOG (tracing filter, default warn), STUDY_TRACKER_LOG_JSON=1");
}

/// Values the environment supplies before flags override them.
#[derive(Debug, Default)]
struct EnvDefaults {
    course: Option<String>,
    file: Option<OsString>,
}

impl EnvDefaults {
    fn from_env() -> Self {
        Self {
            course: std::env::var("STUDY_TRACKER_COURSE").ok(),
            file: std::env::var_os("STUDY_TRACKER_FILE"),
        }
    }
}

struct Args {
    course: Course,
    file: Option<PathBuf>,
    command: Command,
}

impl Args {
    fn parse(
        args: impl IntoIterator<Item = String>,
        env: EnvDefaults,
    ) -> Result<Option<Self>, ArgsError> {
        let mut course = match env.course {
            Some(raw) => parse_course(raw)?,
            None => Course::default(),
        };
        let mut file = env
            .file
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        let mut args = args.into_iter().peekable();
        while let Some(arg) = args.next_if(|arg| arg.starts_with('-') && arg != "-") {
            match arg.as_str() {
                "--course" => course = parse_course(require_value(&mut args, "--course")?)?,
                "--file" => {
                    let value = require_value(&mut args, "--file")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidFile { raw: value });
                    }
                    file = Some(PathBuf::from(value));
                }
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let Some(name) = args.next() else {
            return Ok(None);
        };
        let command = Command::parse(&name, &mut args)?;
        if let Some(extra) = args.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self {
            course,
            file,
            command,
        }))
    }
}

fn parse_course(raw: String) -> Result<Course, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidCourse { raw })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STUDY_TRACKER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("STUDY_TRACKER_LOG_JSON")
        .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    // Logs go to stderr; stdout carries command output such as `export -`.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Load saved progress. `import` tolerates an unreadable file so it can
/// replace it; every other command reports it.
async fn open_store(
    command: &Command,
    snapshots: &SnapshotService,
    store: &mut ProgressStore,
) -> Result<OpenOutcome, services::SnapshotServiceError> {
    match command {
        Command::Import { .. } => snapshots.open_or_discard(store).await,
        _ => snapshots.open(store).await,
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), EnvDefaults::from_env()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let Some(parsed) = parsed else {
        print_usage();
        return Ok(());
    };

    let catalog = parsed.course.catalog().map_err(study_core::Error::from)?;
    let file = parsed
        .file
        .unwrap_or_else(|| PathBuf::from(&catalog.export_file_name));
    tracing::debug!(course = %parsed.course, file = %file.display(), "starting");

    let storage = Storage::file(&file);
    let snapshots = SnapshotService::new(Arc::clone(&storage.snapshots));
    let mut store = ProgressStore::new(catalog);
    let outcome = open_store(&parsed.command, &snapshots, &mut store).await?;

    let changed = commands::execute(parsed.command, &mut store).await?;
    if changed || outcome == OpenOutcome::Seeded {
        snapshots.save(&store).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
