use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use services::{
    Dashboard, ProgressError, ProgressStore, QuestionField, QuestionList, SnapshotService,
    TopicField, TopicList, TopicListItem,
};
use study_core::model::{AttachmentPreview, ConfidenceRating};

use crate::ArgsError;

/// One user action. Every mutating command touches exactly one record.
#[derive(Debug)]
pub(crate) enum Command {
    Init,
    Status,
    Topics { module: String },
    Show { module: String, topic: String },
    SetDone { module: String, topic: String, done: bool },
    Rate { module: String, topic: String, rating: ConfidenceRating },
    Notes { module: String, topic: String, text: String },
    LinkAdd { module: String, topic: String, url: String },
    LinkRemove { module: String, topic: String, index: usize },
    Attach { module: String, topic: String, path: PathBuf },
    AttachRemove { module: String, topic: String, index: usize },
    Extract { module: String, topic: String, index: usize, out: PathBuf },
    Questions { module: String },
    Answer { module: String, question: usize, text: String },
    AnswerAttach { module: String, question: usize, path: PathBuf },
    AnswerAttachRemove { module: String, question: usize, index: usize },
    Export { path: String },
    Import { path: PathBuf },
}

fn next_arg(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
    name: &'static str,
) -> Result<String, ArgsError> {
    args.next()
        .ok_or(ArgsError::MissingArgument { command, name })
}

/// Parse a 1-based position into a 0-based index.
fn position(raw: String, name: &'static str) -> Result<usize, ArgsError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ArgsError::InvalidNumber { name, raw }),
    }
}

impl Command {
    pub(crate) fn parse(
        name: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        macro_rules! arg {
            ($cmd:literal, $name:literal) => {
                next_arg(args, $cmd, $name)?
            };
        }

        let command = match name {
            "init" => Command::Init,
            "status" => Command::Status,
            "topics" => Command::Topics {
                module: arg!("topics", "module"),
            },
            "show" => Command::Show {
                module: arg!("show", "module"),
                topic: arg!("show", "topic"),
            },
            "done" => Command::SetDone {
                module: arg!("done", "module"),
                topic: arg!("done", "topic"),
                done: true,
            },
            "undone" => Command::SetDone {
                module: arg!("undone", "module"),
                topic: arg!("undone", "topic"),
                done: false,
            },
            "rate" => {
                let module = arg!("rate", "module");
                let topic = arg!("rate", "topic");
                let raw = arg!("rate", "rating");
                let rating = raw.parse().map_err(|_| ArgsError::InvalidRating { raw })?;
                Command::Rate {
                    module,
                    topic,
                    rating,
                }
            }
            "notes" => Command::Notes {
                module: arg!("notes", "module"),
                topic: arg!("notes", "topic"),
                text: arg!("notes", "text"),
            },
            "link-add" => Command::LinkAdd {
                module: arg!("link-add", "module"),
                topic: arg!("link-add", "topic"),
                url: arg!("link-add", "url"),
            },
            "link-rm" => Command::LinkRemove {
                module: arg!("link-rm", "module"),
                topic: arg!("link-rm", "topic"),
                index: position(arg!("link-rm", "n"), "n")?,
            },
            "attach" => Command::Attach {
                module: arg!("attach", "module"),
                topic: arg!("attach", "topic"),
                path: arg!("attach", "path").into(),
            },
            "attach-rm" => Command::AttachRemove {
                module: arg!("attach-rm", "module"),
                topic: arg!("attach-rm", "topic"),
                index: position(arg!("attach-rm", "n"), "n")?,
            },
            "extract" => Command::Extract {
                module: arg!("extract", "module"),
                topic: arg!("extract", "topic"),
                index: position(arg!("extract", "n"), "n")?,
                out: arg!("extract", "out-path").into(),
            },
            "questions" => Command::Questions {
                module: arg!("questions", "module"),
            },
            "answer" => Command::Answer {
                module: arg!("answer", "module"),
                question: position(arg!("answer", "q"), "q")?,
                text: arg!("answer", "text"),
            },
            "answer-attach" => Command::AnswerAttach {
                module: arg!("answer-attach", "module"),
                question: position(arg!("answer-attach", "q"), "q")?,
                path: arg!("answer-attach", "path").into(),
            },
            "answer-attach-rm" => Command::AnswerAttachRemove {
                module: arg!("answer-attach-rm", "module"),
                question: position(arg!("answer-attach-rm", "q"), "q")?,
                index: position(arg!("answer-attach-rm", "n"), "n")?,
            },
            "export" => Command::Export {
                path: arg!("export", "path"),
            },
            "import" => Command::Import {
                path: arg!("import", "path").into(),
            },
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

//
// ─── NAME RESOLUTION ───────────────────────────────────────────────────────────
//

#[derive(Debug)]
struct AmbiguousName {
    kind: &'static str,
    needle: String,
    matches: Vec<String>,
}

impl fmt::Display for AmbiguousName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} matches more than one {}: {}",
            self.needle,
            self.kind,
            self.matches.join(", ")
        )
    }
}

impl Error for AmbiguousName {}

enum Resolved {
    Found(String),
    Missing,
    Ambiguous(Vec<String>),
}

/// Pick a name by 1-based number, exact name, or unique case-insensitive part.
fn resolve<'a>(names: impl Iterator<Item = &'a str> + Clone, needle: &str) -> Resolved {
    let needle = needle.trim();
    if let Ok(n) = needle.parse::<usize>() {
        if let Some(name) = n.checked_sub(1).and_then(|i| names.clone().nth(i)) {
            return Resolved::Found(name.to_string());
        }
    }
    if let Some(name) = names.clone().find(|name| *name == needle) {
        return Resolved::Found(name.to_string());
    }
    let lowered = needle.to_lowercase();
    let mut matches: Vec<String> = names
        .filter(|name| name.to_lowercase().contains(&lowered))
        .map(str::to_string)
        .collect();
    match matches.len() {
        0 => Resolved::Missing,
        1 => Resolved::Found(matches.remove(0)),
        _ => Resolved::Ambiguous(matches),
    }
}

fn resolve_module(store: &ProgressStore, needle: &str) -> Result<String, Box<dyn Error>> {
    let snapshot = store.snapshot().ok_or(ProgressError::NotInitialized)?;
    match resolve(snapshot.modules.keys().map(String::as_str), needle) {
        Resolved::Found(name) => Ok(name),
        Resolved::Missing => Err(ProgressError::ModuleNotFound {
            module: needle.to_string(),
        }
        .into()),
        Resolved::Ambiguous(matches) => Err(AmbiguousName {
            kind: "module",
            needle: needle.to_string(),
            matches,
        }
        .into()),
    }
}

fn resolve_question_module(store: &ProgressStore, needle: &str) -> Result<String, Box<dyn Error>> {
    let snapshot = store.snapshot().ok_or(ProgressError::NotInitialized)?;
    match resolve(snapshot.questions.keys().map(String::as_str), needle) {
        Resolved::Found(name) => Ok(name),
        Resolved::Missing => Err(ProgressError::ModuleNotFound {
            module: needle.to_string(),
        }
        .into()),
        Resolved::Ambiguous(matches) => Err(AmbiguousName {
            kind: "module",
            needle: needle.to_string(),
            matches,
        }
        .into()),
    }
}

fn resolve_topic(
    store: &ProgressStore,
    module: &str,
    topic: &str,
) -> Result<(String, String), Box<dyn Error>> {
    let module = resolve_module(store, module)?;
    let topics = store
        .snapshot()
        .and_then(|s| s.modules.get(&module))
        .ok_or_else(|| ProgressError::ModuleNotFound {
            module: module.clone(),
        })?;
    match resolve(topics.keys().map(String::as_str), topic) {
        Resolved::Found(name) => Ok((module, name)),
        Resolved::Missing => Err(ProgressError::TopicNotFound {
            module,
            topic: topic.to_string(),
        }
        .into()),
        Resolved::Ambiguous(matches) => Err(AmbiguousName {
            kind: "topic",
            needle: topic.to_string(),
            matches,
        }
        .into()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

//
// ─── EXECUTION ─────────────────────────────────────────────────────────────────
//

/// Run one command against the store. Returns whether the store changed.
pub(crate) async fn execute(
    command: Command,
    store: &mut ProgressStore,
) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Init => {
            println!("Progress ready for {}.", store.catalog().title);
            Ok(false)
        }
        Command::Status => {
            print_dashboard(&Dashboard::from_store(store));
            Ok(false)
        }
        Command::Topics { module } => {
            let module = resolve_module(store, &module)?;
            print_topics(store, &module);
            Ok(false)
        }
        Command::Show { module, topic } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            print_topic(store, &module, &topic)?;
            Ok(false)
        }
        Command::SetDone {
            module,
            topic,
            done,
        } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            store.set_topic_field(&module, &topic, TopicField::Done(done))?;
            let completion = store.completion();
            println!(
                "{} {topic}. {} / {} topics completed.",
                if done { "Completed" } else { "Reopened" },
                completion.completed,
                completion.total
            );
            Ok(true)
        }
        Command::Rate {
            module,
            topic,
            rating,
        } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            let record = store.set_topic_field(&module, &topic, TopicField::Confidence(rating))?;
            println!(
                "Confidence for {topic}: {}",
                record.confidence.label().unwrap_or("unset")
            );
            Ok(true)
        }
        Command::Notes {
            module,
            topic,
            text,
        } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            store.set_topic_field(&module, &topic, TopicField::Notes(text))?;
            println!("Saved notes for {topic}.");
            Ok(true)
        }
        Command::LinkAdd { module, topic, url } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            let record =
                store.append_to_topic_list(&module, &topic, TopicListItem::Link(url))?;
            println!("{topic} now has {} link(s).", record.links.len());
            Ok(true)
        }
        Command::LinkRemove {
            module,
            topic,
            index,
        } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            let record =
                store.remove_from_topic_list_at(&module, &topic, TopicList::Links, index)?;
            println!("{topic} now has {} link(s).", record.links.len());
            Ok(true)
        }
        Command::Attach {
            module,
            topic,
            path,
        } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            let bytes = tokio::fs::read(&path).await?;
            let record = store.attach_topic_file(&module, &topic, &file_name(&path), &bytes)?;
            println!("{topic} now has {} file(s).", record.attachments.len());
            Ok(true)
        }
        Command::AttachRemove {
            module,
            topic,
            index,
        } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            let record =
                store.remove_from_topic_list_at(&module, &topic, TopicList::Attachments, index)?;
            println!("{topic} now has {} file(s).", record.attachments.len());
            Ok(true)
        }
        Command::Extract {
            module,
            topic,
            index,
            out,
        } => {
            let (module, topic) = resolve_topic(store, &module, &topic)?;
            let record = store.topic(&module, &topic)?;
            let attachment =
                record
                    .attachments
                    .get(index)
                    .ok_or(ProgressError::IndexOutOfRange {
                        list: "attachment",
                        index,
                        len: record.attachments.len(),
                    })?;
            let bytes = attachment.bytes()?;
            tokio::fs::write(&out, &bytes).await?;
            println!("Wrote {} ({} bytes) to {}.", attachment.name, bytes.len(), out.display());
            Ok(false)
        }
        Command::Questions { module } => {
            let module = resolve_question_module(store, &module)?;
            print_questions(store, &module)?;
            Ok(false)
        }
        Command::Answer {
            module,
            question,
            text,
        } => {
            let module = resolve_question_module(store, &module)?;
            store.set_question_field(&module, question, QuestionField::AnswerText(text))?;
            println!("Saved answer for question {}.", question + 1);
            Ok(true)
        }
        Command::AnswerAttach {
            module,
            question,
            path,
        } => {
            let module = resolve_question_module(store, &module)?;
            let bytes = tokio::fs::read(&path).await?;
            let record = store.attach_question_file(&module, question, &file_name(&path), &bytes)?;
            println!(
                "Question {} now has {} solution file(s).",
                question + 1,
                record.attachments.len()
            );
            Ok(true)
        }
        Command::AnswerAttachRemove {
            module,
            question,
            index,
        } => {
            let module = resolve_question_module(store, &module)?;
            let record = store.remove_from_question_list_at(
                &module,
                question,
                QuestionList::Attachments,
                index,
            )?;
            println!(
                "Question {} now has {} solution file(s).",
                question + 1,
                record.attachments.len()
            );
            Ok(true)
        }
        Command::Export { path } => {
            let text = SnapshotService::export_text(store)?;
            if path == "-" {
                println!("{text}");
            } else {
                tokio::fs::write(&path, text).await?;
                println!("Saved a copy of your progress to {path}.");
            }
            Ok(false)
        }
        Command::Import { path } => {
            let text = tokio::fs::read_to_string(&path).await?;
            SnapshotService::import_text(store, &text)?;
            println!("Progress loaded from {}.", path.display());
            Ok(true)
        }
    }
}

//
// ─── OUTPUT ────────────────────────────────────────────────────────────────────
//

const BAR_WIDTH: usize = 30;

fn print_dashboard(dashboard: &Dashboard) {
    let completion = dashboard.completion;
    let filled = if completion.total == 0 {
        0
    } else {
        completion.completed * BAR_WIDTH / completion.total
    };
    println!("{}", dashboard.course_title);
    println!(
        "[{}{}] {} / {} topics completed ({}%)",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        completion.completed,
        completion.total,
        completion.percent()
    );
    println!();
    println!("Self-assessment (completed topics):");
    println!("  {:<32}{}", ConfidenceRating::LOW_LABEL, dashboard.confidence.low);
    println!("  {:<32}{}", ConfidenceRating::MEDIUM_LABEL, dashboard.confidence.medium);
    println!("  {:<32}{}", ConfidenceRating::HIGH_LABEL, dashboard.confidence.high);
    println!();
    println!("Modules:");
    for (i, module) in dashboard.modules.iter().enumerate() {
        println!(
            "  {}. {} ({}/{})",
            i + 1,
            module.name,
            module.completion.completed,
            module.completion.total
        );
    }
    println!();
    println!(
        "Practice questions attempted: {} / {}",
        dashboard.answered_questions, dashboard.question_count
    );
}

fn print_topics(store: &ProgressStore, module: &str) {
    let Some(topics) = store.snapshot().and_then(|s| s.modules.get(module)) else {
        return;
    };
    println!("{module}");
    for (i, (name, record)) in topics.iter().enumerate() {
        let mark = if record.done { "x" } else { " " };
        match record.effective_confidence() {
            ConfidenceRating::Unset => println!("  {}. [{mark}] {name}", i + 1),
            rating => println!("  {}. [{mark}] {name} ({rating})", i + 1),
        }
    }
}

fn print_topic(store: &ProgressStore, module: &str, topic: &str) -> Result<(), ProgressError> {
    let record = store.topic(module, topic)?;
    println!("{module} / {topic}");
    println!("Done: {}", if record.done { "yes" } else { "no" });
    if record.done {
        println!(
            "Confidence: {}",
            record.confidence.label().unwrap_or("unset")
        );
    }
    println!();
    println!("## Definition\n{}\n", record.definition);
    println!("## PYQ focus\n{}\n", record.pyq_focus);
    println!("## Strategy\n{}\n", record.strategy);
    println!("## My notes");
    if record.notes.is_empty() {
        println!("(none)");
    } else {
        println!("{}", record.notes);
    }
    println!();
    println!("## My links");
    for (i, link) in record.links.iter().enumerate() {
        println!("  {}. {link}", i + 1);
    }
    println!();
    println!("## My files");
    if record.attachments.is_empty() {
        println!("(no media uploaded for this topic yet)");
    }
    for (i, attachment) in record.attachments.iter().enumerate() {
        let detail = match attachment.preview() {
            AttachmentPreview::Image { bytes } => format!("image, {} bytes", bytes.len()),
            AttachmentPreview::Pdf { .. } => "pdf".to_string(),
            AttachmentPreview::Unsupported => "no preview for this file type".to_string(),
            AttachmentPreview::Broken { reason } => format!("cannot display: {reason}"),
        };
        println!("  {}. {} ({detail})", i + 1, attachment.name);
    }
    Ok(())
}

fn print_questions(store: &ProgressStore, module: &str) -> Result<(), ProgressError> {
    println!("{module}");
    for (i, question) in store.questions(module)?.iter().enumerate() {
        let mark = if question.is_answered() { "x" } else { " " };
        println!("  {}. [{mark}] {}", i + 1, question.prompt);
        for (j, file) in question.attachments.iter().enumerate() {
            println!("       {}.{} {}", i + 1, j + 1, file.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::Course;

    fn store() -> ProgressStore {
        let mut store = ProgressStore::new(Course::Cst301.catalog().unwrap());
        store.initialize();
        store
    }

    fn args(items: &[&str]) -> impl Iterator<Item = String> {
        items
            .iter()
            .map(|s| (*s).to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn positions_are_one_based() {
        let cmd = Command::parse("link-rm", &mut args(&["1", "2", "3"])).unwrap();
        assert!(matches!(cmd, Command::LinkRemove { index: 2, .. }));
        assert!(matches!(
            Command::parse("link-rm", &mut args(&["1", "2", "0"])),
            Err(ArgsError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn rate_rejects_unknown_levels() {
        assert!(matches!(
            Command::parse("rate", &mut args(&["1", "1", "meh"])),
            Err(ArgsError::InvalidRating { .. })
        ));
        let cmd = Command::parse("rate", &mut args(&["1", "1", "High"])).unwrap();
        assert!(matches!(
            cmd,
            Command::Rate {
                rating: ConfidenceRating::High,
                ..
            }
        ));
    }

    #[test]
    fn missing_arguments_are_reported() {
        assert!(matches!(
            Command::parse("show", &mut args(&["1"])),
            Err(ArgsError::MissingArgument { name: "topic", .. })
        ));
    }

    #[test]
    fn missing_arguments_name_the_command_typed() {
        assert!(matches!(
            Command::parse("undone", &mut args(&["1"])),
            Err(ArgsError::MissingArgument {
                command: "undone",
                name: "topic"
            })
        ));
        assert!(matches!(
            Command::parse("done", &mut args(&[])),
            Err(ArgsError::MissingArgument {
                command: "done",
                name: "module"
            })
        ));
        assert!(matches!(
            Command::parse("undone", &mut args(&["1", "2"])).unwrap(),
            Command::SetDone { done: false, .. }
        ));
    }

    #[test]
    fn resolves_by_number_name_or_unique_part() {
        let store = store();
        assert_eq!(
            resolve_module(&store, "2").unwrap(),
            "Module 2: More on Regular Languages"
        );
        assert_eq!(
            resolve_module(&store, "turing").unwrap(),
            "Module 5: Turing Machines"
        );
        assert!(resolve_module(&store, "Regular").is_err());
        assert!(resolve_module(&store, "quantum").is_err());

        let (module, topic) = resolve_topic(&store, "1", "(DFA)").unwrap();
        assert_eq!(module, "Module 1: Regular Languages");
        assert_eq!(topic, "Deterministic Finite State Automata (DFA)");
    }

    #[tokio::test]
    async fn mutating_commands_report_changes() {
        let mut store = store();
        let changed = execute(
            Command::SetDone {
                module: "1".into(),
                topic: "1".into(),
                done: true,
            },
            &mut store,
        )
        .await
        .unwrap();
        assert!(changed);
        assert_eq!(store.completion().completed, 1);

        let changed = execute(Command::Status, &mut store).await.unwrap();
        assert!(!changed);
    }
}
