use std::fmt;
use std::io::Write as _;
use std::sync::Arc;

use services::{
    AnswerVariant, AppServices, Clock, ContentApiConfig, EmptyReason, NextAction, QuizLaunch,
    QuizRunner, QuizServiceError, QuizView, ResultsHandoff,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};
use trivia_core::model::{Category, CategoryId, Locale, QuizResult};
use trivia_core::session::TickOutcome;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCategory { raw: String },
    InvalidLocale { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
            ArgsError::InvalidLocale { raw } => {
                write!(f, "invalid --locale value (expected en or es): {raw}")
            }
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Categories,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "categories" => Some(Self::Categories),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    category: Option<CategoryId>,
    locale: Option<Locale>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play       [--db <sqlite_url>] [--category <id>] [--locale <en|es>]");
    eprintln!("  cargo run -p app -- categories [--db <sqlite_url>] [--locale <en|es>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://trivia.sqlite3");
    eprintln!("  --locale stored preference, then $LANG, then en");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRIVIA_DB_URL, TRIVIA_CATEGORY, TRIVIA_LOCALE");
    eprintln!("  TRIVIA_CONTENT_URL, TRIVIA_CONTENT_DATASET  # remote question source");
    eprintln!("  RUST_LOG                                    # log filter (default: info)");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TRIVIA_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://trivia.sqlite3".into(), normalize_sqlite_url);
        let mut category = std::env::var("TRIVIA_CATEGORY")
            .ok()
            .and_then(|value| value.parse::<CategoryId>().ok());
        let mut locale = std::env::var("TRIVIA_LOCALE")
            .ok()
            .and_then(|value| value.parse::<Locale>().ok());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--category" => {
                    let value = require_value(args, "--category")?;
                    let parsed = value
                        .parse::<CategoryId>()
                        .map_err(|_| ArgsError::InvalidCategory { raw: value.clone() })?;
                    category = Some(parsed);
                }
                "--locale" => {
                    let value = require_value(args, "--locale")?;
                    let parsed = value
                        .parse::<Locale>()
                        .map_err(|_| ArgsError::InvalidLocale { raw: value.clone() })?;
                    locale = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            category,
            locale,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn device_locale() -> Option<Locale> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find_map(|tag| Locale::from_system_tag(&tag))
}

//
// ─── RESULTS SCREEN ────────────────────────────────────────────────────────────
//

struct TerminalResults;

impl ResultsHandoff for TerminalResults {
    fn hand_off(&self, result: &QuizResult) {
        let rating = result.rating();
        println!();
        println!("{} {}", rating.emoji(), rating.message());
        println!("  Score:    {}", result.score());
        println!(
            "  Correct:  {} / {}  ({}%)",
            result.correct(),
            result.total(),
            result.accuracy_percent()
        );
        println!("  Wrong:    {}", result.wrong());
    }
}

//
// ─── QUIZ SCREEN ───────────────────────────────────────────────────────────────
//

type InputLines = Lines<BufReader<Stdin>>;

fn render(view: &QuizView) {
    println!();
    println!(
        "Question {}/{}   Score {}   ({} correct)",
        view.position, view.total, view.score, view.correct_count
    );
    println!("{}", view.question_text);
    if let Some(url) = view.image_url.as_deref() {
        println!("  [image] {url}");
    }
    for row in &view.answers {
        let marker = match row.variant {
            AnswerVariant::Option(_) => " ",
            AnswerVariant::Correct => "✓",
            AnswerVariant::Incorrect => "✗",
            AnswerVariant::Dimmed => "·",
        };
        println!("  {marker} {}) {}", row.label, row.text);
    }
    if view.revealed {
        if let Some(explanation) = view.explanation.as_deref() {
            println!("  {explanation}");
        }
        match view.next_action {
            Some(NextAction::SeeResults) => println!("Press Enter to see results."),
            _ => println!("Press Enter for the next question."),
        }
    } else {
        prompt_timer(view.time_remaining);
    }
}

fn prompt_timer(time_remaining: u32) {
    print!("\r⏱ {time_remaining:>2}s  answer (A-D, q to quit) > ");
    let _ = std::io::stdout().flush();
}

fn parse_answer(input: &str) -> Option<usize> {
    match input.trim().to_ascii_uppercase().as_str() {
        "A" | "1" => Some(0),
        "B" | "2" => Some(1),
        "C" | "3" => Some(2),
        "D" | "4" => Some(3),
        _ => None,
    }
}

/// Play one session; returns `false` when the player quit early.
async fn play(
    runner: &mut QuizRunner,
    lines: &mut InputLines,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(view) = runner.view() else {
        return Ok(true);
    };
    render(&view);

    loop {
        tokio::select! {
            outcome = runner.next_tick() => match outcome {
                TickOutcome::Counted { time_remaining } => prompt_timer(time_remaining),
                TickOutcome::TimedOut => {
                    println!();
                    println!("Time's up!");
                    if let Some(view) = runner.view() {
                        render(&view);
                    }
                }
                TickOutcome::Ignored => {}
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    runner.close();
                    return Ok(false);
                };
                if line.trim().eq_ignore_ascii_case("q") {
                    runner.close();
                    return Ok(false);
                }

                if runner.session().is_revealed() {
                    runner.advance();
                    if runner.result().is_some() {
                        return Ok(true);
                    }
                } else if let Some(index) = parse_answer(&line) {
                    if runner.submit_answer(index).is_none() {
                        println!("No answer {}.", line.trim());
                    }
                }

                if let Some(view) = runner.view() {
                    render(&view);
                }
            }
        }
    }
}

async fn read_line(lines: &mut InputLines, prompt: &str) -> std::io::Result<Option<String>> {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
    lines.next_line().await
}

async fn category_tree(
    services: &AppServices,
    locale: Locale,
) -> Result<Vec<(Category, usize)>, Box<dyn std::error::Error>> {
    let catalog = services.catalog();
    let mut tree = Vec::new();
    for parent in catalog.top_level(locale).await? {
        let children = catalog.subcategories(parent.id(), locale).await?;
        tree.push((parent, 0));
        tree.extend(children.into_iter().map(|child| (child, 1)));
    }
    Ok(tree)
}

async fn choose_category(
    services: &AppServices,
    locale: Locale,
    lines: &mut InputLines,
) -> Result<Option<CategoryId>, Box<dyn std::error::Error>> {
    let tree = category_tree(services, locale).await?;
    if tree.is_empty() {
        println!("No categories yet. Seed some with `cargo run -p storage --bin seed`.");
        return Ok(None);
    }

    for (number, (category, depth)) in tree.iter().enumerate() {
        println!("{:>3}. {}{}", number + 1, "   ".repeat(*depth), category.title());
    }
    loop {
        let Some(line) = read_line(lines, "Pick a category number > ").await? else {
            return Ok(None);
        };
        let picked = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| tree.get(index));
        if let Some((category, _)) = picked {
            return Ok(Some(category.id().clone()));
        }
    }
}

/// Title shown above a play-through. A failed lookup falls back to the id so
/// the question source still decides whether there is anything to play.
fn category_heading(lookup: Result<Category, QuizServiceError>, id: &CategoryId) -> String {
    match lookup {
        Ok(category) => category.title().to_string(),
        Err(err) => {
            tracing::warn!(category_id = %id, error = %err, "category lookup failed");
            id.to_string()
        }
    }
}

async fn run_play(
    services: &AppServices,
    category: Option<CategoryId>,
    locale: Locale,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let category_id = match category {
        Some(id) => id,
        None => match choose_category(services, locale, &mut lines).await? {
            Some(id) => id,
            None => return Ok(()),
        },
    };
    let lookup = services.catalog().category(&category_id, locale).await;
    println!();
    println!(
        "☕ {}  ({})",
        category_heading(lookup, &category_id),
        locale.display_name()
    );

    loop {
        match services.quiz_loop().start_session(&category_id, locale).await {
            QuizLaunch::Empty(EmptyReason::NoQuestions) => {
                println!("No questions available for this category.");
                return Ok(());
            }
            QuizLaunch::Empty(EmptyReason::SourceUnavailable) => {
                println!("Could not load questions right now. Try again later.");
                return Ok(());
            }
            QuizLaunch::Ready(mut runner) => {
                if !play(&mut runner, &mut lines).await? {
                    return Ok(());
                }
            }
        }

        let again = read_line(&mut lines, "Play again? [y/N] > ").await?;
        if !again.is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")) {
            return Ok(());
        }
    }
}

async fn run_categories(
    services: &AppServices,
    locale: Locale,
) -> Result<(), Box<dyn std::error::Error>> {
    for (category, depth) in category_tree(services, locale).await? {
        println!(
            "{}{}  [{}]",
            "  ".repeat(depth),
            category.title(),
            category.id()
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        ContentApiConfig::from_env(),
        Clock::system(),
        Arc::new(TerminalResults),
    )
    .await?;

    let settings = services.settings();
    let locale = match parsed.locale {
        Some(locale) => {
            settings.set_locale(locale).await?;
            locale
        }
        None => settings.resolve_locale(device_locale()).await?,
    };
    tracing::debug!(%locale, "locale resolved");

    match cmd {
        Command::Play => run_play(&services, parsed.category, locale).await,
        Command::Categories => run_categories(&services, locale).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letters_and_numbers() {
        assert_eq!(parse_answer(" b "), Some(1));
        assert_eq!(parse_answer("4"), Some(3));
        assert_eq!(parse_answer("e"), None);
    }

    #[test]
    fn heading_falls_back_to_the_id_when_lookup_fails() {
        let id = CategoryId::new("cold-brew");
        assert_eq!(
            category_heading(Err(QuizServiceError::UnknownCategory(id.clone())), &id),
            "cold-brew"
        );
        let offline = QuizServiceError::Storage(storage::repository::StorageError::Connection(
            "offline".into(),
        ));
        assert_eq!(category_heading(Err(offline), &id), "cold-brew");

        let found = trivia_core::model::CategoryDocument {
            id: id.clone(),
            title: trivia_core::model::LocalizedText::en("Cold Brew"),
            slug: "cold-brew".into(),
            description: None,
            parent_id: None,
            color: None,
            icon: None,
            order: 0,
            time_limit_secs: None,
            image_url: None,
        }
        .localize(Locale::En)
        .unwrap();
        assert_eq!(category_heading(Ok(found), &id), "Cold Brew");
    }

    #[test]
    fn keeps_explicit_sqlite_urls() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/trivia.db".into()),
            "sqlite:///tmp/trivia.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/data/trivia.db".into()),
            "sqlite:///var/data/trivia.db"
        );
    }
}
