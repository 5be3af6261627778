use std::fmt;

use storage::repository::Storage;
use trivia_core::model::{
    AnswerDocument, AnswerKey, CategoryDocument, CategoryId, Locale, LocalizedText,
    QuestionDocument, QuestionId,
};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    time_limit_secs: Option<u32>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTimeLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTimeLimit { raw } => write!(f, "invalid --time-limit value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TRIVIA_DB_URL").unwrap_or_else(|_| "sqlite:trivia.sqlite3?mode=rwc".into());
        let mut time_limit_secs = std::env::var("TRIVIA_TIME_LIMIT")
            .ok()
            .and_then(|value| value.parse::<u32>().ok());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--time-limit" => {
                    let value = require_value(&mut args, "--time-limit")?;
                    let parsed = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidTimeLimit { raw: value.clone() })?;
                    time_limit_secs = Some(parsed);
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
            time_limit_secs,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:trivia.sqlite3?mode=rwc)");
    eprintln!("  --time-limit <secs>       Per-question limit for the seeded categories");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TRIVIA_DB_URL, TRIVIA_TIME_LIMIT");
}

fn text(en: &str, es: &str) -> LocalizedText {
    LocalizedText::en(en).with(Locale::Es, es)
}

fn category(
    id: &str,
    title: LocalizedText,
    parent: Option<&str>,
    color: &str,
    order: i32,
    time_limit_secs: Option<u32>,
) -> CategoryDocument {
    CategoryDocument {
        id: CategoryId::new(id),
        title,
        slug: id.to_string(),
        description: None,
        parent_id: parent.map(CategoryId::new),
        color: Some(color.to_string()),
        icon: None,
        order,
        time_limit_secs,
        image_url: None,
    }
}

struct Sample {
    id: &'static str,
    category: &'static str,
    prompt: (&'static str, &'static str),
    answers: [(&'static str, &'static str); 4],
    correct: usize,
    explanation: (&'static str, &'static str),
}

const SAMPLES: &[Sample] = &[
    Sample {
        id: "origins-ethiopia",
        category: "origins",
        prompt: (
            "Where is coffee believed to have originated?",
            "¿Dónde se cree que se originó el café?",
        ),
        answers: [
            ("Ethiopia", "Etiopía"),
            ("Brazil", "Brasil"),
            ("Colombia", "Colombia"),
            ("Vietnam", "Vietnam"),
        ],
        correct: 0,
        explanation: (
            "Legend places the discovery of coffee in the Ethiopian highlands.",
            "La leyenda sitúa el descubrimiento del café en las tierras altas de Etiopía.",
        ),
    },
    Sample {
        id: "origins-top-producer",
        category: "origins",
        prompt: (
            "Which country produces the most coffee?",
            "¿Qué país produce más café?",
        ),
        answers: [
            ("Vietnam", "Vietnam"),
            ("Brazil", "Brasil"),
            ("Indonesia", "Indonesia"),
            ("Kenya", "Kenia"),
        ],
        correct: 1,
        explanation: (
            "Brazil has led world production for over 150 years.",
            "Brasil lidera la producción mundial desde hace más de 150 años.",
        ),
    },
    Sample {
        id: "beans-arabica",
        category: "origins",
        prompt: (
            "Which species makes up most of the world's coffee?",
            "¿Qué especie constituye la mayor parte del café del mundo?",
        ),
        answers: [
            ("Robusta", "Robusta"),
            ("Liberica", "Liberica"),
            ("Arabica", "Arábica"),
            ("Excelsa", "Excelsa"),
        ],
        correct: 2,
        explanation: (
            "Arabica accounts for roughly 60% of global production.",
            "El arábica representa aproximadamente el 60% de la producción mundial.",
        ),
    },
    Sample {
        id: "espresso-ristretto",
        category: "espresso",
        prompt: ("What is a ristretto?", "¿Qué es un ristretto?"),
        answers: [
            ("A shorter, more concentrated espresso", "Un espresso más corto y concentrado"),
            ("An espresso with milk foam", "Un espresso con espuma de leche"),
            ("A long espresso with hot water", "Un espresso largo con agua caliente"),
            ("A cold-brewed espresso", "Un espresso en frío"),
        ],
        correct: 0,
        explanation: (
            "A ristretto uses the same dose with about half the water.",
            "Un ristretto usa la misma dosis con aproximadamente la mitad de agua.",
        ),
    },
    Sample {
        id: "espresso-pressure",
        category: "espresso",
        prompt: (
            "What pressure does a typical espresso machine brew at?",
            "¿A qué presión extrae una máquina de espresso típica?",
        ),
        answers: [
            ("3 bar", "3 bar"),
            ("9 bar", "9 bar"),
            ("15 bar", "15 bar"),
            ("25 bar", "25 bar"),
        ],
        correct: 1,
        explanation: (
            "Around 9 bar is the standard brewing pressure.",
            "Alrededor de 9 bar es la presión de extracción estándar.",
        ),
    },
    Sample {
        id: "espresso-crema",
        category: "espresso",
        prompt: (
            "What is the golden foam on top of an espresso called?",
            "¿Cómo se llama la espuma dorada sobre un espresso?",
        ),
        answers: [
            ("Microfoam", "Microespuma"),
            ("Bloom", "Floración"),
            ("Crema", "Crema"),
            ("Latte art", "Arte latte"),
        ],
        correct: 2,
        explanation: (
            "Crema forms from emulsified oils and CO2 released under pressure.",
            "La crema se forma con aceites emulsionados y CO2 liberado bajo presión.",
        ),
    },
    Sample {
        id: "brewing-french-press",
        category: "brewing",
        prompt: (
            "Which grind suits a French press best?",
            "¿Qué molienda es mejor para una prensa francesa?",
        ),
        answers: [
            ("Extra fine", "Extra fina"),
            ("Fine", "Fina"),
            ("Medium", "Media"),
            ("Coarse", "Gruesa"),
        ],
        correct: 3,
        explanation: (
            "A coarse grind keeps the brew from passing through the mesh filter.",
            "Una molienda gruesa evita que el café pase por el filtro de malla.",
        ),
    },
    Sample {
        id: "brewing-water-temp",
        category: "brewing",
        prompt: (
            "What is the ideal water temperature for brewing?",
            "¿Cuál es la temperatura ideal del agua para preparar café?",
        ),
        answers: [
            ("70-75 °C", "70-75 °C"),
            ("80-85 °C", "80-85 °C"),
            ("90-96 °C", "90-96 °C"),
            ("100 °C", "100 °C"),
        ],
        correct: 2,
        explanation: (
            "Just off the boil extracts flavour without scorching the grounds.",
            "Justo por debajo del hervor extrae el sabor sin quemar el café.",
        ),
    },
];

fn question(sample: &Sample) -> QuestionDocument {
    QuestionDocument {
        id: QuestionId::new(sample.id),
        category_id: CategoryId::new(sample.category),
        text: text(sample.prompt.0, sample.prompt.1),
        answers: sample
            .answers
            .iter()
            .zip(["a", "b", "c", "d"])
            .map(|((en, es), key)| AnswerDocument {
                key: AnswerKey::new(key),
                text: text(en, es),
            })
            .collect(),
        correct_answer_index: sample.correct,
        explanation: Some(text(sample.explanation.0, sample.explanation.1)),
        image_url: None,
        time_limit_secs: None,
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let categories = [
        category("origins", text("Origins", "Orígenes"), None, "#6F4E37", 0, args.time_limit_secs),
        category("preparation", text("Preparation", "Preparación"), None, "#C0A080", 1, None),
        category(
            "espresso",
            text("Espresso", "Espresso"),
            Some("preparation"),
            "#3B2F2F",
            0,
            args.time_limit_secs,
        ),
        category(
            "brewing",
            text("Brewing methods", "Métodos de preparación"),
            Some("preparation"),
            "#A67B5B",
            1,
            args.time_limit_secs,
        ),
    ];
    for doc in &categories {
        storage.content.upsert_category(doc).await?;
    }

    for sample in SAMPLES {
        storage.content.upsert_question(&question(sample)).await?;
    }

    println!(
        "Seeded {} categories and {} questions into {}",
        categories.len(),
        SAMPLES.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
