use std::fmt;
use std::path::PathBuf;

use lms_core::model::{CourseId, User};
use services::{AppServices, Clock, CourseOverview};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    InvalidCourseId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCourseId { raw } => write!(f, "invalid --course value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    eprintln!("  cargo run -p app -- courses  [--db <sqlite_url>] [--catalog <path>]");
    eprintln!("  cargo run -p app -- register --name <name> --email <email> --password <password>");
    eprintln!("  cargo run -p app -- login    --email <email> --password <password>");
    eprintln!("  cargo run -p app -- progress --email <email> --password <password>");
    eprintln!("  cargo run -p app -- skip     --email <email> --password <password> --course <id>");
    eprintln!();
    eprintln!("Every command accepts --db and --catalog.");
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://lms.sqlite3");
    eprintln!("  --catalog <bundled catalog>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LMS_DB_URL, LMS_CATALOG, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Courses,
    Register,
    Login,
    Progress,
    Skip,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "courses" => Some(Self::Courses),
            "register" => Some(Self::Register),
            "login" => Some(Self::Login),
            "progress" => Some(Self::Progress),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Register => "register",
            Self::Login => "login",
            Self::Progress => "progress",
            Self::Skip => "skip",
        }
    }
}

struct Args {
    db_url: String,
    catalog: Option<PathBuf>,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    course: Option<CourseId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LMS_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://lms.sqlite3".into(), normalize_sqlite_url);
        let mut catalog = std::env::var_os("LMS_CATALOG").map(PathBuf::from);
        let mut name = None;
        let mut email = None;
        let mut password = None;
        let mut course = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog" => catalog = Some(PathBuf::from(require_value(args, "--catalog")?)),
                "--name" => name = Some(require_value(args, "--name")?),
                "--email" => email = Some(require_value(args, "--email")?),
                "--password" => password = Some(require_value(args, "--password")?),
                "--course" => {
                    let value = require_value(args, "--course")?;
                    let parsed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCourseId { raw: value.clone() })?;
                    course = Some(parsed);
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
            catalog,
            name,
            email,
            password,
            course,
        })
    }
}

fn required<T>(value: Option<T>, command: Command, flag: &'static str) -> Result<T, ArgsError> {
    value.ok_or(ArgsError::MissingFlag {
        command: command.name(),
        flag,
    })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn print_overview(overview: &CourseOverview) {
    println!(
        "{} ({}): {} complete{}",
        overview.title,
        overview.course_id,
        overview.percent_complete,
        if overview.certificate_issued {
            ", certificate issued"
        } else {
            ""
        }
    );
    for lesson in &overview.lessons {
        let mark = match (lesson.completed, lesson.unlocked) {
            (true, _) => "x",
            (false, true) => " ",
            (false, false) => "-",
        };
        let score = lesson
            .score
            .map(|s| format!(" last score {s}"))
            .unwrap_or_default();
        println!("  [{mark}] {}. {}{score}", lesson.index + 1, lesson.title);
    }
}

async fn sign_in(
    services: &AppServices,
    args: &Args,
    command: Command,
) -> Result<User, Box<dyn std::error::Error>> {
    let email = required(args.email.as_deref(), command, "--email")?;
    let password = required(args.password.as_deref(), command, "--password")?;
    Ok(services.auth().login(email, password).await?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::system(), parsed.catalog.as_deref())
            .await?;
    info!(db_url = %parsed.db_url, command = cmd.name(), "services ready");

    match cmd {
        Command::Courses => {
            for course in services.catalog().courses() {
                println!(
                    "{}  {} ({} lessons)",
                    course.id(),
                    course.title(),
                    course.lesson_count()
                );
            }
        }
        Command::Register => {
            let name = required(parsed.name.as_deref(), cmd, "--name")?;
            let email = required(parsed.email.as_deref(), cmd, "--email")?;
            let password = required(parsed.password.as_deref(), cmd, "--password")?;
            let user = services.auth().register(name, email, password).await?;
            println!("registered {} <{}> as {}", user.name(), user.email(), user.id());
        }
        Command::Login => {
            let user = sign_in(&services, &parsed, cmd).await?;
            println!("welcome back, {} (last login {})", user.name(), user.last_login());
        }
        Command::Progress => {
            let user = sign_in(&services, &parsed, cmd).await?;
            for overview in services.progress().overviews(user.id()).await? {
                print_overview(&overview);
            }
        }
        Command::Skip => {
            let course = required(parsed.course.clone(), cmd, "--course")?;
            let user = sign_in(&services, &parsed, cmd).await?;
            services.progress().skip_to_end(user.id(), &course).await?;
            if let Some(cert) = services.progress().certificate(&user, &course).await? {
                let average = cert
                    .average_score
                    .map_or_else(|| "n/a".to_string(), |s| s.to_string());
                println!(
                    "certificate: {} completed {} ({} lessons, average score {average})",
                    cert.user_name, cert.course_title, cert.lesson_count
                );
            }
        }
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
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

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
