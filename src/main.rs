// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use gradebook_vault::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER, PASSWORD_ENV};
use gradebook_vault::grades::{self, GradeSymbol, Term};
use gradebook_vault::models::{
    sort_students, Contribution, SchoolClass, SeatPlan, Settings, Student, SETTINGS_ID,
};
use gradebook_vault::storage::{CredentialState, StoragePaths};
use gradebook_vault::{GradebookError, Result, Session, Vault};

#[derive(Parser, Debug)]
#[command(author, version, about = "Encrypted local gradebook", long_about = None)]
struct Cli {
    /// Overrides GRADEBOOK_DATA_DIR.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the local account
    Init {
        #[arg(long)]
        username: String,
    },
    /// Show whether an account exists
    Status,
    /// Add a class
    AddClass {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        teacher: String,
    },
    /// Add a student to a class
    AddStudent {
        #[arg(long)]
        class: String,
        #[arg(long)]
        name: String,
    },
    /// List the students of a class
    Students {
        #[arg(long)]
        class: String,
    },
    /// Record a participation mark (+++ ++ + o - --)
    Grade {
        #[arg(long)]
        student: String,
        #[arg(long, allow_hyphen_values = true)]
        symbol: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Seat a student in the class room layout (zero-based row/col)
    Seat {
        #[arg(long)]
        class: String,
        #[arg(long)]
        student: String,
        #[arg(long)]
        row: u32,
        #[arg(long)]
        col: u32,
    },
    /// Print term averages for a class
    Report {
        #[arg(long)]
        class: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.data_dir {
        config.paths = StoragePaths::new(dir);
    }
    init_tracing(config.log_format);

    match run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = e.error_code(), "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn run(config: &AppConfig, command: Commands) -> Result<()> {
    let vault = Vault::open_with_config(config)?;

    match command {
        Commands::Init { username } => {
            let password = prompt_new_password()?;
            let session = vault.create_user(&username, &password)?;
            println!("Account '{}' created", session.username());
            session.close();
        }
        Commands::Status => match vault.state()? {
            CredentialState::NoUser => println!("No account yet; run `gradebook init`"),
            CredentialState::HasUser { username } => println!("Account: {username}"),
        },
        Commands::AddClass {
            name,
            subject,
            teacher,
        } => {
            let session = login(&vault)?;
            let mut class = SchoolClass::new(name, subject);
            class.teacher = teacher;
            session.store().put(&class)?;
            println!("{}", class.id);
        }
        Commands::AddStudent { class, name } => {
            let session = login(&vault)?;
            let store = session.store();
            require_class(&session, &class)?;
            let sort_index = store
                .all::<Student>()?
                .iter()
                .filter(|s| s.class_id == class)
                .map(|s| s.sort_index + 1)
                .max()
                .unwrap_or(0);
            let student = Student::new(class, name, sort_index);
            store.put(&student)?;
            println!("{}", student.id);
        }
        Commands::Students { class } => {
            let session = login(&vault)?;
            require_class(&session, &class)?;
            let settings = settings(&session)?;
            let mut students: Vec<Student> = session
                .store()
                .all::<Student>()?
                .into_iter()
                .filter(|s| s.class_id == class)
                .collect();
            sort_students(&mut students, settings.sort_mode(&class));
            for student in students {
                println!("{}\t{}", student.id, student.name);
            }
        }
        Commands::Grade {
            student,
            symbol,
            date,
        } => {
            let session = login(&vault)?;
            let store = session.store();
            let symbol: GradeSymbol = symbol.parse()?;
            let student = store.get::<Student>(&student)?.ok_or_else(|| {
                GradebookError::InvalidInput(format!("unknown student {student:?}"))
            })?;
            let class = require_class(&session, &student.class_id)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let year = settings(&session)?.school_year_for(&class);
            let term = year.term_of(date).ok_or_else(|| {
                GradebookError::InvalidInput(format!("{date} is outside the school year"))
            })?;

            let contribution = Contribution::new(&student.id, &class.id, date, symbol, term);
            store.put(&contribution)?;
            println!("{} {} ({}. term)", student.name, symbol, term.number());
        }
        Commands::Seat {
            class,
            student,
            row,
            col,
        } => {
            let session = login(&vault)?;
            let store = session.store();
            require_class(&session, &class)?;
            let student = store.get::<Student>(&student)?.ok_or_else(|| {
                GradebookError::InvalidInput(format!("unknown student {student:?}"))
            })?;
            let mut plan = store
                .get::<SeatPlan>(&class)?
                .unwrap_or_else(|| SeatPlan::new(&class));
            plan.seat(&student, row, col)?;
            store.put(&plan)?;
            println!("Seated {} at row {row}, col {col}", student.name);
        }
        Commands::Report { class } => {
            let session = login(&vault)?;
            let store = session.store();
            let class = require_class(&session, &class)?;
            let year = settings(&session)?.school_year_for(&class);
            let students = store.all::<Student>()?;
            let contributions = store.all::<Contribution>()?;

            println!("{} {} ({} to {})", class.name, class.subject, year.start, year.end);
            println!(
                "{:<24} {:>8} {:>4} {:>8} {:>4}",
                "Student", "1. term", "n", "2. term", "n"
            );
            for row in grades::class_report(&class.id, &year, &students, &contributions) {
                println!(
                    "{:<24} {:>8} {:>4} {:>8} {:>4}",
                    row.name,
                    row.label(Term::First),
                    row.first_count,
                    row.label(Term::Second),
                    row.second_count
                );
            }
        }
    }
    Ok(())
}

fn login(vault: &Vault) -> Result<Session> {
    let password = read_password("Password: ")?;
    vault.login(&password)
}

fn require_class(session: &Session, id: &str) -> Result<SchoolClass> {
    session
        .store()
        .get::<SchoolClass>(id)?
        .ok_or_else(|| GradebookError::InvalidInput(format!("unknown class {id:?}")))
}

fn settings(session: &Session) -> Result<Settings> {
    match session.store().get::<Settings>(SETTINGS_ID)? {
        Some(settings) => Ok(settings),
        None => Ok(Settings::for_today(Local::now().date_naive())),
    }
}

fn read_password(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }
    rpassword::prompt_password(prompt)
        .map(Zeroizing::new)
        .map_err(|e| GradebookError::InvalidInput(format!("password prompt: {e}")))
}

fn prompt_new_password() -> Result<Zeroizing<String>> {
    let first = read_password("New password: ")?;
    if std::env::var(PASSWORD_ENV).is_ok_and(|pw| !pw.is_empty()) {
        return Ok(first);
    }
    let second = read_password("Confirm password: ")?;
    if *first != *second {
        return Err(GradebookError::InvalidInput("passwords do not match".into()));
    }
    Ok(first)
}
