//! `rollcall` command-line boundary.
//!
//! # Responsibility
//! - Map one subcommand to one core service call.
//! - Print the JSON response envelope on stdout.
//! - Exit `0` on success, `1` for caller errors, `2` for server-side failures.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use rollcall_core::boundary::{self, ResponseEnvelope, STATUS_INTERNAL};
use rollcall_core::config::AppConfig;
use rollcall_core::db::{Database, PoolExecutor, QueryContext};
use rollcall_core::{
    open_database, open_database_in_memory, ChurchMemberDraft, ChurchMemberService,
    SqliteChurchMemberRepository, SqliteUserRepository, UserDraft, UserService,
};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(
    name = "rollcall",
    version,
    about = "Manage users and church members stored in SQLite"
)]
struct Cli {
    /// JSON settings file (`Database` / `Logging` sections)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, or `:memory:`
    #[arg(long, global = true)]
    db: Option<String>,

    /// Deadline for the whole command, in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (stderr when omitted)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// User records
    #[command(subcommand)]
    User(UserCommand),
    /// Church member records
    #[command(subcommand)]
    Member(MemberCommand),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserFields),
    Get { id: String },
    Update {
        id: String,
        #[command(flatten)]
        fields: UserFields,
    },
    Delete { id: String },
    List,
}

#[derive(Args, Debug)]
struct UserFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Create(MemberFields),
    Get { id: String },
    Update {
        id: String,
        #[command(flatten)]
        fields: MemberFields,
    },
    Delete { id: String },
    List,
    /// Members joined between two dates, both inclusive (YYYY-MM-DD)
    Joined {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Args, Debug)]
struct MemberFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    biography: Option<String>,
    /// RFC 3339 timestamp; defaults to now on create, ignored on update
    #[arg(long)]
    joined_at: Option<DateTime<Utc>>,
}

impl From<UserFields> for UserDraft {
    fn from(fields: UserFields) -> Self {
        UserDraft::new(fields.name, fields.email)
    }
}

impl From<MemberFields> for ChurchMemberDraft {
    fn from(fields: MemberFields) -> Self {
        ChurchMemberDraft {
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            address: fields.address,
            biography: fields.biography,
            joined_at: fields.joined_at,
        }
    }
}

type Response = (u16, Value);

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (status, body) = run(cli);
    println!("{body}");
    ExitCode::from(exit_code(status))
}

fn run(cli: Cli) -> Response {
    let started_at = Instant::now();
    let ctx = cli
        .timeout_ms
        .map_or_else(QueryContext::background, |ms| {
            QueryContext::with_timeout(Duration::from_millis(ms))
        });

    let db = match bootstrap(&cli) {
        Ok(db) => db,
        Err(message) => {
            eprintln!("rollcall: {message}");
            return encode((STATUS_INTERNAL, ResponseEnvelope::<()>::error(message)));
        }
    };

    let response = dispatch(cli.command, &db, &ctx);
    info!(
        "event=command_done module=cli status_code={} duration_ms={}",
        response.0,
        started_at.elapsed().as_millis()
    );
    response
}

fn bootstrap(cli: &Cli) -> Result<Database, String> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path),
        None => AppConfig::from_env(),
    }
    .map_err(|err| err.to_string())?;

    if let Some(path) = &cli.db {
        config.database.path = path.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.clone());
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.directory = Some(dir.clone());
    }
    config.validate().map_err(|err| err.to_string())?;

    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or_else(|| rollcall_core::default_log_level());
    rollcall_core::init_logging(level, config.logging.directory.as_deref())?;

    let opened = if config.database.is_in_memory() {
        open_database_in_memory()
    } else {
        open_database(&config.database.path, &config.database.pool)
    };
    opened.map_err(|err| format!("failed to open database: {err}"))
}

fn dispatch(command: Commands, db: &Database, ctx: &QueryContext) -> Response {
    match command {
        Commands::User(command) => user_command(command, db, ctx),
        Commands::Member(command) => member_command(command, db, ctx),
    }
}

fn user_command(command: UserCommand, db: &Database, ctx: &QueryContext) -> Response {
    let users: UserService<SqliteUserRepository<PoolExecutor>> =
        UserService::new(SqliteUserRepository::new(db.executor()));

    match command {
        UserCommand::Create(fields) => encode(boundary::respond(users.create(ctx, fields.into()))),
        UserCommand::Get { id } => with_id(&id, |id| {
            encode(boundary::respond(boundary::require_found(
                "user",
                id,
                users.get(ctx, id),
            )))
        }),
        UserCommand::Update { id, fields } => with_id(&id, |id| {
            encode(boundary::respond(users.update(ctx, id, &fields.into())))
        }),
        UserCommand::Delete { id } => {
            with_id(&id, |id| encode(boundary::respond(users.delete(ctx, id))))
        }
        UserCommand::List => encode(boundary::respond(users.list(ctx))),
    }
}

fn member_command(command: MemberCommand, db: &Database, ctx: &QueryContext) -> Response {
    let members: ChurchMemberService<SqliteChurchMemberRepository<PoolExecutor>> =
        ChurchMemberService::new(SqliteChurchMemberRepository::new(db.executor()));

    match command {
        MemberCommand::Create(fields) => {
            encode(boundary::respond(members.create(ctx, fields.into())))
        }
        MemberCommand::Get { id } => with_id(&id, |id| {
            encode(boundary::respond(boundary::require_found(
                "member",
                id,
                members.get(ctx, id),
            )))
        }),
        MemberCommand::Update { id, fields } => with_id(&id, |id| {
            encode(boundary::respond(members.update(ctx, id, &fields.into())))
        }),
        MemberCommand::Delete { id } => {
            with_id(&id, |id| encode(boundary::respond(members.delete(ctx, id))))
        }
        MemberCommand::List => encode(boundary::respond(members.list(ctx))),
        MemberCommand::Joined { start, end } => {
            match boundary::parse_joined_range(start.as_deref(), end.as_deref()) {
                Ok((start, end)) => encode(boundary::respond(
                    members.list_by_joined_range(ctx, start, end),
                )),
                Err(err) => encode(boundary::reject::<()>(&err)),
            }
        }
    }
}

fn with_id(raw: &str, call: impl FnOnce(i64) -> Response) -> Response {
    match boundary::parse_id(raw) {
        Ok(id) => call(id),
        Err(err) => encode(boundary::reject::<()>(&err)),
    }
}

fn encode<T: Serialize>((status, envelope): (u16, ResponseEnvelope<T>)) -> Response {
    match serde_json::to_value(&envelope) {
        Ok(body) => (status, body),
        Err(err) => (
            STATUS_INTERNAL,
            serde_json::json!({
                "success": false,
                "code": "01",
                "message": format!("failed to encode response: {err}"),
            }),
        ),
    }
}

fn exit_code(status: u16) -> u8 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, exit_code, Cli, Commands, MemberCommand, UserCommand};
    use clap::Parser;
    use rollcall_core::db::{open_database_in_memory, Database, QueryContext};

    fn call(db: &Database, args: &[&str]) -> (u16, serde_json::Value) {
        let cli = Cli::try_parse_from(std::iter::once("rollcall").chain(args.iter().copied()))
            .unwrap();
        dispatch(cli.command, db, &QueryContext::background())
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rollcall",
            "member",
            "joined",
            "--start",
            "2024-01-01",
            "--end",
            "2024-12-31",
            "--db",
            ":memory:",
            "--timeout-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(cli.db.as_deref(), Some(":memory:"));
        assert_eq!(cli.timeout_ms, Some(250));
        assert!(matches!(
            cli.command,
            Commands::Member(MemberCommand::Joined { .. })
        ));
    }

    #[test]
    fn user_create_requires_name_and_email() {
        assert!(Cli::try_parse_from(["rollcall", "user", "create", "--name", "Ann"]).is_err());
        let cli = Cli::try_parse_from([
            "rollcall", "user", "create", "--name", "Ann", "--email", "ann@x.com",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::User(UserCommand::Create(_))));
    }

    #[test]
    fn create_then_get_user_returns_success_envelopes() {
        let db = open_database_in_memory().unwrap();

        let (status, body) = call(&db, &["user", "create", "--name", "Ann", "--email", "ann@x.com"]);
        assert_eq!(status, 200);
        assert_eq!(body["code"], "00");
        let id = body["result"].as_i64().unwrap().to_string();

        let (status, body) = call(&db, &["user", "get", &id]);
        assert_eq!(status, 200);
        assert_eq!(body["result"]["email"], "ann@x.com");
    }

    #[test]
    fn missing_member_maps_to_not_found() {
        let db = open_database_in_memory().unwrap();

        let (status, body) = call(&db, &["member", "get", "41"]);
        assert_eq!(status, 404);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "01");
    }

    #[test]
    fn malformed_id_and_range_are_bad_requests() {
        let db = open_database_in_memory().unwrap();

        let (status, body) = call(&db, &["user", "delete", "abc"]);
        assert_eq!(status, 400);
        assert_eq!(body["message"], "invalid id");

        let (status, _) = call(&db, &["member", "joined", "--start", "2024-01-01"]);
        assert_eq!(status, 400);

        let (status, _) = call(
            &db,
            &["member", "joined", "--start", "2024-12-31", "--end", "2024-01-01"],
        );
        assert_eq!(status, 400);
    }

    #[test]
    fn duplicate_member_email_is_a_bad_request() {
        let db = open_database_in_memory().unwrap();
        let args = ["member", "create", "--name", "Al", "--email", "al@x.com"];

        assert_eq!(call(&db, &args).0, 200);
        let (status, body) = call(&db, &args);
        assert_eq!(status, 400);
        assert_eq!(body["message"], "email already exists");
    }

    #[test]
    fn exit_codes_follow_status_class() {
        assert_eq!(exit_code(200), 0);
        assert_eq!(exit_code(400), 1);
        assert_eq!(exit_code(404), 1);
        assert_eq!(exit_code(500), 2);
    }
}
