use clap::{CommandFactory, Parser};
use retask_cli::cli::{Cli, Command, collect_config_overrides};
use retask_cli::render;
use retask_core::clock::SystemClock;
use retask_core::config::{self, Config};
use retask_core::error::AppError;
use retask_core::refresh::{RefreshDriver, StatusBoard};
use retask_core::status::parse_interval;
use retask_core::storage::json_store;
use retask_core::task_api::{self, NewTask};
use std::io::{self, BufRead, IsTerminal, Write};
use time::UtcOffset;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "RETASK_LOG";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        warn!(error = %err, "ignoring unreadable config, using defaults");
    }
    let overrides = collect_config_overrides(raw_overrides)?;
    Ok(config::merge_overrides(&loaded.config, &overrides))
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn print_list(config: &Config, json: bool) -> Result<(), AppError> {
    let items = task_api::list_tasks()?;
    let strings = config.strings();
    if json {
        println!("{}", render::tasks_json(&items, &strings));
    } else {
        println!("{}", render::tasks_table(&items, &strings, &config.palette()));
    }
    Ok(())
}

/// Write one watch frame. Returns `Ok(false)` once the reader has gone away.
fn emit_frame<W: Write>(out: &mut W, clear: bool, frame: &str) -> Result<bool, AppError> {
    fn write_frame<W: Write>(out: &mut W, clear: bool, frame: &str) -> io::Result<()> {
        if clear {
            write!(out, "{CLEAR_SCREEN}")?;
        }
        writeln!(out, "{frame}")?;
        out.flush()
    }

    match write_frame(out, clear, frame) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(err) => Err(AppError::io(err.to_string())),
    }
}

/// Redraw the list on every refresh tick until `ticks` refreshes happened,
/// or forever when no limit is given.
fn watch_list(config: &Config, json: bool, ticks: Option<u64>) -> Result<(), AppError> {
    let path = json_store::store_path()?;
    let strings = config.strings();
    let palette = config.palette();
    let clear = !json && io::stdout().is_terminal();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| AppError::io(err.to_string()))?;

    runtime.block_on(async {
        let (rx, handle) = RefreshDriver::new(config.refresh_interval()).spawn();
        let mut board = StatusBoard::new(path, SystemClock, rx);
        let mut rendered: u64 = 0;

        while let Some(snapshot) = board.next().await {
            let frame = match &snapshot.tasks {
                Ok(items) if json => Some(render::tasks_json(items, &strings)),
                Ok(items) => Some(render::tasks_table(items, &strings, &palette)),
                Err(err) => {
                    eprintln!("ERROR: {err}");
                    None
                }
            };
            if let Some(frame) = frame
                && !emit_frame(&mut io::stdout().lock(), clear, &frame)?
            {
                break;
            }

            rendered += 1;
            if ticks.is_some_and(|limit| rendered >= limit) {
                break;
            }
        }

        drop(board);
        handle
            .await
            .map_err(|err| AppError::io(format!("refresh driver failed: {err}")))
    })
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli.config_override)?;

    match cli.command {
        Command::Add {
            name,
            min_interval,
            max_interval,
            description,
            points,
        } => {
            let task = task_api::add_task(NewTask {
                name,
                description,
                min_interval_ms: parse_interval(&min_interval)?,
                max_interval_ms: parse_interval(&max_interval)?,
                points,
            })?;
            if cli.json {
                println!("{}", render::task_json(&task));
            } else {
                println!("Added task: {} ({})", task.name, task.id);
            }
        }
        Command::List { watch, ticks } => {
            if watch {
                watch_list(&config, cli.json, ticks)?;
            } else {
                print_list(&config, cli.json)?;
            }
        }
        Command::Show { id } => {
            let detail = task_api::task_detail(&id)?;
            if cli.json {
                println!("{}", render::detail_json(&detail)?);
            } else {
                println!("{}", render::detail_text(&detail, local_offset())?);
            }
        }
        Command::Execute { id } => {
            let task = task_api::record_execution(&id)?;
            if cli.json {
                println!("{}", render::task_json(&task));
            } else {
                println!(
                    "Executed task: {} ({}), {} executions",
                    task.name,
                    task.id,
                    task.execution_count()
                );
            }
        }
        Command::Delete { id } => {
            let task = task_api::delete_task(&id)?;
            if cli.json {
                println!("{}", render::task_json(&task));
            } else {
                println!("Deleted task: {} ({})", task.name, task.id);
            }
        }
        Command::Seed => {
            let inserted = task_api::seed_default_tasks()?;
            if cli.json {
                println!("{}", serde_json::json!({ "inserted": inserted }));
            } else if inserted == 0 {
                println!("Store already has tasks, nothing seeded.");
            } else {
                println!("Seeded {inserted} tasks.");
            }
        }
    }

    Ok(())
}

/// Print a command failure. Dropped duplicate executions are not errors
/// from the user's point of view.
fn report(err: &AppError) -> bool {
    if err.is_cancelled() {
        return false;
    }
    eprintln!("ERROR: {err}");
    true
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                report(&err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("retask".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                report(&normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            report(&err);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive()
            && report(&err)
        {
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            report(&normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli)
        && report(&err)
    {
        std::process::exit(1);
    }
}
