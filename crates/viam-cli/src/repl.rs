//! REPL – Read-Eval-Print Loop for the interactive machine shell.
//!
//! Supported slash-commands:
//!   /help                  – show this list
//!   /settings              – interactively edit `~/.viam/config.toml`
//!   /resources             – list the machine's resources
//!   /status                – machine and per-resource state
//!   /do <name> <json>      – send a free-form command to a component
//!   /motor <name> <power>  – set a motor's power in [-1, 1]
//!   /stop                  – stop every actuator on the machine
//!   /logs [part]           – one page of a part's stored logs
//!   /tail [part]           – follow a part's live logs until Ctrl-C
//!   /quit | /exit          – exit the CLI

use colored::Colorize;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::{debug, warn};
use viam_app::{AppClient, LogEntry};
use viam_components::{GenericComponentClient, MotorClient};
use viam_rpc::{CancelHandle, Channel, ClientOptions, ConnectChannel, Struct};
use viam_services::RobotClient;

use crate::config::{self, Config};

/// The cancel handle of the `/tail` in flight, if any.
pub type ActiveTail = Arc<Mutex<Option<CancelHandle>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Settings,
    Resources,
    Status,
    Do { name: String, command: Struct },
    Motor { name: String, power: f64 },
    Stop,
    Logs { part: Option<String> },
    Tail { part: Option<String> },
    Quit,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    let part = |w: Option<&str>| w.map(str::to_string);
    match head {
        "/help" => Ok(Command::Help),
        "/settings" => Ok(Command::Settings),
        "/resources" => Ok(Command::Resources),
        "/status" => Ok(Command::Status),
        "/stop" => Ok(Command::Stop),
        "/logs" => Ok(Command::Logs { part: part(words.next()) }),
        "/tail" => Ok(Command::Tail { part: part(words.next()) }),
        "/quit" | "/exit" => Ok(Command::Quit),
        "/do" => {
            let name = words.next().ok_or("usage: /do <name> <json>")?.to_string();
            let raw = words.collect::<Vec<_>>().join(" ");
            let command = if raw.is_empty() {
                Struct::new()
            } else {
                match serde_json::from_str::<Value>(&raw) {
                    Ok(Value::Object(map)) => map,
                    Ok(_) => return Err("command must be a JSON object".to_string()),
                    Err(e) => return Err(format!("invalid JSON: {e}")),
                }
            };
            Ok(Command::Do { name, command })
        }
        "/motor" => {
            let (Some(name), Some(power)) = (words.next(), words.next()) else {
                return Err("usage: /motor <name> <power>".to_string());
            };
            let power: f64 = power.parse().map_err(|_| format!("not a number: {power}"))?;
            if !(-1.0..=1.0).contains(&power) {
                return Err("power must be within [-1, 1]".to_string());
            }
            Ok(Command::Motor {
                name: name.to_string(),
                power,
            })
        }
        other => Err(format!("Unknown command: '{other}'")),
    }
}

/// Clients for one connected machine and the cloud app.
pub struct Session {
    machine: Arc<dyn Channel>,
    options: ClientOptions,
    robot: RobotClient,
    app: AppClient,
    default_part_id: String,
}

impl Session {
    pub fn connect(cfg: &Config) -> Self {
        let machine = Arc::new(ConnectChannel::new(cfg.address.clone()).with_timeout(cfg.timeout()));
        let app = Arc::new(ConnectChannel::new(cfg.app_address.clone()).with_timeout(cfg.timeout()));
        Self::new(machine, app, cfg)
    }

    pub fn new(machine: Arc<dyn Channel>, app: Arc<dyn Channel>, cfg: &Config) -> Self {
        let options = if cfg.log_requests {
            ClientOptions::default().with_request_logger(|method, request| {
                println!("  {} {} {}", "→".dimmed(), method.to_string().cyan(), request.to_string().dimmed());
            })
        } else {
            ClientOptions::default()
        };
        Self {
            robot: RobotClient::new(machine.clone(), options.clone()),
            app: AppClient::new(app, options.clone()),
            machine,
            options,
            default_part_id: cfg.default_part_id.clone(),
        }
    }

    fn part_id(&self, part: Option<String>) -> Result<String, String> {
        match part {
            Some(p) => Ok(p),
            None if !self.default_part_id.is_empty() => Ok(self.default_part_id.clone()),
            None => Err("no part given and no default_part_id configured".to_string()),
        }
    }

    /// Run a machine or app command and render its result.
    pub async fn execute(&self, command: Command, active_tail: &ActiveTail) -> Result<String, String> {
        debug!(?command, "executing");
        match command {
            Command::Resources => {
                let names = self.robot.resource_names().await.map_err(|e| e.to_string())?;
                Ok(names.iter().map(|n| format!("  • {n}")).collect::<Vec<_>>().join("\n"))
            }
            Command::Status => {
                let status = self.robot.get_machine_status().await.map_err(|e| e.to_string())?;
                let mut out = format!("  machine: {:?} (config {})", status.state, status.config.revision);
                for r in &status.resources {
                    out.push_str(&format!("\n  • {} {:?}", r.name, r.state));
                    if !r.error.is_empty() {
                        out.push_str(&format!(" – {}", r.error));
                    }
                }
                Ok(out)
            }
            Command::Do { name, command } => {
                let client = GenericComponentClient::new(self.machine.clone(), name, self.options.clone());
                let result = client.do_command(command).await.map_err(|e| e.to_string())?;
                serde_json::to_string_pretty(&result).map_err(|e| e.to_string())
            }
            Command::Motor { name, power } => {
                let motor = MotorClient::new(self.machine.clone(), name.clone(), self.options.clone());
                motor.set_power(power, None).await.map_err(|e| e.to_string())?;
                Ok(format!("  ✓ {name} power set to {power}"))
            }
            Command::Stop => {
                self.robot.stop_all(&HashMap::new()).await.map_err(|e| e.to_string())?;
                Ok("  ✓ all actuators stopped".to_string())
            }
            Command::Logs { part } => {
                let part = self.part_id(part)?;
                let (logs, next) = self
                    .app
                    .get_robot_part_logs(&part, None, None, &[])
                    .await
                    .map_err(|e| e.to_string())?;
                let mut out = render_logs(&logs);
                if !next.is_empty() {
                    out.push_str(&format!("\n  (more: page token {next})"));
                }
                Ok(out)
            }
            Command::Tail { part } => {
                let count = self
                    .follow_logs(part, active_tail, |entry| println!("{}", render_entry(&entry)))
                    .await?;
                Ok(format!("  {} ({count} entries)", "tail stopped".dimmed()))
            }
            Command::Help | Command::Settings | Command::Quit => Ok(String::new()),
        }
    }

    /// Stream a part's live logs into `on_entry` until the stream ends or
    /// the handle published in `active_tail` is cancelled.
    pub async fn follow_logs<F>(
        &self,
        part: Option<String>,
        active_tail: &ActiveTail,
        on_entry: F,
    ) -> Result<usize, String>
    where
        F: FnMut(LogEntry),
    {
        let part = self.part_id(part)?;
        let handle = CancelHandle::new();
        let token = handle.token();
        if let Ok(mut slot) = active_tail.lock() {
            *slot = Some(handle);
        }
        let result = self
            .app
            .follow_robot_part_logs(&part, false, None, on_entry, Some(token))
            .await;
        if let Ok(mut slot) = active_tail.lock() {
            slot.take();
        }
        result.map_err(|e| e.to_string())
    }
}

fn render_entry(entry: &LogEntry) -> String {
    let time = entry.time.map(|t| t.to_rfc3339()).unwrap_or_default();
    format!("  {} {:5} {} {}", time.dimmed(), entry.level, entry.logger_name.bold(), entry.message)
}

fn render_logs(logs: &[LogEntry]) -> String {
    if logs.is_empty() {
        return "  (no log entries)".to_string();
    }
    logs.iter().map(render_entry).collect::<Vec<_>>().join("\n")
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(runtime: &Runtime, cfg: &Config, shutdown: Arc<AtomicBool>, active_tail: ActiveTail) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session = Session::connect(cfg);

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "viam>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_command(line) {
            Ok(c) => c,
            Err(e) => {
                println!("{} Type {} for available commands.", e.red(), "/help".bold());
                continue;
            }
        };

        match command {
            Command::Help => cmd_help(),
            Command::Settings => {
                if cmd_settings() {
                    session = Session::connect(&load_config_or_default());
                }
            }
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Command::Tail { .. } => {
                println!("  {}", "Following logs, press Ctrl-C to stop …".dimmed());
                report(runtime.block_on(session.execute(command, &active_tail)));
            }
            other => report(runtime.block_on(session.execute(other, &active_tail))),
        }
    }
}

fn report(result: Result<String, String>) {
    match result {
        Ok(out) => println!("{out}"),
        Err(e) => {
            warn!(error = %e, "command failed");
            println!("{}: {}", "Error".red(), e);
        }
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Viam Commands".bold().underline());
    println!("  {}              – edit ~/.viam/config.toml settings", "/settings".bold().cyan());
    println!("  {}             – list the machine's resources", "/resources".bold().cyan());
    println!("  {}                – machine and resource state", "/status".bold().cyan());
    println!("  {}      – send a command to a component", "/do <name> <json>".bold().cyan());
    println!("  {}  – set motor power in [-1, 1]", "/motor <name> <power>".bold().cyan());
    println!("  {}                  – stop every actuator", "/stop".bold().cyan());
    println!("  {}           – a page of a part's logs", "/logs [part]".bold().cyan());
    println!("  {}           – follow a part's logs until Ctrl-C", "/tail [part]".bold().cyan());
    println!("  {}           – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

/// Returns whether the settings were saved.
fn cmd_settings() -> bool {
    let mut cfg = match config::load() {
        Ok(Some(c)) => c,
        Ok(None) => Config::default(),
        Err(e) => {
            println!("{}: {}", "Error loading config".red(), e);
            return false;
        }
    };

    println!("{}", "Settings Editor".bold().underline());
    cfg.address = prompt_str(&format!("  Machine address [{}]: ", cfg.address), &cfg.address);
    cfg.app_address = prompt_str(&format!("  App address     [{}]: ", cfg.app_address), &cfg.app_address);
    let timeout = prompt_str(&format!("  Timeout (secs)  [{}]: ", cfg.timeout_secs), &cfg.timeout_secs.to_string());
    if let Ok(secs) = timeout.parse::<u64>() {
        cfg.timeout_secs = secs;
    }
    let log = prompt_str(&format!("  Log requests    [{}]: ", cfg.log_requests), &cfg.log_requests.to_string());
    cfg.log_requests = matches!(log.to_lowercase().as_str(), "true" | "yes" | "y" | "1");
    cfg.default_part_id = prompt_str(
        &format!("  Default part id [{}]: ", cfg.default_part_id),
        &cfg.default_part_id,
    );

    match config::save(&cfg) {
        Ok(()) => {
            println!(
                "{} {}",
                "✓ Settings saved to".green(),
                config::config_path().display().to_string().bold()
            );
            true
        }
        Err(e) => {
            println!("{}: {}", "Error saving config".red(), e);
            false
        }
    }
}

fn load_config_or_default() -> Config {
    config::load_or_default().unwrap_or_else(|e| {
        println!("{}: {}", "Config error".red(), e);
        Config::default()
    })
}

fn prompt_str(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
