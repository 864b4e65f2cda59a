//! `viam-cli` – interactive shell for a Viam machine.
//!
//! 1. Initialises logging (and OTLP export when configured).
//! 2. Loads `~/.viam/config.toml`, offering to create it on first run.
//! 3. Probes the machine and reports its resources.
//! 4. Drops the user into a REPL (`/help` lists the commands).
//! 5. Ctrl-C stops a running `/tail`; otherwise it exits the shell.

mod config;
mod repl;
mod telemetry;

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

fn main() {
    let _guard = telemetry::init_tracing("viam-cli");

    print_banner();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start the async runtime");
            std::process::exit(1);
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let active_tail: repl::ActiveTail = Arc::new(Mutex::new(None));

    let shutdown_clone = shutdown.clone();
    let tail_clone = active_tail.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let tail = tail_clone.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = tail {
            handle.cancel();
            println!();
            println!("{}", "  ✓ Stopped following logs.".green());
            return;
        }
        println!();
        println!("{}", "⚠  Ctrl-C received – exiting …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
        std::process::exit(0);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", config::config_path().display().to_string().bold());
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    print!("\n  Probing machine at {} … ", cfg.address.dimmed());
    let session = repl::Session::connect(&cfg);
    match runtime.block_on(session.execute(repl::Command::Resources, &active_tail)) {
        Ok(resources) => {
            println!("{}", "online".green());
            println!("{resources}");
        }
        Err(e) => {
            println!("{}", "unreachable".yellow());
            println!("  {}", e.dimmed());
        }
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(&runtime, &cfg, shutdown, active_tail);
}

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║        Viam First-Run Setup          ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's connect to a machine.\n");

    let mut cfg = config::Config::default();
    config::apply_env_overrides(&mut cfg);

    cfg.address = prompt_line(&format!("  Machine address [{}]: ", cfg.address), &cfg.address);
    let part = prompt_line("  Default part id (optional): ", &cfg.default_part_id);
    cfg.default_part_id = part;

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

fn print_banner() {
    println!();
    println!("{}", r#"  _   _  _                "#.bold().cyan());
    println!("{}", r#" | | / /(_)____ ___ _  __ "#.bold().cyan());
    println!("{}", r#" | |/ // // _  // _ ` \/ /"#.bold().cyan());
    println!("{}", r#" |___//_/ \_,_//_/ /_/_/  "#.bold().cyan());
    println!();
    println!("  {} {}", "viam".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Machine shell");
    println!();
}

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
