use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, path::PathBuf};

use crate::config::{Profile, default_profile_path};
use crate::pipeline;
use crate::trace::Trace;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let profile_path: Option<PathBuf> = pargs.opt_value_from_str("--profile")?;

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("replay") => {
            let trace_path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: scenetouch replay <trace.json> [--profile <path>]"))?;
            let profile = load_profile(profile_path.as_deref())?;
            let trace = Trace::load(&trace_path)?;
            let outcome = pipeline::run_trace(&trace, profile);
            print_json(&serde_json::json!({"ok": true, "data": outcome}));
            Ok(())
        }

        Some("check") => {
            let profile = load_profile(profile_path.as_deref())?;
            let path = match profile_path {
                Some(p) => p,
                None => default_profile_path()?,
            };
            print_json(&serde_json::json!({"ok": true, "data": {
                "profile_path": path,
                "profile": profile,
            }}));
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn load_profile(path: Option<&std::path::Path>) -> Result<Profile> {
    match path {
        Some(p) => Profile::from_path(p),
        None => Profile::load_or_install_default(),
    }
}

fn print_help() {
    println!(
        r#"scenetouch — touch gesture interpreter for the scene viewer

USAGE:
  scenetouch help [command]                      Show general or command-specific help
  scenetouch replay <trace.json> [--profile <path>]
                                                 Replay a captured touch trace and
                                                 report the resulting control signals
  scenetouch check [--profile <path>]            Validate a tuning profile and print
                                                 the effective values

TIPS:
  - Tuning profile: ~/.config/scenetouch/profile.toml (installed on first run)
  - Set RUST_LOG=debug to see every emitted signal during replay
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: scenetouch replay <trace.json> [--profile <path>]\nFeeds a captured touch trace through the classifier and prints the\nfinal accumulators, pointer, and recognized taps as JSON."
        ),
        "check" => println!(
            "usage: scenetouch check [--profile <path>]\nParses and validates the tuning profile; prints the effective values."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_json(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
