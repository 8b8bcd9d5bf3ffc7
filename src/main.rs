// SPDX-License-Identifier: GPL-3.0-only

use std::{path::PathBuf, process};

use anyhow::{Context, Result};
use clap_lex::RawArgs;
use tracing::{error, info};

use cosmic_grab::{config::Config, logger, replay};

fn main() {
    if let Err(err) = main_inner() {
        error!("Error occured in main(): {:#}", err);
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn main_inner() -> Result<()> {
    let raw_args = RawArgs::from_args();
    let mut cursor = raw_args.cursor();
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    let mut scenario: Option<PathBuf> = None;

    // Parse the arguments
    while let Some(arg) = raw_args.next_os(&mut cursor) {
        match arg.to_str() {
            Some("--help") | Some("-h") => {
                print_help(env!("CARGO_PKG_VERSION"), git_hash);
                return Ok(());
            }
            Some("--version") | Some("-V") => {
                println!(
                    "cosmic-grab {} (git commit {})",
                    env!("CARGO_PKG_VERSION"),
                    git_hash
                );
                return Ok(());
            }
            _ if scenario.is_none() => scenario = Some(PathBuf::from(arg)),
            _ => anyhow::bail!("Unexpected argument {:?}", arg),
        }
    }
    let scenario = scenario.context("No scenario given, see --help")?;

    // setup logger
    logger::init_logger()?;

    let config = Config::load();
    let scenario = replay::Scenario::load(&scenario)?;
    info!("Replaying {} steps", scenario.steps.len());
    for line in replay::run(&scenario, &config)? {
        println!("{line}");
    }

    Ok(())
}

fn print_help(version: &str, git_rev: &str) {
    println!(
        r#"cosmic-grab {version}
Git Commit: {git_rev}

Replays a scripted input session against the grab machinery and
prints how every step was resolved.

Usage: cosmic-grab [OPTIONS] <SCENARIO>

Arguments:
  <SCENARIO>    RON file describing elements, coordinators and steps

Options:
  -h, --help     Show this message
  -V, --version  Show the version of cosmic-grab"#
    );
}
