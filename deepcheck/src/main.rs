//! Recursive object-graph assertions from the command line.
//!
//! Loads a JSON document as an object graph, applies a built-in rule to every
//! included location, and prints the paths that failed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use deepcheck::check::{CheckOutcome, Rule, run_check};
use deepcheck::core::report::display_path;
use deepcheck::exit_codes;
use deepcheck::io::config::{PolicyConfig, load_config, write_config};

#[derive(Parser)]
#[command(
    name = "deepcheck",
    version,
    about = "Recursive predicate assertions over object graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a rule to every included location of a JSON object graph.
    Check {
        /// JSON document to check.
        #[arg(short, long)]
        input: PathBuf,
        /// Policy file (TOML). Defaults apply when omitted.
        #[arg(short, long)]
        policy: Option<PathBuf>,
        /// Rule every included location must satisfy.
        #[arg(short, long, value_enum, default_value_t = Rule::NotNull)]
        rule: Rule,
    },
    /// Write a policy file with default options.
    InitPolicy {
        /// Destination of the policy file.
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the options of a policy file that differ from the defaults.
    Describe {
        #[arg(short, long)]
        policy: PathBuf,
    },
}

fn main() {
    deepcheck::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            input,
            policy,
            rule,
        } => cmd_check(&input, policy.as_deref(), rule),
        Command::InitPolicy { path, force } => cmd_init_policy(&path, force),
        Command::Describe { policy } => cmd_describe(&policy),
    }
}

fn cmd_check(input: &Path, policy: Option<&Path>, rule: Rule) -> Result<i32> {
    match run_check(input, policy, rule)? {
        CheckOutcome::Satisfied => Ok(exit_codes::OK),
        CheckOutcome::Failed(failures) => {
            for path in &failures {
                println!("{}", display_path(path));
            }
            Ok(exit_codes::FAILED)
        }
    }
}

fn cmd_init_policy(path: &Path, force: bool) -> Result<i32> {
    if !force && path.exists() {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &PolicyConfig::default())?;
    Ok(exit_codes::OK)
}

fn cmd_describe(path: &Path) -> Result<i32> {
    let policy = load_config(path)?
        .to_policy()
        .with_context(|| format!("build policy from {}", path.display()))?;
    let description = policy.to_string();
    if description.is_empty() {
        println!("default policy");
    } else {
        print!("{description}");
    }
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check_defaults_to_not_null() {
        let cli = Cli::parse_from(["deepcheck", "check", "--input", "graph.json"]);
        assert!(matches!(
            cli.command,
            Command::Check {
                policy: None,
                rule: Rule::NotNull,
                ..
            }
        ));
    }

    #[test]
    fn parse_check_with_rule_and_policy() {
        let cli = Cli::parse_from([
            "deepcheck",
            "check",
            "-i",
            "graph.json",
            "-p",
            "deepcheck.toml",
            "--rule",
            "non-empty-text",
        ]);
        assert!(matches!(
            cli.command,
            Command::Check {
                policy: Some(_),
                rule: Rule::NonEmptyText,
                ..
            }
        ));
    }

    #[test]
    fn parse_init_policy_force() {
        let cli = Cli::parse_from(["deepcheck", "init-policy", "--force", "deepcheck.toml"]);
        assert!(matches!(cli.command, Command::InitPolicy { force: true, .. }));
    }
}
