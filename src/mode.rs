//! Execution modes shared by every command

use std::any::Any;

use clap::{parser::ValueSource, ArgMatches};

use crate::error::{Error, Result};

pub const DRY_RUN: &str = "dry_run";
pub const OUTPUT: &str = "output";
pub const WAIT: &str = "wait";

/// How a single invocation should behave, resolved once from command line flags
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionMode {
    dry_run: bool,
    output: Option<String>,
    wait: bool,
}

impl ExecutionMode {
    pub fn new(dry_run: bool, output: Option<String>, wait: bool) -> Self {
        Self {
            dry_run,
            output: output.filter(|o| !o.is_empty()),
            wait,
        }
    }

    /// Flags the command does not declare, or which were not given explicitly,
    /// resolve to their zero values
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Ok(Self::new(
            flag::<bool>(matches, DRY_RUN)?.unwrap_or_default(),
            flag::<String>(matches, OUTPUT)?,
            flag::<bool>(matches, WAIT)?.unwrap_or_default(),
        ))
    }

    /// Nothing should be submitted to the cluster
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn output_format(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn output_requested(&self) -> bool {
        self.output.is_some()
    }

    /// Waiting only makes sense after a real change, and only when narrative
    /// output is shown
    pub fn should_wait(&self) -> bool {
        self.wait && !self.dry_run && !self.output_requested()
    }
}

fn flag<T: Any + Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<Option<T>> {
    if !matches.try_contains_id(id).unwrap_or(false) {
        return Ok(None);
    }
    if matches.value_source(id) != Some(ValueSource::CommandLine) {
        return Ok(None);
    }
    matches
        .try_get_one::<T>(id)
        .map(|v| v.cloned())
        .map_err(|e| Error::validation(format!("invalid --{} flag: {}", id.replace('_', "-"), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};

    fn command() -> Command {
        Command::new("patch")
            .arg(Arg::new(DRY_RUN).long("dry-run").action(ArgAction::SetTrue))
            .arg(Arg::new(OUTPUT).long("output"))
            .arg(Arg::new(WAIT).long("wait").action(ArgAction::SetTrue))
    }

    #[test]
    fn should_wait_combinations() {
        for dry_run in [false, true] {
            for wait in [false, true] {
                for output in [false, true] {
                    let mode =
                        ExecutionMode::new(dry_run, output.then(|| "yaml".to_owned()), wait);
                    assert_eq!(
                        mode.should_wait(),
                        wait && !dry_run && !output,
                        "dry_run={dry_run} wait={wait} output={output}"
                    );
                }
            }
        }
    }

    #[test]
    fn empty_output_is_narrative() {
        let mode = ExecutionMode::new(false, Some(String::new()), true);
        assert!(!mode.output_requested());
        assert!(mode.should_wait());
    }

    #[test]
    fn resolves_given_flags() {
        let matches = command()
            .try_get_matches_from(["patch", "--dry-run", "--output", "json", "--wait"])
            .unwrap();
        let mode = ExecutionMode::from_matches(&matches).unwrap();
        assert_eq!(mode, ExecutionMode::new(true, Some("json".to_owned()), true));
        assert!(!mode.should_wait());
    }

    #[test]
    fn unset_flags_are_zero() {
        let matches = command().try_get_matches_from(["patch"]).unwrap();
        assert_eq!(
            ExecutionMode::from_matches(&matches).unwrap(),
            ExecutionMode::default()
        );
    }

    #[test]
    fn defaults_are_not_explicit() {
        let matches = Command::new("get")
            .arg(Arg::new(OUTPUT).long("output").default_value("yaml"))
            .try_get_matches_from(["get"])
            .unwrap();
        assert!(!ExecutionMode::from_matches(&matches)
            .unwrap()
            .output_requested());
    }

    #[test]
    fn undeclared_flags_are_zero() {
        let matches = Command::new("delete")
            .arg(Arg::new(DRY_RUN).long("dry-run").action(ArgAction::SetTrue))
            .try_get_matches_from(["delete", "--dry-run"])
            .unwrap();
        let mode = ExecutionMode::from_matches(&matches).unwrap();
        assert!(mode.is_dry_run());
        assert!(!mode.output_requested());
        assert!(!mode.should_wait());
    }
}
