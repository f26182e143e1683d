//! Line commands typed at the dashboard prompt.

use lib_common::core::dispatcher::{CommandDispatcher, Dispatch};
use lib_common::TaskId;
use thiserror::Error;

/// Help text printed for `help`.
pub const HELP: &str = "commands: sync <brand> | run <task id or bot name> | generate <brand> | revenue <amount> | kill | help | quit";

/// What to run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunTarget {
    /// A task id such as `kdp_uploader`.
    Task(TaskId),
    /// A bot display name such as `KDP Uploader`.
    Bot(String),
}

/// One parsed prompt line.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// `sync <brand>`
    Sync(String),
    /// `run <task|bot>`
    Run(RunTarget),
    /// `generate <brand>`
    Generate(String),
    /// `revenue <amount>`
    Revenue(f64),
    /// `kill`
    Kill,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// First word is not a command.
    #[error("unknown command '{0}' (type help)")]
    Unknown(String),
    /// The command needs an argument.
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    /// `revenue` argument is not a number.
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

/// Parses one prompt line.
pub fn parse(line: &str) -> Result<UserCommand, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(InputError::Empty);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let required = |name: &'static str| {
        if rest.is_empty() {
            Err(InputError::MissingArgument(name))
        } else {
            Ok(rest.to_string())
        }
    };

    match word.to_ascii_lowercase().as_str() {
        "sync" => required("sync").map(UserCommand::Sync),
        "generate" | "gen" => required("generate").map(UserCommand::Generate),
        "run" => {
            let target = required("run")?;
            Ok(UserCommand::Run(match target.parse::<TaskId>() {
                Ok(task) => RunTarget::Task(task),
                Err(_) => RunTarget::Bot(target),
            }))
        }
        "revenue" => {
            let raw = required("revenue")?;
            raw.trim_start_matches('$')
                .parse::<f64>()
                .map(UserCommand::Revenue)
                .map_err(|_| InputError::NotANumber(raw))
        }
        "kill" => Ok(UserCommand::Kill),
        "help" | "?" => Ok(UserCommand::Help),
        "quit" | "exit" | "q" => Ok(UserCommand::Quit),
        other => Err(InputError::Unknown(other.to_string())),
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Keep going and show this notice.
    Notice(String),
    /// Leave the dashboard.
    Quit,
}

fn describe(dispatch: Dispatch, started: String) -> String {
    match dispatch {
        Dispatch::Started(_) => started,
        Dispatch::AlreadyPending => "already in progress".to_string(),
        Dispatch::NoTask => "nothing to run for that name".to_string(),
    }
}

/// Hands `command` to the dispatcher and describes what happened.
pub fn execute(command: UserCommand, dispatcher: &CommandDispatcher) -> Reply {
    let notice = match command {
        UserCommand::Sync(brand) => {
            let dispatch = dispatcher.sync(&brand);
            describe(dispatch, format!("syncing {brand}"))
        }
        UserCommand::Run(RunTarget::Task(task)) => describe(dispatcher.run(task), format!("running {task}")),
        UserCommand::Run(RunTarget::Bot(name)) => {
            let dispatch = dispatcher.run_for_bot(&name);
            describe(dispatch, format!("running {name}"))
        }
        UserCommand::Generate(brand) => {
            let dispatch = dispatcher.generate(&brand);
            describe(dispatch, format!("generating a batch for {brand}"))
        }
        UserCommand::Revenue(amount) => match dispatcher.submit_revenue(amount) {
            Ok(dispatch) => describe(dispatch, format!("recording ${amount:.2}")),
            Err(e) => e.to_string(),
        },
        UserCommand::Kill => describe(dispatcher.kill_all(), "stopping all tasks".to_string()),
        UserCommand::Help => HELP.to_string(),
        UserCommand::Quit => return Reply::Quit,
    };
    Reply::Notice(notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_common::core::poller::{PollPlan, Poller};
    use lib_common::{DashboardApi, DeploymentMode, Reconciler};
    use std::sync::Arc;

    #[test]
    fn parses_every_command() {
        assert_eq!(parse("sync richesse"), Ok(UserCommand::Sync("richesse".into())));
        assert_eq!(parse("  GENERATE heritage "), Ok(UserCommand::Generate("heritage".into())));
        assert_eq!(parse("run kdp_uploader"), Ok(UserCommand::Run(RunTarget::Task(TaskId::KdpUploader))));
        assert_eq!(
            parse("run KDP Orchestrator"),
            Ok(UserCommand::Run(RunTarget::Bot("KDP Orchestrator".into())))
        );
        assert_eq!(parse("revenue $12.50"), Ok(UserCommand::Revenue(12.5)));
        assert_eq!(parse("kill"), Ok(UserCommand::Kill));
        assert_eq!(parse("q"), Ok(UserCommand::Quit));
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(parse("   "), Err(InputError::Empty));
        assert_eq!(parse("sync"), Err(InputError::MissingArgument("sync")));
        assert_eq!(parse("revenue lots"), Err(InputError::NotANumber("lots".into())));
        assert_eq!(parse("dance"), Err(InputError::Unknown("dance".into())));
    }

    fn dispatcher() -> (CommandDispatcher, Poller) {
        let backend = Arc::new(DashboardApi::unconfigured());
        let reconciler = Arc::new(Reconciler::new(DeploymentMode::Remote));
        let poller = Poller::new(DeploymentMode::Remote, PollPlan::full(), backend.clone(), reconciler);
        (CommandDispatcher::new(backend, poller.refresher()), poller)
    }

    #[tokio::test]
    async fn execute_describes_the_outcome() {
        let (dispatcher, _poller) = dispatcher();

        assert_eq!(
            execute(UserCommand::Sync("richesse".into()), &dispatcher),
            Reply::Notice("syncing richesse".into())
        );
        assert_eq!(
            execute(UserCommand::Sync("richesse".into()), &dispatcher),
            Reply::Notice("already in progress".into())
        );
        assert_eq!(
            execute(UserCommand::Generate("nowhere".into()), &dispatcher),
            Reply::Notice("nothing to run for that name".into())
        );
        assert!(matches!(
            execute(UserCommand::Revenue(-4.0), &dispatcher),
            Reply::Notice(text) if text.contains("positive")
        ));
        assert_eq!(execute(UserCommand::Quit, &dispatcher), Reply::Quit);
    }
}
