use std::process::Command;

use tracing::{info, warn};

use crate::constants::launcher::TRAINER_FAILURE_CODE;
use crate::errors::TrainError;

/// External training routine.
///
/// The only contract with shard resolution is the argument vector, which
/// carries the descriptor and optional weights.
pub trait Trainer {
    /// Run to completion and return the trainer's status code.
    fn run(&self, args: &[String]) -> Result<i32, TrainError>;
}

/// Trainer launched as a child process.
#[derive(Clone, Debug)]
pub struct CommandTrainer {
    program: String,
    leading_args: Vec<String>,
}

impl CommandTrainer {
    /// Build from a whitespace-separated command line, e.g. `python -m training.main`.
    pub fn from_command_line(command: &str) -> Result<Self, TrainError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| TrainError::Trainer {
            program: command.to_string(),
            reason: "empty trainer command".to_string(),
        })?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
        })
    }

    /// Program the trainer spawns.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Trainer for CommandTrainer {
    fn run(&self, args: &[String]) -> Result<i32, TrainError> {
        info!(program = %self.program, args = args.len(), "starting trainer");
        let status = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .status()
            .map_err(|err| TrainError::Trainer {
                program: self.program.clone(),
                reason: err.to_string(),
            })?;
        let code = status.code().unwrap_or(TRAINER_FAILURE_CODE);
        if !status.success() {
            warn!(program = %self.program, code, "trainer exited with failure");
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_is_split_into_program_and_args() {
        let trainer = CommandTrainer::from_command_line("python -m training.main").unwrap();
        assert_eq!(trainer.program(), "python");
        assert_eq!(trainer.leading_args, vec!["-m", "training.main"]);
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(matches!(
            CommandTrainer::from_command_line("   "),
            Err(TrainError::Trainer { .. })
        ));
    }

    #[test]
    fn missing_program_fails_to_start() {
        let trainer = CommandTrainer::from_command_line("/nonexistent/shardsource-trainer").unwrap();
        assert!(matches!(
            trainer.run(&[]),
            Err(TrainError::Trainer { .. })
        ));
    }
}
