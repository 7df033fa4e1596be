use std::io;
use std::process::Command;

use crate::ProvisionError;

/// Exit code and both streams of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

/// Runs a command to completion, capturing stdout and stderr. No timeout.
pub trait CommandRunner {
    fn run(&self, command: &mut Command) -> io::Result<CapturedOutput>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &mut Command) -> io::Result<CapturedOutput> {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let output = command.output()?;
        Ok(CapturedOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

pub fn render_command_line(command: &Command) -> String {
    let mut parts = vec![quote_arg(&command.get_program().to_string_lossy())];
    parts.extend(
        command
            .get_args()
            .map(|arg| quote_arg(&arg.to_string_lossy())),
    );
    parts.join(" ")
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

/// Runs `command` and turns a spawn failure or non-zero exit into a
/// [`ProvisionError::Process`] carrying the command line and both captured
/// streams.
pub fn run_checked(
    runner: &dyn CommandRunner,
    command: &mut Command,
    context: &str,
) -> Result<CapturedOutput, ProvisionError> {
    let command_line = render_command_line(command);
    let output = runner
        .run(command)
        .map_err(|err| ProvisionError::Process {
            context: context.to_string(),
            command_line: command_line.clone(),
            status: "failure to start".to_string(),
            stdout: String::new(),
            stderr: err.to_string(),
        })?;
    if output.success() {
        return Ok(output);
    }

    Err(ProvisionError::Process {
        context: context.to_string(),
        command_line,
        status: output.status_label(),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
