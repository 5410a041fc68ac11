//! Container runtime access.
//!
//! User containers live entirely in the container runtime; this module only
//! translates list/create/delete into CLI invocations and reads back the exit
//! status. Arguments are always passed as a vector, never through a shell.

use crate::config::UserLayout;
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Argument vector for one runtime CLI invocation (without the binary).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeCommand {
    args: Vec<String>,
}

impl RuntimeCommand {
    pub fn new(subcommand: &str) -> Self {
        Self {
            args: vec![subcommand.to_string()],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn flag(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn env(self, key: &str, value: &str) -> Self {
        self.flag("-e", format!("{}={}", key, value))
    }

    pub fn volume(self, source: &str, target: &str) -> Self {
        self.flag("-v", format!("{}:{}", source, target))
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Captured result of a finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Executes runtime commands. `Err` means the process could not be run at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &RuntimeCommand) -> io::Result<CommandOutput>;
}

/// Runs commands as child processes of the given CLI binary.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: String,
}

impl ProcessRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &RuntimeCommand) -> io::Result<CommandOutput> {
        debug!(binary = %self.binary, args = ?command.args(), "invoking container runtime");
        let output = Command::new(&self.binary)
            .args(command.args())
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("User already exists")]
    AlreadyExists(String),

    /// The runtime exited non-zero; carries its stderr verbatim.
    #[error("{stderr}")]
    CommandFailed { stderr: String },

    #[error("{0}")]
    Spawn(#[from] io::Error),
}

/// The user-container operations the HTTP layer depends on.
#[async_trait]
pub trait UserRuntime: Send + Sync {
    /// Ids of running user containers. Any failure yields an empty list.
    async fn list_users(&self) -> Vec<String>;

    async fn create_user(&self, id: &str, password: &str) -> Result<(), RuntimeError>;

    async fn delete_user(&self, id: &str) -> Result<(), RuntimeError>;
}

/// [`UserRuntime`] backed by a docker-compatible CLI.
pub struct DockerUsers<R = ProcessRunner> {
    runner: R,
    layout: UserLayout,
}

impl<R: CommandRunner> DockerUsers<R> {
    pub fn new(runner: R, layout: UserLayout) -> Self {
        Self { runner, layout }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn layout(&self) -> &UserLayout {
        &self.layout
    }

    /// Whether a container (running or stopped) with exactly this name exists.
    async fn container_exists(&self, name: &str) -> Result<bool, RuntimeError> {
        let command = RuntimeCommand::new("ps")
            .arg("-a")
            .flag("--format", "{{.Names}}")
            .flag("--filter", format!("name={}", name));
        let output = self.runner.run(&command).await?;
        Ok(output.stdout.lines().any(|line| line.trim() == name))
    }

    fn run_command(&self, id: &str, password: &str) -> RuntimeCommand {
        let name = self.layout.container_name(id);
        let mut command = RuntimeCommand::new("run")
            .arg("-d")
            .flag("--name", name.clone())
            .flag("--hostname", name)
            .env("VNC_PASSWORD", password)
            .env("TZ", &self.layout.timezone);
        for (source, target) in self.layout.volumes(id) {
            command = command.volume(&source, &target);
        }
        command
            .flag("--shm-size", self.layout.shm_size.clone())
            .flag("--network", self.layout.network.clone())
            .flag("--restart", self.layout.restart.clone())
            .arg(self.layout.image.clone())
    }
}

/// Recover user ids from `ps --format {{.Names}}` output.
fn user_ids(stdout: &str, prefix: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(prefix))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl<R: CommandRunner> UserRuntime for DockerUsers<R> {
    async fn list_users(&self) -> Vec<String> {
        let prefix = &self.layout.prefix;
        let command = RuntimeCommand::new("ps")
            .flag("--format", "{{.Names}}")
            .flag("--filter", format!("name={}", prefix));

        match self.runner.run(&command).await {
            Ok(output) if output.success() => user_ids(&output.stdout, prefix),
            Ok(output) => {
                debug!(exit_code = ?output.exit_code, stderr = %output.stderr.trim(), "listing containers failed");
                Vec::new()
            }
            Err(e) => {
                debug!(error = %e, "listing containers failed");
                Vec::new()
            }
        }
    }

    async fn create_user(&self, id: &str, password: &str) -> Result<(), RuntimeError> {
        let name = self.layout.container_name(id);
        if self.container_exists(&name).await? {
            return Err(RuntimeError::AlreadyExists(id.to_string()));
        }

        let output = self.runner.run(&self.run_command(id, password)).await?;
        if !output.success() {
            return Err(RuntimeError::CommandFailed {
                stderr: output.stderr,
            });
        }

        info!(container = %name, id = %output.stdout.trim(), "started user container");
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), RuntimeError> {
        let name = self.layout.container_name(id);

        // A stop failure never prevents the remove attempt.
        match self.runner.run(&RuntimeCommand::new("stop").arg(name.clone())).await {
            Ok(output) if !output.success() => {
                debug!(container = %name, stderr = %output.stderr.trim(), "stop failed");
            }
            Err(e) => debug!(container = %name, error = %e, "stop failed"),
            Ok(_) => {}
        }

        let output = self.runner.run(&RuntimeCommand::new("rm").arg(name.clone())).await?;
        if !output.success() {
            return Err(RuntimeError::CommandFailed {
                stderr: output.stderr,
            });
        }

        info!(container = %name, "removed user container");
        Ok(())
    }
}
