//! Dependency installation through the project's package manager
//!
//! Runs `npm install` / `yarn add` / ... in the project directory and
//! streams the package manager's output.

use super::check::PackageManager;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Timeout for one install invocation (5 minutes)
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Installs packages with one package manager
pub struct Installer {
    manager: PackageManager,
    timeout: Duration,
}

impl Installer {
    pub fn new(manager: PackageManager) -> Self {
        Self {
            manager,
            timeout: INSTALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn manager(&self) -> PackageManager {
        self.manager
    }

    /// Human-readable command line for an install
    pub fn command_line(&self, packages: &[String], dev: bool) -> String {
        let mut parts = vec![self.manager.binary().to_string()];
        parts.extend(self.manager.install_args(packages, dev));
        parts.join(" ")
    }

    /// Whether the package manager binary can be run
    pub fn is_available(&self) -> bool {
        self.manager.check().available
    }

    /// Install `packages` into the project at `project_dir`.
    /// Shows the command being executed and streams output.
    pub async fn install(&self, project_dir: &Path, packages: &[String], dev: bool) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }

        let cmd = self.command_line(packages, dev);
        println!();
        println!("{} {}", "Running:".dimmed(), cmd.yellow());
        println!();

        let mut child = TokioCommand::new(self.manager.binary())
            .args(self.manager.install_args(packages, dev))
            .current_dir(project_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.manager.binary()))?;

        let stdout = child
            .stdout
            .take()
            .context("Failed to capture package manager stdout")?;
        let stderr = child
            .stderr
            .take()
            .context("Failed to capture package manager stderr")?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let output_task = async {
            let mut stdout_done = false;
            let mut stderr_done = false;
            while !(stdout_done && stderr_done) {
                tokio::select! {
                    line = stdout_reader.next_line(), if !stdout_done => {
                        match line {
                            Ok(Some(line)) => println!("  {}", line),
                            Ok(None) => stdout_done = true,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stdout:".red(), e);
                                stdout_done = true;
                            }
                        }
                    }
                    line = stderr_reader.next_line(), if !stderr_done => {
                        match line {
                            Ok(Some(line)) => eprintln!("  {}", line.yellow()),
                            Ok(None) => stderr_done = true,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stderr:".red(), e);
                                stderr_done = true;
                            }
                        }
                    }
                }
            }
        };

        if timeout(self.timeout, output_task).await.is_err() {
            let _ = child.kill().await;
            println!();
            anyhow::bail!(
                "Installation timed out after {} seconds.\n\
                 Please try again or install manually:\n\
                 {}",
                self.timeout.as_secs(),
                cmd
            );
        }

        match timeout(Duration::from_secs(10), child.wait()).await {
            Ok(Ok(status)) => {
                println!();
                if status.success() {
                    Ok(())
                } else {
                    anyhow::bail!(
                        "Installation failed with exit code: {}\n\
                         Please try installing manually: {}",
                        status.code().unwrap_or(-1),
                        cmd
                    );
                }
            }
            Ok(Err(e)) => {
                anyhow::bail!("Failed to wait for {}: {}", self.manager.binary(), e);
            }
            Err(_) => {
                let _ = child.kill().await;
                anyhow::bail!(
                    "{} hung after closing its output. Please try installing manually:\n{}",
                    self.manager.binary(),
                    cmd
                );
            }
        }
    }

    /// Open the package manager's installation docs in the default browser
    pub fn open_docs(&self) -> Result<()> {
        println!(
            "{}",
            format!("Opening {} installation docs in your browser...", self.manager).cyan()
        );
        open::that(self.manager.docs_url())?;
        Ok(())
    }
}
