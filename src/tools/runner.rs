use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, ChildStdout, Command, ExitStatus, Stdio};

use tracing::{debug, info};

use crate::tools::{Tool, ToolError, ToolInvocation, TOOLS_DIR_ENV};

/// Captured result of a successful run
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Locates and runs tool binaries
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    /// When set, binaries are resolved only inside this directory
    tools_dir: Option<PathBuf>,
}

impl ToolRunner {
    /// Resolve binaries from `LONGREAD_QC_TOOLS_DIR` if set, else from `PATH`
    #[must_use]
    pub fn from_env() -> Self {
        let tools_dir = std::env::var_os(TOOLS_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        if let Some(dir) = &tools_dir {
            debug!("Resolving tools from {}", dir.display());
        }
        Self { tools_dir }
    }

    /// Resolve binaries only inside `dir`
    #[must_use]
    pub fn with_tools_dir(dir: &Path) -> Self {
        Self {
            tools_dir: Some(dir.to_path_buf()),
        }
    }

    #[must_use]
    pub fn tools_dir(&self) -> Option<&Path> {
        self.tools_dir.as_deref()
    }

    /// Program to execute for a tool
    #[must_use]
    pub fn program(&self, tool: Tool) -> OsString {
        match &self.tools_dir {
            Some(dir) => dir.join(tool.binary_name()).into_os_string(),
            None => OsString::from(tool.binary_name()),
        }
    }

    fn command(&self, invocation: &ToolInvocation) -> Command {
        let mut command = Command::new(self.program(invocation.tool()));
        command.args(invocation.get_args());
        command
    }

    fn spawn_error(tool: Tool, source: io::Error) -> ToolError {
        if source.kind() == io::ErrorKind::NotFound {
            ToolError::NotFound { tool, source }
        } else {
            ToolError::Spawn { tool, source }
        }
    }

    fn check_status(tool: Tool, status: ExitStatus, stderr: String) -> Result<String, ToolError> {
        if status.success() {
            if !stderr.trim().is_empty() {
                debug!("{} stderr:\n{}", tool, stderr.trim_end());
            }
            Ok(stderr)
        } else {
            Err(ToolError::Failed {
                tool,
                code: status.code(),
                stderr,
            })
        }
    }

    /// Run to completion with stdin closed, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if the binary is missing,
    /// `ToolError::Spawn` if it cannot be started, and `ToolError::Failed`
    /// (carrying stderr verbatim) on a non-zero exit.
    pub fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let tool = invocation.tool();
        info!("Running: {invocation}");

        let output = self
            .command(invocation)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(tool, e))?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let stderr = Self::check_status(tool, output.status, stderr)?;
        Ok(ToolOutput {
            stdout: output.stdout,
            stderr,
        })
    }

    /// Run with data piped through stdin and stdout.
    ///
    /// `feed` writes the input on its own thread and the pipe is closed when
    /// it returns. `consume` reads stdout on the calling thread while stderr
    /// is drained on a third thread, so none of the pipes can fill up and
    /// stall the child. A non-zero exit takes precedence over stream errors
    /// (a failing tool usually also breaks the pipe).
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ToolRunner::run`], plus
    /// `ToolError::Stream` if feeding or consuming fails.
    pub fn run_streaming<T, F, G>(
        &self,
        invocation: &ToolInvocation,
        feed: F,
        consume: G,
    ) -> Result<(T, String), ToolError>
    where
        T: Send,
        F: FnOnce(ChildStdin) -> io::Result<()> + Send,
        G: FnOnce(&mut ChildStdout) -> io::Result<T>,
    {
        let tool = invocation.tool();
        info!("Running: {invocation}");

        let mut child = self
            .command(invocation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::spawn_error(tool, e))?;

        let missing_pipe = || ToolError::Stream {
            tool,
            source: io::Error::other("child pipe was not captured"),
        };
        let stdin = child.stdin.take().ok_or_else(missing_pipe)?;
        let mut stdout = child.stdout.take().ok_or_else(missing_pipe)?;
        let mut stderr = child.stderr.take().ok_or_else(missing_pipe)?;

        let (fed, consumed, drained) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || feed(stdin));
            let drainer = scope.spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf).map(|_| buf)
            });

            let consumed = consume(&mut stdout);
            if consumed.is_err() {
                // Keep the child writable so the writer thread can finish
                let _ = io::copy(&mut stdout, &mut io::sink());
            }

            let fed = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            let drained = drainer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));
            (fed, consumed, drained)
        });

        let status = child
            .wait()
            .map_err(|source| ToolError::Stream { tool, source })?;
        let stderr_text = drained
            .map(|buf| String::from_utf8_lossy(&buf).to_string())
            .unwrap_or_default();
        let stderr_text = Self::check_status(tool, status, stderr_text)?;

        fed.map_err(|source| ToolError::Stream { tool, source })?;
        let value = consumed.map_err(|source| ToolError::Stream { tool, source })?;
        Ok((value, stderr_text))
    }

    /// First non-empty line of `<tool> --version`
    ///
    /// # Errors
    ///
    /// Returns a `ToolError` if the tool is missing or fails.
    pub fn version(&self, tool: Tool) -> Result<String, ToolError> {
        let output = self.run(&ToolInvocation::new(tool).arg("--version"))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .chain(output.stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("unknown");
        Ok(line.to_string())
    }
}
