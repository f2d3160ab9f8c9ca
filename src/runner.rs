use crate::env::Environment;
use crate::error::{InstallError, InstallResult};
use crate::models::{ArgValue, ArgumentMap, ExternalCommandSpec};
use crate::utils::shell_quote;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Directory checked for system-wide installs before falling back to PATH
const SYSTEM_BIN_DIR: &str = "/usr/local/bin";

/// Interpreter used to run bundled `.phar` artifacts
const PHAR_RUNTIME: &str = "php";

/// A shell command line ready to be executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub line: String,
    pub working_dir: PathBuf,
    /// Attach the child to the terminal instead of streaming its output
    pub interactive: bool,
}

/// Child-process capability
pub trait ProcessRunner {
    /// Run `command` to completion and return its exit code.
    ///
    /// Non-interactive runs call `on_line` once per line of combined
    /// stdout/stderr while the child is still running.
    fn run(&self, command: &ShellCommand, on_line: &mut dyn FnMut(&str)) -> InstallResult<i32>;
}

/// What to return when neither a phar nor a system binary is found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFallback {
    /// `<cwd>/vendor/bin/<name>`, installed by the dependency manager
    ProjectLocal,
    /// The bare name, left to the shell's PATH lookup
    Bare,
}

/// Resolve how to invoke `name`.
///
/// Precedence: a bundled `phar` in the working directory when `php` is
/// available, then a system install, then `fallback`.
pub fn locate_binary(
    env: &dyn Environment,
    name: &str,
    phar: Option<&str>,
    fallback: BinaryFallback,
) -> String {
    let cwd = env.current_dir();

    if let Some(phar) = phar
        && env.exists(&cwd.join(phar))
        && let Some(php) = env.find_executable(PHAR_RUNTIME)
    {
        return format!("{} {}", shell_quote(&php.to_string_lossy()), shell_quote(phar));
    }

    if env.exists(&Path::new(SYSTEM_BIN_DIR).join(name)) || env.find_executable(name).is_some() {
        return name.to_string();
    }

    match fallback {
        BinaryFallback::ProjectLocal => {
            shell_quote(&cwd.join("vendor").join("bin").join(name).to_string_lossy())
        }
        BinaryFallback::Bare => name.to_string(),
    }
}

/// Serialise arguments in map order.
///
/// Lists become `key[]=a&key[]=b`, `true` becomes a bare `key`, `false` is
/// dropped, anything else is `key=value`. Nothing is URL-encoded.
pub fn serialize_arguments(arguments: &ArgumentMap) -> Vec<String> {
    arguments
        .iter()
        .filter_map(|(key, value)| match value {
            ArgValue::List(items) => Some(
                items
                    .iter()
                    .map(|item| format!("{key}[]={item}"))
                    .collect::<Vec<_>>()
                    .join("&"),
            ),
            ArgValue::Flag(true) => Some(key.to_string()),
            ArgValue::Flag(false) => None,
            ArgValue::Value(value) => Some(format!("{key}={value}")),
        })
        .collect()
}

/// Build the full command line for `spec`: binary, subcommands, arguments
pub fn command_line(env: &dyn Environment, spec: &ExternalCommandSpec) -> String {
    let binary = locate_binary(
        env,
        &spec.binary_name,
        spec.phar_fallback_name.as_deref(),
        BinaryFallback::ProjectLocal,
    );

    std::iter::once(binary)
        .chain(spec.subcommand_tokens.iter().map(|t| shell_quote(t)))
        .chain(serialize_arguments(&spec.arguments).iter().map(|a| shell_quote(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs commands through the platform shell
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    fn shell(line: &str) -> Command {
        if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(line);
            command
        } else {
            let mut command = Command::new("sh");
            command.arg("-c").arg(line);
            command
        }
    }

    fn run_streaming(
        command: &ShellCommand,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<ExitStatus> {
        let (reader, writer) = io::pipe()?;

        let mut child = {
            let mut cmd = Self::shell(&command.line);
            cmd.current_dir(&command.working_dir)
                .stdin(Stdio::inherit())
                .stdout(writer.try_clone()?)
                .stderr(writer);
            cmd.spawn()?
            // `cmd` drops here, closing our copies of the write end
        };

        stream_lines(reader, on_line)?;
        child.wait()
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &ShellCommand, on_line: &mut dyn FnMut(&str)) -> InstallResult<i32> {
        log::debug!(
            "Running `{}` in {} (interactive: {})",
            command.line,
            command.working_dir.display(),
            command.interactive
        );

        let status = if command.interactive {
            Self::shell(&command.line)
                .current_dir(&command.working_dir)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
        } else {
            Self::run_streaming(command, on_line)
        }
        .map_err(|source| InstallError::Command {
            command: command.line.clone(),
            source,
        })?;

        // Killed by a signal: no code, report failure
        Ok(status.code().unwrap_or(1))
    }
}

/// Blocking read loop: call `on_line` for every line until EOF
pub fn stream_lines<R: Read>(reader: R, on_line: &mut dyn FnMut(&str)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(line.trim_end_matches(['\n', '\r']));
    }
}
