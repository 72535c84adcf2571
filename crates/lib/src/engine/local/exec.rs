//! Part script execution.
//!
//! Scripts run under `/bin/sh -e -c` in the part's working directory with the
//! `CRAFT_*` environment. Stderr is merged into stdout inside the shell, and
//! the combined stream is copied into the caller's sink as it is produced.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::engine::EngineError;
use crate::step::Step;

const SHELL: &str = "/bin/sh";

/// Run `script` for `part` at `step`.
pub fn run_script(
  part: &str,
  step: Step,
  script: &str,
  cwd: &Path,
  env: &BTreeMap<String, String>,
  output: &mut dyn Write,
) -> Result<(), EngineError> {
  info!(part = %part, step = %step, "running part script");

  let wrapped = format!("exec 2>&1\n{}", script);
  let mut command = Command::new(SHELL);
  command
    .arg("-e")
    .arg("-c")
    .arg(&wrapped)
    .current_dir(cwd)
    .envs(env)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::null());

  debug!(shell = SHELL, working_dir = ?cwd, "spawning process");

  let mut child = command
    .spawn()
    .map_err(|e| EngineError::io(format!("failed to spawn {} for part '{}'", SHELL, part), e))?;

  let streamed = match child.stdout.take() {
    Some(mut stdout) => io::copy(&mut stdout, output).map(|_| ()),
    None => Ok(()),
  }
  .and_then(|()| output.flush());
  if let Err(e) = streamed {
    // Reap the child; with stdout closed it exits on its next write.
    let _ = child.wait();
    return Err(EngineError::io(format!("failed to stream output of part '{}'", part), e));
  }

  let status = child
    .wait()
    .map_err(|e| EngineError::io(format!("failed to wait for script of part '{}'", part), e))?;

  if !status.success() {
    debug!(part = %part, step = %step, code = ?status.code(), "script failed");
    return Err(EngineError::ScriptFailed {
      part: part.to_string(),
      step,
      code: status.code(),
    });
  }

  Ok(())
}

/// Parse `name=value` lines written by a script to its project variables file.
///
/// Blank lines and lines starting with `#` are ignored. Later assignments win.
pub fn parse_project_vars(content: &str) -> Result<BTreeMap<String, String>, String> {
  let mut vars = BTreeMap::new();
  for line in content.lines() {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }
    let Some((name, value)) = line.split_once('=') else {
      return Err(format!("invalid project variable assignment '{}'", line));
    };
    let name = name.trim();
    if name.is_empty() {
      return Err(format!("invalid project variable assignment '{}'", line));
    }
    vars.insert(name.to_string(), value.trim().to_string());
  }
  Ok(vars)
}
