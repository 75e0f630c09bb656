use super::RemoteLister;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::instrument;

/// Lists the server by running an external program and capturing its output.
///
/// The default configuration runs `rsync --recursive --list-only` against the
/// Kiwix rsync module, but any program printing one path per line will do.
///
/// The program is looked up on every [`list`](RemoteLister::list) call, so a
/// missing program is an ordinary listing failure rather than a setup error.
#[derive(Debug, Clone)]
pub struct CommandLister {
    program: String,
    args: Vec<String>,
}

impl CommandLister {
    /// The first element of `command` is the program (a name looked up
    /// through `PATH`, or a path); the rest are its arguments.
    pub fn new(command: &[String]) -> Self {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (String::new(), Vec::new()),
        };
        Self { program, args }
    }

    fn resolve(&self) -> Result<PathBuf> {
        if self.program.is_empty() {
            exn::bail!(ErrorKind::ProgramNotFound(String::new()));
        }
        let resolved = which::which(&self.program).or_raise(|| ErrorKind::ProgramNotFound(self.program.clone()))?;
        tracing::trace!(program = %resolved.display(), "Resolved remote listing program");
        Ok(resolved)
    }
}

#[async_trait]
impl RemoteLister for CommandLister {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(skip(self), fields(program = %self.program))]
    async fn list(&self) -> Result<String> {
        let program = self.resolve()?;
        let output = Command::new(&program).args(&self.args).output().await.map_err(ErrorKind::Io)?;
        if !output.stderr.is_empty() {
            tracing::warn!(stderr = %String::from_utf8_lossy(&output.stderr).trim(), "Remote listing reported errors");
        }
        if !output.status.success() {
            exn::bail!(ErrorKind::CommandFailed(output.status.code()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&["definitely-not-a-real-program-zimsync", "--list-only"], "definitely-not-a-real-program-zimsync")]
    #[case(&[], "")]
    #[tokio::test]
    async fn test_missing_program_fails_on_list(#[case] parts: &[&str], #[case] name: &str) {
        let lister = CommandLister::new(&command(parts));
        assert_eq!(lister.name(), name);
        let err = lister.list().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ProgramNotFound(program) if program == name));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_captures_stdout() {
        let lister = CommandLister::new(&command(&["sh", "-c", "printf 'wikipedia/a_2020-01.zim\\nwikipedia/a_2020-02.zim\\n'"]));
        assert_eq!(lister.name(), "sh");
        let listing = lister.list().await.unwrap();
        assert_eq!(listing.lines().count(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_failure() {
        let lister = CommandLister::new(&command(&["sh", "-c", "echo oops >&2; exit 3"]));
        let err = lister.list().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::CommandFailed(Some(3))));
    }
}
