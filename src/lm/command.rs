use super::LanguageModel;
use crate::error::DeckError;
use crate::util::truncate_string;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;

const PROVIDER: &str = "command";
const STDERR_LIMIT: usize = 2000;

/// Local command backend: prompt on stdin, response on stdout.
#[derive(Debug)]
pub struct CommandModel {
    argv: Vec<String>,
}

impl CommandModel {
    /// Split `command` with shell quoting rules and check the program exists.
    pub fn new(command: &str) -> Result<Self, DeckError> {
        let argv = shell_words::split(command).map_err(|err| {
            DeckError::Configuration(format!("parse LM command {command:?}: {err}"))
        })?;
        let Some(program) = argv.first() else {
            return Err(DeckError::Configuration("LM command is empty".to_string()));
        };
        which::which(program).map_err(|err| {
            DeckError::Configuration(format!("LM command {program:?} not found: {err}"))
        })?;
        Ok(Self { argv })
    }
}

impl LanguageModel for CommandModel {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn complete(&self, prompt: &str) -> Result<String, DeckError> {
        let start = Instant::now();
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                DeckError::transport(PROVIDER, format!("spawn {}: {err}", self.argv[0]))
            })?;

        // Feed stdin from a separate thread so a command that writes while it
        // reads cannot fill the stdout pipe and stall both sides.
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.as_bytes().to_vec();
            thread::spawn(move || match stdin.write_all(&prompt) {
                // A command that ignores stdin may exit before the prompt is written.
                Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
                result => result,
            })
        });

        let output = child
            .wait_with_output()
            .map_err(|err| DeckError::transport(PROVIDER, format!("wait for command: {err}")))?;

        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| DeckError::transport(PROVIDER, "prompt writer panicked"))?
                .map_err(|err| DeckError::transport(PROVIDER, format!("write prompt: {err}")))?;
        }

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = prompt.len(),
            response_bytes = output.stdout.len(),
            "lm invoke complete"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeckError::transport(
                PROVIDER,
                format!(
                    "exited with {}: {}",
                    output.status,
                    truncate_string(stderr.trim(), STDERR_LIMIT)
                ),
            ));
        }

        String::from_utf8(output.stdout).map_err(|err| {
            DeckError::transport(PROVIDER, format!("decode stdout as UTF-8: {err}"))
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn echoes_stdin_through_cat() {
        let model = CommandModel::new("cat").expect("cat on PATH");
        assert_eq!(model.complete("hello\n").expect("complete"), "hello\n");
    }

    #[test]
    fn prompt_larger_than_pipe_buffer_round_trips() {
        let model = CommandModel::new("cat").expect("cat on PATH");
        let prompt = "x".repeat(1 << 20);
        let response = model.complete(&prompt).expect("complete");
        assert_eq!(response.len(), prompt.len());
    }

    #[test]
    fn command_ignoring_large_prompt_still_succeeds() {
        let model = CommandModel::new("sh -c 'echo done'").expect("sh on PATH");
        let prompt = "y".repeat(1 << 20);
        assert_eq!(model.complete(&prompt).expect("complete"), "done\n");
    }

    #[test]
    fn non_zero_exit_is_a_transport_error() {
        let model = CommandModel::new("sh -c 'cat >/dev/null; echo boom >&2; exit 3'")
            .expect("sh on PATH");
        let err = model.complete("ignored").unwrap_err();
        assert!(matches!(err, DeckError::Transport { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn missing_program_is_a_configuration_error() {
        let err = CommandModel::new("deckgen-no-such-binary --flag").unwrap_err();
        assert!(matches!(err, DeckError::Configuration(_)));
        let err = CommandModel::new("   ").unwrap_err();
        assert!(matches!(err, DeckError::Configuration(_)));
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        let err = CommandModel::new("sh -c 'unterminated").unwrap_err();
        assert!(matches!(err, DeckError::Configuration(_)));
    }
}
