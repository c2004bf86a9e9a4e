//! Shared test infrastructure for integration tests.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Variables that would otherwise leak the developer's setup into a run.
const ISOLATED_VARS: &[&str] = &[
    "DECKGEN_CONFIG",
    "DECKGEN_LM_COMMAND",
    "PROVIDER",
    "HOST",
    "API_KEY",
    "MODEL",
    "OUTPUT_PATH",
    "IMAGES_PATH",
    "CACHE_PATH",
    "RUST_LOG",
];

pub fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

pub fn fixture(name: &str) -> PathBuf {
    manifest_dir().join("tests/fixtures").join(name)
}

/// Scratch directory holding the output, images, cache, and mock call log
/// for one test.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp workspace"),
        }
    }

    /// Write a `.env` file where `deckgen` runs.
    pub fn write_env_file(&self, body: &str) {
        std::fs::write(self.dir.path().join(".env"), body).expect("write .env");
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.path().join("cache.json")
    }

    fn call_log(&self) -> PathBuf {
        self.dir.path().join("calls.log")
    }

    /// A `deckgen` command with a clean environment rooted in this workspace.
    pub fn deckgen(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_deckgen"));
        for var in ISOLATED_VARS {
            command.env_remove(var);
        }
        command
            .current_dir(self.dir.path())
            .env("DECKGEN_MOCK_LOG", self.call_log());
        command
    }

    /// `deckgen generate` against the mock backend with search and images off.
    pub fn generate(&self, topic: &str, slides: u32) -> Command {
        let mut command = self.deckgen();
        command
            .args(["generate", "--topic", topic, "--slides"])
            .arg(slides.to_string())
            .args(["--backend", "command", "--lm-command"])
            .arg(mock_lm_command(&fixture("outline.txt")))
            .arg("--output")
            .arg(self.output_dir())
            .arg("--images")
            .arg(self.dir.path().join("images"))
            .arg("--cache")
            .arg(self.cache_path())
            .args(["--no-search", "--no-images"]);
        command
    }

    /// Number of times the mock backend has been invoked.
    pub fn backend_calls(&self) -> usize {
        std::fs::read_to_string(self.call_log())
            .map(|content| content.lines().count())
            .unwrap_or(0)
    }
}

fn mock_lm_command(outline: &Path) -> String {
    let script = fixture("mock_lm.sh");
    let argv = vec![
        "sh".to_string(),
        script.display().to_string(),
        outline.display().to_string(),
    ];
    shell_words::join(argv)
}

pub fn run(command: &mut Command) -> Output {
    command.output().expect("spawn deckgen")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
