//! Common utilities for integration tests.
//!
//! Every test gets its own application base directory with a config file whose
//! collaborators are small shell scripts recording what they were asked to do.

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Child, Command, Output, Stdio},
    time::{Duration, SystemTime},
};

use tempfile::TempDir;

/// Guard that kills and waits on a child process when dropped.
pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        drop(self.0.kill());
        drop(self.0.wait());
    }
}

fn get_appinit_bin() -> &'static str {
    env!("CARGO_BIN_EXE_appinit")
}

/// An application base directory wired up with recording collaborators.
pub struct App {
    dir: TempDir,
}

impl App {
    /// Creates a base directory with a valid application key in `.env`.
    pub fn with_key() -> Self {
        let app = Self::without_key();
        fs::write(app.path(".env"), "APP_NAME=demo\nAPP_KEY=base64:dGVzdA==\n")
            .expect("failed to write env file");
        app
    }

    /// Creates a base directory whose env template lacks an application key.
    pub fn without_key() -> Self {
        let dir = tempfile::tempdir().expect("failed to create base dir");
        let app = Self { dir };
        fs::write(app.path(".env.example"), "APP_NAME=demo\nAPP_KEY=\n")
            .expect("failed to write env template");
        app.write_config("");
        app
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.path("storage/init.lock")
    }

    /// Writes the config, with `migrate_script` replacing the default migration step when non-empty.
    pub fn write_config(&self, migrate_script: &str) {
        let migrate = if migrate_script.is_empty() {
            "echo migrate >> {base_path}/steps.log"
        } else {
            migrate_script
        };
        let config = format!(
            r#"
            [lock]
            stale_after_secs = 300
            poll_interval_ms = 50

            [commands]
            migrate = ["sh", "-c", "{migrate}"]
            optimize = ["sh", "-c", "echo optimize >> {{base_path}}/steps.log"]
            web = ["sh", "-c", "echo $$ web $0 $1 $2 > {{base_path}}/dispatched", "{{host}}", "{{port}}", "{{workers}}"]
            queue = ["sh", "-c", "echo $$ queue $0 $1 > {{base_path}}/dispatched", "{{queue}}", "{{name}}"]
            "#
        );
        fs::write(self.path("appinit.toml"), config).expect("failed to write config");
    }

    /// Places a lock file last modified `age` ago.
    pub fn hold_lock(&self, age: Duration) {
        fs::create_dir_all(self.path("storage")).expect("failed to create storage");
        fs::write(self.lock_path(), "").expect("failed to write lock");
        fs::File::options()
            .write(true)
            .open(self.lock_path())
            .and_then(|file| file.set_modified(SystemTime::now() - age))
            .expect("failed to backdate lock");
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(get_appinit_bin());
        cmd.arg("init")
            .args(args)
            .arg("--config")
            .arg(self.path("appinit.toml"))
            .arg("--base-path")
            .arg(self.base())
            .env_remove("APP_KEY")
            .env_remove("APPINIT_CONFIG")
            .env_remove("APPINIT_BASE_PATH")
            .env("RUST_LOG", "info");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run appinit")
    }

    pub fn spawn(&self, args: &[&str]) -> KillOnDrop {
        KillOnDrop(
            self.command(args)
                .stdout(Stdio::null())
                .spawn()
                .expect("failed to start appinit"),
        )
    }

    /// Lines the init collaborators appended, in order.
    pub fn steps(&self) -> Vec<String> {
        fs::read_to_string(self.path("steps.log"))
            .map(|log| log.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// What the dispatched run-mode recorded: its pid followed by its arguments.
    pub fn dispatched(&self) -> Option<String> {
        fs::read_to_string(self.path("dispatched"))
            .ok()
            .map(|content| content.trim().to_owned())
    }
}
