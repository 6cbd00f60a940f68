//! Hermetic sandbox for driving the `kiabom` binary in tests.
//!
//! - `HOME`, `XDG_CONFIG_HOME` and the supplier cache point inside the sandbox
//! - Supplier credentials from the caller's environment never leak in
//! - Files are written relative to the sandbox root
//!
//! Everything lives under an `assert_fs::TempDir` and is cleaned up on drop.
//!
//! ## Quick example
//! ```no_run
//! use kiabom_test_utils::sandbox::Sandbox;
//!
//! let mut sb = Sandbox::new();
//! sb.write("board.xml", "<export/>");
//! let stdout = sb.run("kiabom", ["board.xml", "bom.csv", "-k"], None).unwrap();
//! println!("{stdout}");
//! ```

use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use duct::Expression;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

/// Environment variable the binary reads its cache location from.
pub const CACHE_DIR_ENV: &str = "KIABOM_CACHE_DIR";

pub struct Sandbox {
    root: TempDir,
    pub home: PathBuf,
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    default_cwd: PathBuf,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create a new sandbox; all state is under an auto-cleaned TempDir.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create sandbox TempDir");
        let home = root.child("home").to_path_buf();
        let config_dir = home.join(".config");
        let cache_dir = root.child("cache").to_path_buf();

        fs::create_dir_all(&config_dir).expect("create config dir");
        fs::create_dir_all(&cache_dir).expect("create cache dir");

        let default_cwd = root.path().to_path_buf();
        Self {
            root,
            home,
            config_dir,
            cache_dir,
            default_cwd,
        }
    }

    /// Absolute path to the sandbox root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write/overwrite a file relative to the sandbox root.
    pub fn write<P: AsRef<Path>, S: AsRef<[u8]>>(&mut self, rel: P, contents: S) -> &mut Self {
        let p = self.root_path().join(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(p, contents).expect("write file");
        self
    }

    /// Read a file relative to the sandbox root.
    pub fn read<P: AsRef<Path>>(&self, rel: P) -> String {
        fs::read_to_string(self.root_path().join(rel)).expect("read file")
    }

    /// Write the user config the binary picks up by default.
    pub fn write_user_config<S: AsRef<[u8]>>(&mut self, contents: S) -> &mut Self {
        let path = self.config_dir.join("kiabom").join("config.toml");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, contents).expect("write user config");
        self
    }

    /// Run a cargo binary inside this sandbox and return stdout as String.
    /// Errors if the process exits with non-zero status.
    pub fn run<I>(&self, program: &str, args: I, cwd: Option<&Path>) -> Result<String, String>
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        self.cmd(program, args, cwd)
            .read()
            .map_err(|e| format!("command failed: {e}"))
    }

    /// Run a cargo binary and capture its full output without checking the
    /// exit status.
    pub fn output<I>(&self, program: &str, args: I, cwd: Option<&Path>) -> Output
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        self.cmd(program, args, cwd)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .expect("spawn command")
    }

    fn cmd<I>(&self, program: &str, args: I, cwd: Option<&Path>) -> Expression
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let cargo_bin_path = assert_cmd::cargo::cargo_bin(program)
            .to_string_lossy()
            .to_string();
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();

        let working_dir = match cwd {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.root_path().join(dir),
            None => self.default_cwd.clone(),
        };

        self.inject_env(duct::cmd(&cargo_bin_path, args).dir(working_dir))
    }

    pub fn inject_env(&self, expr: Expression) -> Expression {
        let mut env_map: HashMap<String, String> = HashMap::new();
        if let Ok(path) = std::env::var("PATH") {
            env_map.insert("PATH".into(), path);
        }
        env_map.insert("HOME".into(), self.home.to_string_lossy().into_owned());
        env_map.insert(
            "XDG_CONFIG_HOME".into(),
            self.config_dir.to_string_lossy().into_owned(),
        );
        env_map.insert(
            CACHE_DIR_ENV.into(),
            self.cache_dir.to_string_lossy().into_owned(),
        );
        env_map.insert("NO_COLOR".into(), "1".into());

        expr.full_env(&env_map)
    }
}
