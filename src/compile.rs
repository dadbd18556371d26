use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::errors::BenchError;

/// Flags for the one-shot suite build. Warnings are silenced.
pub const SUITE_FLAGS: &[&str] = &["-w"];

/// Flags for the repeated sampler build.
pub const SAMPLER_FLAGS: &[&str] = &["-O2", "-w"];

/// A C compiler invoked as `<program> [leading...] <sources...> <flags...> -o <exe>`.
#[derive(Debug, Clone)]
pub struct Compiler {
    program: String,
    leading_args: Vec<String>,
    flags: Vec<String>,
}

impl Compiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            flags: Vec::new(),
        }
    }

    /// Arguments placed before the sources, e.g. a script for an interpreter.
    pub fn leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Compile `sources` (relative to `dir`) into `dir/exe_name`.
    ///
    /// The returned guard owns the executable and removes it when dropped.
    /// On failure nothing at `dir/exe_name` is touched.
    pub fn compile(
        &self,
        name: &str,
        dir: &Path,
        sources: &[String],
        exe_name: &str,
    ) -> Result<ExecutableGuard, BenchError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(sources)
            .args(&self.flags)
            .arg("-o")
            .arg(exe_name)
            .current_dir(dir);
        tracing::debug!(benchmark = name, command = ?cmd, "compiling");

        let status = cmd
            .status()
            .map_err(|source| BenchError::CompilerUnavailable {
                compiler: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BenchError::CompileFailed {
                name: name.to_string(),
                status: status.to_string(),
            });
        }

        Ok(ExecutableGuard::new(dir.join(exe_name)))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new("gcc")
    }
}

/// Owns a compiled executable on disk; removes the file on drop.
#[derive(Debug)]
pub struct ExecutableGuard {
    path: PathBuf,
}

impl ExecutableGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the executable once with its own directory as working directory and
    /// output discarded. Returns the elapsed wall-clock time.
    pub fn run_timed(&self, name: &str) -> Result<Duration, BenchError> {
        // A relative program path is resolved against the child's working
        // directory on some platforms, so always spawn by absolute path.
        let program = std::fs::canonicalize(&self.path).map_err(|e| BenchError::RunFailed {
            name: name.to_string(),
            detail: e.to_string(),
        })?;
        let mut cmd = Command::new(&program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = program.parent() {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let status = cmd.status();
        let elapsed = start.elapsed();

        match status {
            Ok(s) if s.success() => Ok(elapsed),
            Ok(s) => Err(BenchError::RunFailed {
                name: name.to_string(),
                detail: s.to_string(),
            }),
            Err(e) => Err(BenchError::RunFailed {
                name: name.to_string(),
                detail: e.to_string(),
            }),
        }
    }
}

impl Drop for ExecutableGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed executable"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "could not remove executable"),
        }
    }
}

/// Test support: a POSIX shell script that stands in for a C compiler.
///
/// It writes a shell-script "executable" to the `-o` target. A source
/// containing `BROKEN` fails compilation; one containing `CRASH` produces an
/// executable that exits with status 3.
#[cfg(all(test, unix))]
pub(crate) mod fake {
    use super::Compiler;
    use std::path::Path;

    pub const SCRIPT: &str = include_str!("../tests/fixtures/fakecc.sh");

    /// Write the script into `dir` and return a compiler that runs it via `sh`.
    pub fn compiler(dir: &Path) -> Compiler {
        let script = dir.join("fakecc.sh");
        std::fs::write(&script, SCRIPT).unwrap();
        Compiler::new("sh").leading_args([script.to_string_lossy().into_owned()])
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn sources(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compiles_runs_and_removes_executable() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let work = tmp.path().join("bsort");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("bsort.c"), "int main(){return 0;}").unwrap();

        let cc = fake::compiler(tmp.path()).flags(SUITE_FLAGS.iter().copied());
        let guard = cc.compile("bsort", &work, &sources(&["bsort.c"]), "bench_exe").unwrap();
        let exe = guard.path().to_path_buf();
        assert!(exe.exists());

        let elapsed = guard.run_timed("bsort").unwrap();
        assert!(elapsed > Duration::ZERO);

        drop(guard);
        assert!(!exe.exists());
    }

    #[test]
    fn compile_failure_reports_benchmark_name() {
        let tmp = assert_fs::TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.c"), "BROKEN").unwrap();

        let cc = fake::compiler(tmp.path());
        let err = cc
            .compile("bad", tmp.path(), &sources(&["bad.c"]), "bench_exe")
            .unwrap_err();
        assert!(matches!(err, BenchError::CompileFailed { ref name, .. } if name == "bad"));
        assert!(!tmp.path().join("bench_exe").exists());
    }

    #[test]
    fn failed_compile_keeps_existing_file() {
        let tmp = assert_fs::TempDir::new().unwrap();
        fs::write(tmp.path().join("test"), "user data").unwrap();
        fs::write(tmp.path().join("bad.c"), "BROKEN").unwrap();

        let cc = fake::compiler(tmp.path());
        let err = cc
            .compile("bad", tmp.path(), &sources(&["bad.c"]), "test")
            .unwrap_err();
        assert!(matches!(err, BenchError::CompileFailed { .. }));
        assert_eq!(fs::read_to_string(tmp.path().join("test")).unwrap(), "user data");
    }

    #[test]
    fn executable_removed_even_when_run_fails() {
        let tmp = assert_fs::TempDir::new().unwrap();
        fs::write(tmp.path().join("crash.c"), "CRASH").unwrap();

        let cc = fake::compiler(tmp.path());
        let guard = cc
            .compile("crash", tmp.path(), &sources(&["crash.c"]), "bench_exe")
            .unwrap();
        let exe = guard.path().to_path_buf();

        let err = guard.run_timed("crash").unwrap_err();
        assert!(matches!(err, BenchError::RunFailed { .. }));
        assert!(err.to_string().contains("crash"));

        drop(guard);
        assert!(!exe.exists());
    }

    #[test]
    fn missing_compiler_is_reported() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let cc = Compiler::new("definitely-not-a-compiler-3f9a");
        let err = cc
            .compile("x", tmp.path(), &sources(&["x.c"]), "bench_exe")
            .unwrap_err();
        assert!(matches!(err, BenchError::CompilerUnavailable { .. }));
    }

    #[test]
    fn guard_tolerates_already_removed_file() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("gone");
        fs::write(&path, "").unwrap();
        let guard = ExecutableGuard::new(path.clone());
        fs::remove_file(&path).unwrap();
        drop(guard);
        assert!(!path.exists());
    }
}
