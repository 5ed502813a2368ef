use std::{
    error::Error,
    fs, io,
    path::Path,
    process::{Command, Output},
    str,
};

const BETSY_PATH: &str = "./target/debug/betsy";

pub struct Expected<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
}

impl<'a> Expected<'a> {
    fn assert_matches(self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout);
        assert_eq!(str::from_utf8(&output.stderr)?, self.stderr);
        Ok(())
    }
}

fn run_simulator(src_path: &Path) -> Result<Output, io::Error> {
    Command::new(BETSY_PATH).arg("sim").arg(src_path).output()
}

/// Simulate a program and assert it succeeds with the expected output.
pub fn check_simulation(src_path: &Path, expected: Expected) -> Result<(), Box<dyn Error>> {
    let output = run_simulator(src_path)?;

    expected.assert_matches(&output)?;
    assert!(
        output.status.success(),
        "betsy sim exited with status {:?}",
        output.status.code()
    );

    Ok(())
}

/// Simulate a program and assert it exits non-zero with a diagnostic
/// containing each of the expected fragments.
pub fn check_diagnostics(src_path: &Path, expected: &[&str]) -> Result<(), Box<dyn Error>> {
    let output = run_simulator(src_path)?;
    let stderr = str::from_utf8(&output.stderr)?;

    assert!(
        !output.status.success(),
        "betsy sim should exit with a non-zero status"
    );
    for fragment in expected {
        assert!(
            stderr.contains(fragment),
            "missing '{fragment}' in diagnostics; stderr was:\n{stderr}"
        );
    }

    Ok(())
}

/// Run the compiler on a program inside a scratch directory, so its
/// `out.c` never lands in the repository. The caller removes the
/// returned scratch directory.
fn run_compiler(src_path: &Path) -> Result<(Output, std::path::PathBuf), Box<dyn Error>> {
    let betsy = fs::canonicalize(BETSY_PATH)?;
    let src_path = fs::canonicalize(src_path)?;

    let scratch = std::env::temp_dir().join(format!(
        "betsy-com-{}-{}",
        src_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("program"),
        std::process::id(),
    ));
    fs::create_dir_all(&scratch)?;

    let output = Command::new(betsy)
        .arg("com")
        .arg(&src_path)
        .current_dir(&scratch)
        .output()?;

    Ok((output, scratch))
}

/// Compile a program in a scratch directory and return the emitted C
/// source.
pub fn compile_to_string(src_path: &Path) -> Result<String, Box<dyn Error>> {
    let (output, scratch) = run_compiler(src_path)?;

    let stderr = str::from_utf8(&output.stderr)?;
    assert!(stderr.is_empty(), "{}", stderr);
    assert!(
        output.status.success(),
        "betsy com exited with status {:?}",
        output.status.code()
    );

    let emitted = fs::read_to_string(scratch.join("out.c"))?;
    fs::remove_dir_all(&scratch)?;

    Ok(emitted)
}

/// Compile a program and assert it exits non-zero with a diagnostic
/// containing each of the expected fragments.
pub fn check_compile_diagnostics(src_path: &Path, expected: &[&str]) -> Result<(), Box<dyn Error>> {
    let (output, scratch) = run_compiler(src_path)?;
    let stderr = str::from_utf8(&output.stderr)?;

    assert!(
        !output.status.success(),
        "betsy com should exit with a non-zero status"
    );
    for fragment in expected {
        assert!(
            stderr.contains(fragment),
            "missing '{fragment}' in diagnostics; stderr was:\n{stderr}"
        );
    }

    fs::remove_dir_all(&scratch)?;

    Ok(())
}
