use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

struct Session {
    dir: tempfile::TempDir,
}

impl Session {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create session dir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn spawn(&self) -> Child {
        Command::new(env!("CARGO_BIN_EXE_vsh"))
            .current_dir(self.dir.path())
            .env("VSH_HISTFILE", self.path("history"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn vsh")
    }

    fn run(&self, input: &str) -> Output {
        let mut child = self.spawn();
        child
            .stdin
            .take()
            .expect("piped stdin")
            .write_all(input.as_bytes())
            .expect("write input");
        child.wait_with_output().expect("wait for vsh")
    }
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Lines of output with any prompt text in front of them removed.
fn without_prompts(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(|line| line.rsplit_once("]$ ").map_or(line, |(_, rest)| rest))
        .collect()
}

fn wait_for_file(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !path.exists() {
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn end_of_input_exits_with_zero() {
    let session = Session::new();
    let output = session.run("");
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("Exiting shell..."));
}

#[test]
fn exit_ignores_its_arguments() {
    let session = Session::new();
    let output = session.run("exit 7 now\necho after > after.txt\n");
    assert_eq!(output.status.code(), Some(0));
    assert!(!session.path("after.txt").exists());
    assert!(!stdout_of(&output).contains("Exiting shell..."));
}

#[test]
fn redirections_for_programs_and_builtins() {
    let session = Session::new();
    let output = session.run("echo hi > out.txt\nhelp >> out.txt\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(session.path("out.txt")).unwrap(),
        "hi\nAvailable commands:\n- cd\n- help\n- exit\n- history\n"
    );
    assert!(!stdout_of(&output).contains("Available commands"));
}

#[test]
fn unknown_program_is_reported() {
    let session = Session::new();
    let output = session.run("vsh-test-no-such-program --flag\n");
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("Invalid Command"));
    assert!(stderr_of(&output).contains("execvp: vsh-test-no-such-program"));
}

#[test]
fn malformed_redirection_skips_the_line() {
    let session = Session::new();
    let output = session.run("touch made.txt >\n");
    assert_eq!(output.status.code(), Some(0));
    assert!(!session.path("made.txt").exists());
    assert!(stderr_of(&output).contains("must be followed by a file name"));
}

#[test]
fn cd_affects_later_commands() {
    let session = Session::new();
    fs::create_dir(session.path("sub")).unwrap();
    let output = session.run("cd sub\npwd > where.txt\n");
    assert_eq!(output.status.code(), Some(0));
    let reported = fs::read_to_string(session.path("sub").join("where.txt")).unwrap();
    assert!(reported.trim_end().ends_with("/sub"), "pwd printed {reported:?}");
}

#[test]
fn failed_cd_keeps_going() {
    let session = Session::new();
    let output = session.run("cd /nonexistent/vsh\necho still here > ok.txt\n");
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr_of(&output).contains("cd: /nonexistent/vsh"));
    assert_eq!(fs::read_to_string(session.path("ok.txt")).unwrap(), "still here\n");
}

#[test]
fn history_is_listed_and_saved() {
    let session = Session::new();
    let output = session.run("echo one > /dev/null\n\nhistory\n");
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("1. echo one > /dev/null\n2. history\n"));

    let saved = fs::read_to_string(session.path("history")).unwrap();
    assert!(saved.contains("echo one > /dev/null"));

    // A new session starts from the saved history.
    let output = session.run("history\n");
    assert!(stdout_of(&output).contains("1. echo one > /dev/null\n"));
}

#[test]
fn interrupt_does_not_kill_the_shell() {
    let session = Session::new();
    let mut child = session.spawn();
    let mut stdin = child.stdin.take().expect("piped stdin");
    stdin
        .write_all(b"touch ready\nsleep 1\necho alive > alive.txt\n")
        .unwrap();
    drop(stdin);

    wait_for_file(&session.path("ready"));
    let pid = Pid::from_raw(i32::try_from(child.id()).unwrap());
    kill(pid, Signal::SIGINT).expect("send SIGINT");

    let output = child.wait_with_output().expect("wait for vsh");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(session.path("alive.txt")).unwrap(), "alive\n");

    // Nothing else writes to stdout, so once any prompts are dropped the
    // interrupt leaves exactly one blank line before the farewell.
    assert_eq!(
        without_prompts(&stdout_of(&output)),
        ["", "Exiting shell..."],
        "stdout was {:?}",
        stdout_of(&output)
    );
}

#[test]
fn consecutive_duplicates_are_listed_once() {
    let session = Session::new();
    let output = session.run("echo a > /dev/null
echo a > /dev/null
history
");
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    let listed = without_prompts(&stdout);
    assert_eq!(
        listed,
        ["1. echo a > /dev/null", "2. history", "Exiting shell..."]
    );
}
