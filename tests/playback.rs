//! End-to-end tests — markup source → compiler → player → visible screen.

mod common;

use std::fs::File;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use common::MockTerminal;
use tempfile::NamedTempFile;
use textly::cancel::{cancel_pair, CancelToken};
use textly::dsl::decorator::{self, RESET};
use textly::dsl::{CompileError, CompileOptions, Compiler, OptimizeOptions, Program};
use textly::vm::{RunOptions, Runner};

/// Compile `source` from a real file and play it with no delays.
fn play_file(source: &str, options: CompileOptions) -> MockTerminal {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    let input = File::open(file.path()).unwrap();

    let token = CancelToken::never();
    let program = Compiler::new(options).compile(input, &token).unwrap();
    let mut terminal = MockTerminal::new();
    Runner::new(RunOptions::instant())
        .run(&program, &mut terminal, &token)
        .unwrap();
    terminal
}

fn flatten() -> CompileOptions {
    CompileOptions {
        optimize: Some(OptimizeOptions { flatten: true }),
    }
}

#[test]
fn visible_output_matches_for_every_mode() {
    let cases = [
        ("Hell[l]o", "Hello"),
        ("\\# Test", "# Test"),
        ("Hello \\\nWorld", "Hello World"),
        ("Typo[xx]s fixed{.}", "Typos fixed"),
        ("shown # hidden", "shown"),
    ];
    for (input, expected) in cases {
        for options in [CompileOptions::default(), flatten()] {
            let terminal = play_file(input, options);
            assert_eq!(terminal.screen(), expected, "input {input:?}, options {options:?}");
        }
    }
}

#[test]
fn flatten_never_emits_backspaces() {
    let terminal = play_file("Hell[l]o", flatten());
    assert_eq!(terminal.raw(), b"Hello");
}

#[test]
fn decorator_wraps_body_in_color() {
    let red = decorator::lookup("red").unwrap();
    for source in ["@red{test}", "@(red){test}", "@(red) {test}"] {
        let terminal = play_file(source, CompileOptions::default());
        assert_eq!(
            String::from_utf8(terminal.raw().to_vec()).unwrap(),
            format!("{red}test{RESET}"),
            "source {source:?}"
        );
    }
}

#[test]
fn nested_decorators_restore_outer_color() {
    let red = decorator::lookup("red").unwrap();
    let blue = decorator::lookup("blue").unwrap();
    let terminal = play_file("@red{a@blue{b}c}", CompileOptions::default());
    assert_eq!(
        String::from_utf8(terminal.raw().to_vec()).unwrap(),
        format!("{red}a{blue}b{red}c{RESET}")
    );
}

#[test]
fn unknown_decorator_is_reported_with_position() {
    let err = Compiler::default().compile_str("ok\n@orange{x}").unwrap_err();
    match &err {
        CompileError::UnknownDecorator { name, line, .. } => {
            assert_eq!(name, "orange");
            assert_eq!(*line, 1);
        }
        other => panic!("expected UnknownDecorator, got {other:?}"),
    }
    assert!(err.to_string().starts_with("[1:"));
}

#[test]
fn yaml_program_replays_identically() {
    let program = Compiler::default().compile_str("@green{go}[o]{.}!").unwrap();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(program.to_yaml().unwrap().as_bytes()).unwrap();

    let loaded = Program::from_yaml(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(loaded, program);

    let runner = Runner::new(RunOptions::instant());
    let (mut first, mut second) = (MockTerminal::new(), MockTerminal::new());
    runner.run(&program, &mut first, &CancelToken::never()).unwrap();
    runner.run(&loaded, &mut second, &CancelToken::never()).unwrap();
    assert_eq!(first.raw(), second.raw());
}

#[test]
fn cancel_stops_a_slow_playback() {
    let program = Compiler::default().compile_str("abcdefghij").unwrap();
    let (canceller, token) = cancel_pair();
    let handle = thread::spawn(move || {
        let mut terminal = MockTerminal::new();
        let options = RunOptions {
            delay: Duration::from_millis(200),
            ..RunOptions::instant()
        };
        let result = Runner::new(options).run(&program, &mut terminal, &token);
        (result, terminal)
    });

    thread::sleep(Duration::from_millis(50));
    let start = Instant::now();
    canceller.cancel();
    let (result, terminal) = handle.join().unwrap();
    assert!(result.unwrap_err().is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(terminal.screen(), "a");
}

#[test]
fn timeout_cancels_playback() {
    let program = Compiler::default().compile_str("{....}").unwrap();
    let token = CancelToken::never().with_timeout(Duration::from_millis(30));
    let options = RunOptions {
        beat: Duration::from_secs(5),
        ..RunOptions::instant()
    };
    let start = Instant::now();
    let err = Runner::new(options)
        .run(&program, &mut MockTerminal::new(), &token)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn list_mode_puts_words_on_lines() {
    let program = Compiler::default().compile_str("one two").unwrap();
    let mut out = Vec::new();
    let options = RunOptions {
        list: true,
        ..RunOptions::instant()
    };
    Runner::new(options)
        .run(&program, &mut out, &CancelToken::never())
        .unwrap();
    assert_eq!(out, b"one\ntwo");
}
