//! Engine-level tests driving the public API end to end.

use ymlint_core::lines::lines;
use ymlint_core::tokens::{RawToken, Scan, ScanError, TokenKind, Tokenizer};
use ymlint_core::{Level, Linter, RuleSettings};

fn settings(json: &str) -> RuleSettings {
    serde_json::from_str(json).unwrap()
}

fn summary(linter: &Linter, text: &str) -> Vec<(usize, usize, String, String)> {
    linter
        .lint(text)
        .map(|p| (p.line, p.column, p.rule, p.message))
        .collect()
}

// =============================================================================
// Line segmentation
// =============================================================================

#[test]
fn lines_round_trip_mixed_terminators() {
    for text in [
        "",
        "a",
        "a\n",
        "a\r\nb\rc\n",
        "\r\r\n\n",
        "x\n\ny\r\n\r\nz",
        "\n",
    ] {
        let rebuilt: String = lines(text)
            .map(|l| format!("{}{}", l.content(), l.terminator()))
            .collect();
        assert_eq!(rebuilt, text);

        let terminators = text.matches("\r\n").count()
            + text.replace("\r\n", "").matches(['\n', '\r']).count();
        let ends_terminated = text.ends_with('\n') || text.ends_with('\r');
        let expected = terminators + usize::from(!text.is_empty() && !ends_terminated);
        assert_eq!(lines(text).count(), expected, "{text:?}");
    }
}

// =============================================================================
// empty-lines
// =============================================================================

#[test]
fn documented_sample_with_max_one() {
    let linter = Linter::from_settings(&settings(r#"{"empty-lines": {"max": 1}}"#)).unwrap();
    let found = summary(&linter, "- foo:\n    - 1\n    - 2\n\n\n- bar: [3, 4]\n");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, 5);
    assert!(found[0].3.contains("too many blank lines (2 >= 1)"));
}

#[test]
fn documented_sample_with_leading_blank_line() {
    let linter = Linter::from_settings(&settings(r#"{"empty-lines": {"max-start": 0}}"#)).unwrap();
    let found = summary(&linter, "\nfoo: 1\n");
    assert_eq!(
        found,
        [(
            1,
            1,
            "empty-lines".to_string(),
            "too many blank lines (1 >= 0)".to_string()
        )]
    );
}

#[test]
fn runs_up_to_max_are_silent_and_one_more_reports_once() {
    for max in 0..4 {
        let linter =
            Linter::from_settings(&settings(&format!(r#"{{"empty-lines": {{"max": {max}}}}}"#)))
                .unwrap();
        for n in 0..=max {
            let text = format!("a: 1\n{}b: 2\n", "\n".repeat(n as usize));
            assert!(summary(&linter, &text).is_empty(), "max={max} n={n}");
        }
        let n = max as usize + 1;
        let text = format!("a: 1\n{}b: 2\n", "\n".repeat(n));
        let found = summary(&linter, &text);
        assert_eq!(found.len(), 1, "max={max}");
        assert_eq!(found[0].0, 1 + n);
    }
}

#[test]
fn boundary_limits_take_precedence_over_max() {
    let linter = Linter::from_settings(&settings(
        r#"{"empty-lines": {"max": 2, "max-start": 0, "max-end": 0}}"#,
    ))
    .unwrap();
    assert_eq!(summary(&linter, "\nfoo: 1\n").len(), 1);
    assert!(summary(&linter, "a: 1\n\nfoo: 1\n").is_empty());
    assert_eq!(summary(&linter, "foo: 1\n\n").len(), 1);
}

// =============================================================================
// Suppression
// =============================================================================

#[test]
fn disable_all_directive_removes_the_only_finding() {
    let linter = Linter::default();
    let raw = "a: 1\nb: 2 # note  \n";
    let suppressed = "a: 1\nb: 2 # ymlint disable-line  \n";
    assert_eq!(summary(&linter, raw).len(), 1);
    assert!(summary(&linter, suppressed).is_empty());
    assert_eq!(summary(&linter, raw).len(), 1);
}

#[test]
fn scoped_directive_leaves_other_rules_alone() {
    let linter = Linter::default();
    let text = "# ymlint disable rule:trailing-spaces\na: 1 \n\n\n\nb: 2\n";
    let found = summary(&linter, text);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].2, "empty-lines");
}

// =============================================================================
// Faults and parse errors
// =============================================================================

struct Broken;

impl Tokenizer for Broken {
    fn scan(&self, text: &str) -> Scan {
        let first = text.find(':').unwrap_or(0);
        Scan {
            tokens: vec![RawToken {
                kind: TokenKind::Scalar,
                start: 0,
                end: first,
            }],
            error: Some(ScanError {
                offset: first,
                message: "mapping values are not allowed here".to_string(),
            }),
        }
    }
}

#[test]
fn custom_tokenizer_parse_error_becomes_syntax_finding() {
    let linter = Linter::from_settings(&settings(r#"{"document-start": "enable"}"#))
        .unwrap()
        .with_tokenizer(Broken);
    let problems: Vec<_> = linter.lint("key: value \n").collect();
    let rules: Vec<_> = problems.iter().map(|p| p.rule.as_str()).collect();
    assert_eq!(rules, ["document-start", "syntax", "trailing-spaces"]);
    let syntax = &problems[1];
    assert_eq!((syntax.line, syntax.column), (1, 4));
    assert_eq!(
        syntax.message,
        "syntax error: mapping values are not allowed here"
    );
    assert_eq!(syntax.level, Level::Error);
}

#[test]
fn directive_after_parse_error_is_lost_but_explained() {
    let linter = Linter::default();
    let found = summary(&linter, "a: [1\n# ymlint disable\nb: 1 \n");
    let rules: Vec<_> = found.iter().map(|p| p.2.as_str()).collect();
    assert_eq!(rules, ["syntax", "trailing-spaces"]);
    assert_eq!((found[0].0, found[0].1), (1, 4));
}

struct Misaligned;

impl Tokenizer for Misaligned {
    fn scan(&self, _text: &str) -> Scan {
        Scan {
            tokens: Vec::new(),
            error: Some(ScanError {
                offset: 4,
                message: "unexpected character".to_string(),
            }),
        }
    }
}

#[test]
fn error_offset_inside_a_character_does_not_abort_the_lint() {
    let linter = Linter::default().with_tokenizer(Misaligned);
    let found = summary(&linter, "a: é \n# ymlint disable\n");
    assert_eq!(
        found,
        [
            (1, 4, "syntax".to_string(), "syntax error: unexpected character".to_string()),
            (1, 5, "trailing-spaces".to_string(), "trailing spaces".to_string()),
        ]
    );
}

#[test]
fn configuration_errors_surface_before_linting() {
    let err = Linter::from_settings(&settings(r#"{"empty-lines": {"max": true}}"#)).unwrap_err();
    assert!(err.to_string().contains("expected an integer"), "{err}");
}

#[test]
fn repeated_runs_are_identical() {
    let linter = Linter::from_settings(&settings(
        r#"{"document-start": {"present": false}, "empty-lines": {"max": 0}}"#,
    ))
    .unwrap();
    let text = "---\na: 1 \n\nb: [1, {c: 2}]\n---\n\n";
    let first = summary(&linter, text);
    assert_eq!(first, summary(&linter, text));
    assert!(first.iter().any(|p| p.2 == "document-start"));
}

#[test]
fn linting_in_parallel_matches_sequential() {
    let linter = Linter::default();
    let docs: Vec<String> = (0..8).map(|n| format!("a: {n} \n{}b: 1\n", "\n".repeat(n))).collect();
    let sequential: Vec<_> = docs.iter().map(|d| summary(&linter, d)).collect();
    let parallel: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = docs
            .iter()
            .map(|d| {
                let linter = &linter;
                scope.spawn(move || summary(linter, d))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(sequential, parallel);
}
