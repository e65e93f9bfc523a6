use std::time::Duration;

use murmur_script::{Node, ParseErrorKind, count_section_markers, parse_script, validate_script};

const DEMO: &str = include_str!("../../murmur_engine/data/demo.story");

#[test]
fn demo_story_parses_cleanly() {
    let script = parse_script(DEMO).expect("demo parses");
    let names: Vec<&str> = script.sections().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        ["Start", "Hurt", "Where", "Ridge", "Signal", "Again", "Valley", "Bottom", "Rescue"]
    );
    assert_eq!(count_section_markers(DEMO), names.len());
    assert!(validate_script(&script).is_empty(), "{:?}", validate_script(&script));
}

#[test]
fn demo_story_shapes() {
    let script = parse_script(DEMO).unwrap();
    let section = |name: &str| script.sections().find(|s| s.name == name).unwrap();

    let Some(Node::Choice(choice)) = section("Start").body.last() else {
        panic!("Start should end in a choice");
    };
    assert_eq!(choice.options.len(), 2);
    assert_eq!(choice.options[0].display_label(), "Are you hurt?");
    assert_eq!(choice.options[0].target, "Hurt");

    let Some(Node::If(chain)) = section("Signal").body.last() else {
        panic!("Signal should end in an if chain");
    };
    assert_eq!(chain.branches.len(), 3);
    assert!(chain.branches[2].guard.is_none());

    let Some(Node::Jump(jump)) = section("Valley").body.last() else {
        panic!("Valley should end in a jump");
    };
    assert_eq!(jump.target, "Bottom");
    assert_eq!(jump.delay, Some(Duration::from_secs(20 * 60)));

    assert!(section("Bottom").body.iter().any(|n| matches!(n, Node::Unhandled(cmd) if cmd == "camera pan")));
}

#[test]
fn errors_carry_line_numbers() {
    let err = parse_script(":: Start\nfine\n<<set score = 1>>\n").unwrap_err();
    assert_eq!(err.line, 3);
    assert!(matches!(err.kind, ParseErrorKind::InvalidSet(_)));

    let err = parse_script(":: Start\n<<if $a is 1>>\none\n:: Next\n").unwrap_err();
    assert_eq!(err.line, 4);
    assert!(matches!(err.kind, ParseErrorKind::UnterminatedIf));
}
