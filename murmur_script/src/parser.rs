//! Recursive-descent parser for murmur scripts.
//!
//! A cursor walks the raw text, skipping blank characters between nodes and
//! dispatching on the marker found at the current position. Each node parser
//! takes the text starting at its marker and returns the parsed value along
//! with the number of bytes it consumed, so the cursor can step past it.
//!
//! # Markers
//! - `//` comment to end of line
//! - `::` section header; the section body runs until the next `::`
//! - `[[target]]`, `[[label|target]]`, `[[delay 5s|target]]` jumps
//! - `<<set $key = a + b>>`
//! - `<<choice>> [[one]] | [[two]] >>`
//! - `<<if C>> .. <<elseif C>> .. <<else>> .. <<endif>>`
//! - any other `<<...>>` is kept as an unhandled command
//!
//! Anything else is narrative text running to the end of the line or to the
//! next `[[` / `<<`.

use std::time::Duration;

use crate::ast::{Branch, Choice, CompareOp, Guard, IfChain, Jump, Node, Script, Section, SetVar};

pub const COMMENT: &str = "//";
pub const SECTION: &str = "::";
pub const JUMP_OPEN: &str = "[[";
pub const JUMP_CLOSE: &str = "]]";
pub const JUMP_DELAY: &str = "delay";
pub const CMD_OPEN: &str = "<<";
pub const CMD_CLOSE: &str = ">>";
pub const SET: &str = "<<set";
pub const CHOICE: &str = "<<choice";
pub const IF: &str = "<<if";
pub const ELSEIF: &str = "<<elseif";
pub const ELSE: &str = "<<else";
pub const ENDIF: &str = "<<endif";

const BLANK: [char; 4] = [' ', '\t', '\r', '\n'];

/// A failure to parse a script, located by line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line of the marker that failed to parse.
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// What went wrong while parsing a single node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("missing `]]` to close jump")]
    UnterminatedJump,
    #[error("invalid jump format: {0}")]
    InvalidJump(String),
    #[error("invalid jump delay format: {0}")]
    InvalidDelay(String),
    #[error("missing `>>` to close command")]
    UnterminatedCommand,
    #[error("invalid set format: {0}")]
    InvalidSet(String),
    #[error("invalid condition format: {0}")]
    InvalidCondition(String),
    #[error("missing `<<endif>>` for if block")]
    UnterminatedIf,
    #[error("if blocks cannot be nested")]
    NestedIf,
    #[error("`{0}>>` outside of an if block")]
    StrayBranch(&'static str),
}

/// Parse a complete script.
///
/// # Errors
/// Returns the first malformed marker found; no partial tree is produced.
pub fn parse_script(src: &str) -> Result<Script, ParseError> {
    let mut cursor = Cursor { src, pos: 0 };
    let nodes = cursor.parse_block(Scope::Root)?;
    Ok(Script { nodes })
}

/// Count raw section markers in the source text.
///
/// Used to cross-check the parsed section index: every `::` in the text must
/// have produced a section.
pub fn count_section_markers(src: &str) -> usize {
    src.matches(SECTION).count()
}

/// Where a block of nodes lives, which decides what ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Root,
    Section,
    Branch,
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: line_at(self.src, self.pos),
            kind,
        }
    }

    fn skip_blank(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start_matches(BLANK).len();
    }

    /// Run a node parser at the cursor and step past whatever it consumed.
    fn take<T>(&mut self, parse: impl FnOnce(&'a str) -> Result<(T, usize), ParseErrorKind>) -> Result<T, ParseError> {
        let (value, used) = parse(self.rest()).map_err(|kind| self.error(kind))?;
        self.pos += used;
        Ok(value)
    }

    /// Collect nodes until input runs out or a marker ends the current scope.
    fn parse_block(&mut self, scope: Scope) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_blank();
            let rest = self.rest();
            if rest.is_empty() {
                return Ok(nodes);
            }

            let node = if rest.starts_with(COMMENT) {
                Node::Comment(self.take(parse_comment)?)
            } else if rest.starts_with(SECTION) {
                match scope {
                    Scope::Root => Node::Section(self.parse_section()?),
                    Scope::Section => return Ok(nodes),
                    Scope::Branch => return Err(self.error(ParseErrorKind::UnterminatedIf)),
                }
            } else if rest.starts_with(JUMP_OPEN) {
                Node::Jump(self.take(parse_jump)?)
            } else if rest.starts_with(CMD_OPEN) {
                if rest.starts_with(SET) {
                    Node::Set(self.take(parse_set)?)
                } else if rest.starts_with(CHOICE) {
                    Node::Choice(self.take(parse_choice)?)
                } else if let Some(marker) = branch_marker(rest) {
                    if scope == Scope::Branch {
                        return Ok(nodes);
                    }
                    return Err(self.error(ParseErrorKind::StrayBranch(marker)));
                } else if rest.starts_with(IF) {
                    if scope == Scope::Branch {
                        return Err(self.error(ParseErrorKind::NestedIf));
                    }
                    Node::If(self.parse_if()?)
                } else {
                    Node::Unhandled(self.take(parse_unhandled)?)
                }
            } else {
                Node::Text(self.take(parse_text)?)
            };
            nodes.push(node);
        }
    }

    fn parse_section(&mut self) -> Result<Section, ParseError> {
        let header = line_remain(&self.rest()[SECTION.len()..]);
        let name = header.trim().to_string();
        self.pos += SECTION.len() + header.len();
        let body = self.parse_block(Scope::Section)?;
        Ok(Section { name, body })
    }

    fn parse_if(&mut self) -> Result<IfChain, ParseError> {
        let start = self.pos;
        let mut chain = IfChain::default();
        let mut marker = IF;
        loop {
            let guard = self.take(|text| parse_guard(text, marker))?;
            let body = self.parse_block(Scope::Branch)?;
            chain.branches.push(Branch { guard, body });

            let rest = self.rest();
            if rest.starts_with(ELSEIF) {
                marker = ELSEIF;
            } else if rest.starts_with(ELSE) {
                marker = ELSE;
            } else if rest.starts_with(ENDIF) {
                self.take(parse_endif)?;
                return Ok(chain);
            } else {
                return Err(ParseError {
                    line: line_at(self.src, start),
                    kind: ParseErrorKind::UnterminatedIf,
                });
            }
        }
    }
}

/// Which if-chain continuation marker, if any, starts `text`.
fn branch_marker(text: &str) -> Option<&'static str> {
    // `<<else` is a prefix of `<<elseif`, so the longer marker goes first.
    [ELSEIF, ELSE, ENDIF].into_iter().find(|marker| text.starts_with(marker))
}

fn line_at(src: &str, pos: usize) -> usize {
    src[..pos].matches('\n').count() + 1
}

/// The rest of the current line, stopping early at a jump or command marker.
fn line_remain(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|&(idx, ch)| ch == '\n' || text[idx..].starts_with(JUMP_OPEN) || text[idx..].starts_with(CMD_OPEN))
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}

fn parse_text(text: &str) -> Result<(String, usize), ParseErrorKind> {
    let line = line_remain(text);
    Ok((line.trim_end().to_string(), line.len()))
}

fn parse_comment(text: &str) -> Result<(String, usize), ParseErrorKind> {
    let line = line_remain(&text[COMMENT.len()..]);
    Ok((line.trim().to_string(), COMMENT.len() + line.len()))
}

/// Parse a `[[...]]` jump starting at `text`.
///
/// # Errors
/// Fails on a missing `]]`, an empty target, more than one `|`, or a
/// malformed `delay` prefix.
pub fn parse_jump(text: &str) -> Result<(Jump, usize), ParseErrorKind> {
    let end = text.find(JUMP_CLOSE).ok_or(ParseErrorKind::UnterminatedJump)?;
    let inner = &text[JUMP_OPEN.len()..end];

    let parts: Vec<&str> = inner.split('|').collect();
    let (head, target) = match parts.as_slice() {
        [target] => (None, target.trim()),
        [head, target] => (Some(head.trim()), target.trim()),
        _ => return Err(ParseErrorKind::InvalidJump(inner.to_string())),
    };
    if target.is_empty() {
        return Err(ParseErrorKind::InvalidJump(inner.to_string()));
    }

    let mut jump = Jump::to(target);
    match head {
        Some(head) if head.split_whitespace().next() == Some(JUMP_DELAY) => {
            jump.delay = Some(parse_delay(head)?);
        },
        Some(head) if !head.is_empty() => jump.label = Some(head.to_string()),
        _ => {},
    }
    Ok((jump, end + JUMP_CLOSE.len()))
}

/// Parse `delay <N>(s|m|h)`.
fn parse_delay(spec: &str) -> Result<Duration, ParseErrorKind> {
    let invalid = || ParseErrorKind::InvalidDelay(spec.to_string());

    let tokens: Vec<&str> = spec.split_whitespace().collect();
    let [_, amount] = tokens.as_slice() else {
        return Err(invalid());
    };

    let (number, unit_secs) = if let Some(n) = amount.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = amount.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = amount.strip_suffix('h') {
        (n, 60 * 60)
    } else {
        return Err(invalid());
    };

    let value: u64 = number.parse().map_err(|_| invalid())?;
    let secs = value.checked_mul(unit_secs).ok_or_else(invalid)?;
    Ok(Duration::from_secs(secs))
}

/// Parse a `<<set $key = a op b ...>>` command starting at `text`.
///
/// # Errors
/// Fails on a missing `>>` or `=`, a key without `$`, or a value list that
/// is not `operand (operator operand)*`.
pub fn parse_set(text: &str) -> Result<(SetVar, usize), ParseErrorKind> {
    let end = text.find(CMD_CLOSE).ok_or(ParseErrorKind::UnterminatedCommand)?;
    let expr = text[SET.len()..end].trim();
    let invalid = || ParseErrorKind::InvalidSet(expr.to_string());

    let parts: Vec<&str> = expr.split('=').collect();
    let [key, value] = parts.as_slice() else {
        return Err(invalid());
    };

    let key = key.trim().strip_prefix('$').ok_or_else(invalid)?;
    if key.is_empty() {
        return Err(invalid());
    }

    let value: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if value.len() % 2 != 1 {
        return Err(invalid());
    }

    Ok((
        SetVar {
            key: key.to_string(),
            value,
        },
        end + CMD_CLOSE.len(),
    ))
}

/// Parse a `<<choice>> [[a]] | [[b]] >>` menu starting at `text`.
///
/// The menu ends at its closing `>>`, or at the first thing that is neither
/// an option nor a separator. Options continue onto the next line only after
/// the header or a trailing `|`; otherwise a line break ends the menu, and a
/// closing `>>` alone on the following line is consumed with it.
///
/// # Errors
/// Fails if any option is a malformed jump.
pub fn parse_choice(text: &str) -> Result<(Choice, usize), ParseErrorKind> {
    let mut pos = CHOICE.len();

    let header = &text[pos..];
    let trimmed = header.trim_start_matches([' ', '\t']);
    if trimmed.starts_with(CMD_CLOSE) {
        pos += header.len() - trimmed.len() + CMD_CLOSE.len();
    }

    let mut choice = Choice::default();
    let mut continued = true;
    loop {
        let rest = &text[pos..];
        let trimmed = rest.trim_start_matches([' ', '\t', '\r']);
        pos += rest.len() - trimmed.len();

        if let Some(after) = trimmed.strip_prefix('|') {
            continued = true;
            pos += trimmed.len() - after.len();
        } else if trimmed.starts_with('\n') {
            let next = trimmed.trim_start_matches(BLANK);
            if continued {
                pos += trimmed.len() - next.len();
            } else {
                if next.starts_with(CMD_CLOSE) {
                    pos += trimmed.len() - next.len() + CMD_CLOSE.len();
                }
                return Ok((choice, pos));
            }
        } else if trimmed.starts_with(JUMP_OPEN) {
            let (jump, used) = parse_jump(trimmed)?;
            choice.options.push(jump);
            continued = false;
            pos += used;
        } else {
            if trimmed.starts_with(CMD_CLOSE) {
                pos += CMD_CLOSE.len();
            }
            return Ok((choice, pos));
        }
    }
}

/// Parse the header of an if-chain arm: `<<if C>>`, `<<elseif C>>` or `<<else>>`.
///
/// An empty condition yields `None`, which always matches.
fn parse_guard(text: &str, marker: &str) -> Result<(Option<Guard>, usize), ParseErrorKind> {
    let end = text.find(CMD_CLOSE).ok_or(ParseErrorKind::UnterminatedCommand)?;
    let expr = text[marker.len()..end].trim();
    let used = end + CMD_CLOSE.len();
    if expr.is_empty() {
        return Ok((None, used));
    }

    let invalid = || ParseErrorKind::InvalidCondition(expr.to_string());
    let tokens: Vec<&str> = expr.split_whitespace().collect();
    let [left, op, right @ ..] = tokens.as_slice() else {
        return Err(invalid());
    };
    if right.is_empty() {
        return Err(invalid());
    }
    let op = CompareOp::from_keyword(op).ok_or_else(invalid)?;

    let guard = Guard {
        left: (*left).to_string(),
        op,
        right: right.iter().map(|tok| (*tok).to_string()).collect(),
    };
    Ok((Some(guard), used))
}

fn parse_endif(text: &str) -> Result<((), usize), ParseErrorKind> {
    let end = text.find(CMD_CLOSE).ok_or(ParseErrorKind::UnterminatedIf)?;
    Ok(((), end + CMD_CLOSE.len()))
}

fn parse_unhandled(text: &str) -> Result<(String, usize), ParseErrorKind> {
    let end = text.find(CMD_CLOSE).ok_or(ParseErrorKind::UnterminatedCommand)?;
    Ok((text[CMD_OPEN.len()..end].trim().to_string(), end + CMD_CLOSE.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section<'a>(script: &'a Script, name: &str) -> &'a Section {
        script
            .sections()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("section {name} missing"))
    }

    #[test]
    fn sections_end_at_next_marker() {
        let src = ":: Start\nHello there.\n[[Next]]\n:: Next\nBye.\n";
        let script = parse_script(src).unwrap();
        assert_eq!(script.sections().count(), 2);
        assert_eq!(count_section_markers(src), 2);

        let start = section(&script, "Start");
        assert_eq!(
            start.body,
            vec![Node::Text("Hello there.".into()), Node::Jump(Jump::to("Next"))]
        );
        assert_eq!(section(&script, "Next").body, vec![Node::Text("Bye.".into())]);
    }

    #[test]
    fn text_stops_at_inline_markers() {
        let script = parse_script(":: A\nRun! [[B]] now\n:: B\n").unwrap();
        assert_eq!(
            section(&script, "A").body,
            vec![
                Node::Text("Run!".into()),
                Node::Jump(Jump::to("B")),
                Node::Text("now".into()),
            ]
        );
    }

    #[test]
    fn comments_are_kept_in_tree() {
        let script = parse_script(":: A\n// note to self\nLine\n").unwrap();
        assert_eq!(
            section(&script, "A").body,
            vec![Node::Comment("note to self".into()), Node::Text("Line".into())]
        );
    }

    #[test]
    fn content_before_first_section_stays_at_root() {
        let script = parse_script("Preamble\n:: A\nBody\n").unwrap();
        assert_eq!(script.nodes[0], Node::Text("Preamble".into()));
        assert_eq!(script.sections().count(), 1);
    }

    #[test]
    fn jump_forms() {
        let (jump, used) = parse_jump("[[Cave]] rest").unwrap();
        assert_eq!(jump, Jump::to("Cave"));
        assert_eq!(used, "[[Cave]]".len());

        let (jump, _) = parse_jump("[[Enter the cave|Cave]]").unwrap();
        assert_eq!(jump.label.as_deref(), Some("Enter the cave"));
        assert_eq!(jump.target, "Cave");
        assert!(jump.delay.is_none());

        let (jump, _) = parse_jump("[[delay 5s|Cave]]").unwrap();
        assert_eq!(jump.delay, Some(Duration::from_secs(5)));
        assert!(jump.label.is_none());

        let (jump, _) = parse_jump("[[delay 2m|Cave]]").unwrap();
        assert_eq!(jump.delay, Some(Duration::from_secs(120)));

        let (jump, _) = parse_jump("[[delay 1h|Cave]]").unwrap();
        assert_eq!(jump.delay, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn jump_failures() {
        assert_eq!(parse_jump("[[Cave"), Err(ParseErrorKind::UnterminatedJump));
        assert!(matches!(parse_jump("[[delay xs|Cave]]"), Err(ParseErrorKind::InvalidDelay(_))));
        assert!(matches!(parse_jump("[[delay 5d|Cave]]"), Err(ParseErrorKind::InvalidDelay(_))));
        assert!(matches!(parse_jump("[[delay|Cave]]"), Err(ParseErrorKind::InvalidDelay(_))));
        assert!(matches!(parse_jump("[[]]"), Err(ParseErrorKind::InvalidJump(_))));
        assert!(matches!(parse_jump("[[a|b|c]]"), Err(ParseErrorKind::InvalidJump(_))));
    }

    #[test]
    fn label_starting_with_delay_word_is_a_label() {
        let (jump, _) = parse_jump("[[delayed train|Station]]").unwrap();
        assert_eq!(jump.label.as_deref(), Some("delayed train"));
        assert!(jump.delay.is_none());
    }

    #[test]
    fn set_command() {
        let (set, used) = parse_set("<<set $score = $score + 1>>\n").unwrap();
        assert_eq!(set.key, "score");
        assert_eq!(set.value, vec!["$score", "+", "1"]);
        assert_eq!(used, "<<set $score = $score + 1>>".len());

        let (set, _) = parse_set("<<set $name = bob>>").unwrap();
        assert_eq!(set.value, vec!["bob"]);
    }

    #[test]
    fn set_failures() {
        assert_eq!(parse_set("<<set $a = 1"), Err(ParseErrorKind::UnterminatedCommand));
        assert!(matches!(parse_set("<<set $a 1>>"), Err(ParseErrorKind::InvalidSet(_))));
        assert!(matches!(parse_set("<<set a = 1>>"), Err(ParseErrorKind::InvalidSet(_))));
        assert!(matches!(parse_set("<<set $a = 1 +>>"), Err(ParseErrorKind::InvalidSet(_))));
        assert!(matches!(parse_set("<<set $a = >>"), Err(ParseErrorKind::InvalidSet(_))));
        assert!(matches!(parse_set("<<set $ = 1>>"), Err(ParseErrorKind::InvalidSet(_))));
    }

    #[test]
    fn choice_options_in_order() {
        let src = "<<choice>> [[Left|West]] | [[Right|East]] >>\nAfter";
        let (choice, used) = parse_choice(src).unwrap();
        assert_eq!(choice.options.len(), 2);
        assert_eq!(choice.options[0].target, "West");
        assert_eq!(choice.options[1].display_label(), "Right");
        assert_eq!(&src[used..], "\nAfter");
    }

    #[test]
    fn choice_options_may_span_lines() {
        let src = ":: A\n<<choice>>\n  [[one]] |\n  [[two]]\n>>\nAfter\n";
        let script = parse_script(src).unwrap();
        let body = &section(&script, "A").body;
        let Node::Choice(choice) = &body[0] else {
            panic!("expected choice, got {:?}", body[0]);
        };
        assert_eq!(choice.options.len(), 2);
        assert_eq!(body[1], Node::Text("After".into()));
    }

    #[test]
    fn unclosed_choice_ends_at_line_break() {
        let src = ":: A\n<<choice>> [[one]] | [[two]]\n[[Elsewhere]]\n";
        let script = parse_script(src).unwrap();
        let body = &section(&script, "A").body;
        let Node::Choice(choice) = &body[0] else {
            panic!("expected choice, got {:?}", body[0]);
        };
        let targets: Vec<&str> = choice.options.iter().map(|o| o.target.as_str()).collect();
        assert_eq!(targets, ["one", "two"]);
        assert_eq!(body[1], Node::Jump(Jump::to("Elsewhere")));
    }

    #[test]
    fn trailing_separator_continues_the_menu() {
        let src = "<<choice>> [[one]] |\n[[two]] >>\nAfter";
        let (choice, used) = parse_choice(src).unwrap();
        assert_eq!(choice.options.len(), 2);
        assert_eq!(&src[used..], "\nAfter");

        let src = "<<choice>> [[one]]\n>>\nAfter";
        let (choice, used) = parse_choice(src).unwrap();
        assert_eq!(choice.options.len(), 1);
        assert_eq!(&src[used..], "\nAfter");
    }

    #[test]
    fn if_chain_with_all_arms() {
        let src = ":: A\n<<if $x gte 10>>big<<elseif $x gte 5>>medium<<else>>small<<endif>>\nafter\n";
        let script = parse_script(src).unwrap();
        let body = &section(&script, "A").body;
        let Node::If(chain) = &body[0] else {
            panic!("expected if, got {:?}", body[0]);
        };
        assert_eq!(chain.branches.len(), 3);

        let guard = chain.branches[0].guard.as_ref().unwrap();
        assert_eq!(guard.left, "$x");
        assert_eq!(guard.op, CompareOp::Gte);
        assert_eq!(guard.right, vec!["10"]);
        assert_eq!(chain.branches[1].body, vec![Node::Text("medium".into())]);
        assert!(chain.branches[2].guard.is_none());
        assert_eq!(body[1], Node::Text("after".into()));
    }

    #[test]
    fn if_branch_may_end_with_choice() {
        let src = ":: A\n<<if $key is yes>>\nA door.\n<<choice>> [[Open|B]] | [[Leave|C]] >>\n<<endif>>\n";
        let script = parse_script(src).unwrap();
        let Node::If(chain) = &section(&script, "A").body[0] else {
            panic!("expected if");
        };
        assert!(matches!(chain.branches[0].body.last(), Some(Node::Choice(_))));
    }

    #[test]
    fn if_failures() {
        let err = parse_script(":: A\n<<if $x is 1>>\nyes\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedIf);
        assert_eq!(err.line, 2);

        let err = parse_script(":: A\n<<if $x is 1>>yes\n:: B\n<<endif>>").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedIf);

        let err = parse_script(":: A\n<<if $x>>yes<<endif>>").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidCondition(_)));

        let err = parse_script(":: A\n<<if $x lt 1>>yes<<endif>>").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidCondition(_)));

        let err = parse_script(":: A\n<<if $x is 1>><<if $y is 2>>no<<endif>><<endif>>").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestedIf);

        let err = parse_script(":: A\nText\n<<endif>>").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::StrayBranch(ENDIF));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn unknown_commands_are_retained() {
        let script = parse_script(":: A\n<<music calm>>\n").unwrap();
        assert_eq!(section(&script, "A").body, vec![Node::Unhandled("music calm".into())]);

        let err = parse_script(":: A\n<<music calm\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedCommand);
    }

    #[test]
    fn errors_report_line_numbers() {
        let err = parse_script(":: A\nfine\nalso fine\n[[broken\n").unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.to_string(), "line 4: missing `]]` to close jump");
    }

    #[test]
    fn section_name_is_trimmed_and_stops_at_markers() {
        let script = parse_script("::   Start   \nHi\n").unwrap();
        assert_eq!(script.sections().next().unwrap().name, "Start");
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        let script = parse_script(":: Départ\nÇa va? ✨ [[Fin]]\n:: Fin\n").unwrap();
        assert_eq!(
            section(&script, "Départ").body,
            vec![Node::Text("Ça va? ✨".into()), Node::Jump(Jump::to("Fin"))]
        );
    }
}
