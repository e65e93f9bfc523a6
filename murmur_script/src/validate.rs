use std::collections::HashSet;
use std::fmt;

use crate::ast::{Jump, Node, Script};

/// Authoring problem found in a parsed script.
///
/// None of these stop a story from loading; they point at content that will
/// misbehave or never be reached at play time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A later section reuses an earlier name and replaces it in the index.
    DuplicateSection { name: String },
    /// A jump or choice option names a section that does not exist.
    MissingTarget { section: String, target: String },
    /// A jump back into its own section. The section pointer does not move,
    /// so the turn stops there instead of replaying the section.
    SelfTarget { section: String },
    /// A choice with nothing to choose; every answer will be rejected.
    EmptyChoice { section: String },
    /// Content placed before the first section header.
    Unreachable { kind: &'static str },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DuplicateSection { name } => {
                write!(f, "duplicate section '{name}' (the last definition wins)")
            },
            ValidationIssue::MissingTarget { section, target } => {
                write!(f, "section '{section}' jumps to missing section '{target}'")
            },
            ValidationIssue::SelfTarget { section } => {
                write!(f, "section '{section}' jumps to itself and will stop instead of replaying")
            },
            ValidationIssue::EmptyChoice { section } => {
                write!(f, "section '{section}' has a choice with no options")
            },
            ValidationIssue::Unreachable { kind } => {
                write!(f, "{kind} before the first section can never be played")
            },
        }
    }
}

/// Check cross-references between sections.
///
/// ```
/// use murmur_script::{ValidationIssue, parse_script, validate_script};
///
/// let script = parse_script(":: Start\n[[Nowhere]]\n").unwrap();
/// assert_eq!(
///     validate_script(&script),
///     vec![ValidationIssue::MissingTarget {
///         section: "Start".into(),
///         target: "Nowhere".into(),
///     }]
/// );
/// ```
pub fn validate_script(script: &Script) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut names = HashSet::new();
    for section in script.sections() {
        if !names.insert(section.name.as_str()) {
            issues.push(ValidationIssue::DuplicateSection {
                name: section.name.clone(),
            });
        }
    }

    for node in &script.nodes {
        match node {
            Node::Section(section) => check_nodes(&section.name, &section.body, &names, &mut issues),
            Node::Comment(_) => {},
            other => issues.push(ValidationIssue::Unreachable { kind: other.kind() }),
        }
    }

    issues
}

fn check_nodes(section: &str, nodes: &[Node], names: &HashSet<&str>, issues: &mut Vec<ValidationIssue>) {
    for node in nodes {
        match node {
            Node::Jump(jump) => check_target(section, jump, names, issues),
            Node::Choice(choice) => {
                if choice.options.is_empty() {
                    issues.push(ValidationIssue::EmptyChoice {
                        section: section.to_string(),
                    });
                }
                for option in &choice.options {
                    check_target(section, option, names, issues);
                }
            },
            Node::If(chain) => {
                for branch in &chain.branches {
                    check_nodes(section, &branch.body, names, issues);
                }
            },
            _ => {},
        }
    }
}

fn check_target(section: &str, jump: &Jump, names: &HashSet<&str>, issues: &mut Vec<ValidationIssue>) {
    if jump.target == section {
        issues.push(ValidationIssue::SelfTarget {
            section: section.to_string(),
        });
    } else if !names.contains(jump.target.as_str()) {
        issues.push(ValidationIssue::MissingTarget {
            section: section.to_string(),
            target: jump.target.clone(),
        });
    }
}
