//! CLI entry point for murmur_script.
//! Usage: cargo run -p murmur_script -- check stories/demo.story

use std::{env, fs, process};

use murmur_script::{Node, count_section_markers, parse_script, validate_script};

fn main() {
    let args: Vec<String> = env::args().collect();

    let rest: &[String] = match args.as_slice() {
        [_, flag, cmd, tail @ ..] if flag == "--" && cmd == "check" => tail,
        [_, cmd, tail @ ..] if cmd == "check" => tail,
        _ => {
            eprintln!("Usage:\n  murmur_script check <file.story> [--deny-warnings]");
            process::exit(2);
        },
    };
    run_check(rest);
}

fn run_check(args: &[String]) {
    let mut path: Option<&str> = None;
    let mut deny_warnings = false;
    for arg in args {
        match arg.as_str() {
            "--deny-warnings" => deny_warnings = true,
            other if path.is_none() => path = Some(other),
            other => {
                eprintln!("unexpected argument: {other}");
                process::exit(2);
            },
        }
    }
    let Some(path) = path else {
        eprintln!("Usage: murmur_script check <file.story> [--deny-warnings]");
        process::exit(2);
    };

    let src = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: unable to read '{path}': {e}");
        process::exit(1);
    });
    let script = parse_script(&src).unwrap_or_else(|e| {
        eprintln!("parse error: {path}: {e}");
        process::exit(1);
    });

    let markers = count_section_markers(&src);
    let sections: Vec<_> = script.sections().collect();
    for section in &sections {
        let choices = section.body.iter().filter(|n| matches!(n, Node::Choice(_))).count();
        println!("{:<24} {:>3} nodes, {} choice(s)", section.name, section.body.len(), choices);
    }
    println!("{} section(s), {} marker(s)", sections.len(), markers);
    if sections.len() != markers {
        eprintln!("error: {markers} section markers but only {} sections parsed", sections.len());
        process::exit(1);
    }

    let issues = validate_script(&script);
    for issue in &issues {
        eprintln!("warning: {issue}");
    }
    if deny_warnings && !issues.is_empty() {
        process::exit(1);
    }
}
