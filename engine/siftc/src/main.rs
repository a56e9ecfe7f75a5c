//! Sandboxed expression calculator.
//!
//! `sift 'expr'` evaluates once; `sift` with no expression enters the
//! interactive loop. `--vars <file.json>` and repeated `--var name=value`
//! supply the namespace.

use sift_eval::{CapabilityRegistry, Namespace};
use siftc::{eval_and_print, init_tracing, parse_var_flag, parse_vars_json, repl};
use std::sync::Arc;

fn print_usage() {
    eprintln!("Usage: sift [options] [expression]");
    eprintln!();
    eprintln!("Evaluates the expression, or starts an interactive loop when");
    eprintln!("no expression is given (empty line exits).");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --vars <file.json>   Flat JSON object of variables");
    eprintln!("  --var name=value     One variable (JSON value, or raw string)");
    eprintln!("  -h, --help           Show this help");
}

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    let mut namespace = Namespace::default();
    let mut expression: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--vars" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("error: --vars needs a file path");
                    std::process::exit(1);
                };
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(err) => {
                        eprintln!("error: cannot read {path}: {err}");
                        std::process::exit(1);
                    }
                };
                match parse_vars_json(&text) {
                    Ok(vars) => namespace.extend(vars),
                    Err(err) => {
                        eprintln!("error: {path}: {err}");
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            "--var" => {
                let Some(flag) = args.get(i + 1) else {
                    eprintln!("error: --var needs name=value");
                    std::process::exit(1);
                };
                match parse_var_flag(flag) {
                    Ok((name, value)) => {
                        namespace.insert(name, value);
                    }
                    Err(err) => {
                        eprintln!("error: {err}");
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                eprintln!("error: unknown option '{arg}'");
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if expression.is_some() {
                    eprintln!("error: more than one expression given");
                    std::process::exit(1);
                }
                expression = Some(args[i].clone());
                i += 1;
            }
        }
    }

    let registry = Arc::new(CapabilityRegistry::with_defaults());
    match expression {
        Some(text) => eval_and_print(&registry, &text, &namespace),
        None => {
            if let Err(err) = repl(&registry, &namespace) {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }
}
