//! Prints the interfaces declared in a Go file with their method signatures.
//!
//! ```text
//! cargo run --example parse -- path/to/file.go
//! ```

use std::env;
use std::process::ExitCode;

use goimpl_parser::ast::{InterfaceElem, TypeExpr};
use goimpl_parser::parse_source;
use goimpl_parser::printer::{render_signature_with, render_type, Verbatim};

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: cargo run --example parse -- <file.go>");
        return ExitCode::from(2);
    };

    let src = match std::fs::read_to_string(&path) {
        Ok(src) => src,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let file = match parse_source(&src) {
        Ok(file) => file,
        Err(f) => {
            eprintln!("parse failed");
            for d in &f.diags {
                eprintln!("{:?} {:?}: {}", d.kind, d.span, d.message);
            }
            return ExitCode::FAILURE;
        }
    };

    println!("package {}", file.package.name);
    for (_, spec) in file.type_specs() {
        let TypeExpr::Interface(elems) = &spec.typ else {
            continue;
        };
        let params: Vec<&str> = spec.type_param_names().collect();
        if params.is_empty() {
            println!("\n{}", spec.name.name);
        } else {
            println!("\n{}[{}]", spec.name.name, params.join(", "));
        }
        for elem in elems {
            match elem {
                InterfaceElem::Method(m) => println!("  {}{}", m.name.name, render_signature_with(&m.sig, &Verbatim)),
                InterfaceElem::Embed(e) => println!("  embeds {}", render_type(&e.typ)),
            }
        }
    }
    ExitCode::SUCCESS
}
