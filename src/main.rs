use std::fs;

use clap::Parser;
use scriptum::{Config, Engine};

/// scriptum is an embeddable expression and script interpreter. This
/// binary evaluates an expression (the default) or runs a script file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Treat the input as a path to read instead of inline text.
    #[arg(short, long)]
    file: bool,

    /// Treat the input as an indented script rather than an expression.
    #[arg(short, long)]
    script: bool,

    contents: String,
}

fn main() {
    let args = Args::parse();

    let source = if args.file {
        fs::read_to_string(&args.contents).unwrap_or_else(|_| {
            eprintln!("Could not read '{}': the file may not exist or is unreadable.",
                      &args.contents);
            std::process::exit(1);
        })
    } else {
        args.contents
    };

    let mut engine = Engine::new(Config::default());

    if args.script || (args.file && source.contains('\n')) {
        if let Err(e) = engine.load_script(&source).and_then(|()| engine.run()) {
            eprintln!("{e}");
            std::process::exit(1);
        }
        return;
    }

    match engine.eval(&source) {
        Ok(value) => println!("{value}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}
