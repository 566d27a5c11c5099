use std::env;
use std::fs;
use std::io::{self, Read};

const VERSION: &str = "whisker 0.1.0";

fn print_usage() {
    eprintln!("usage: whisker [options] [script]");
    eprintln!("Available options are:");
    eprintln!("  -e stat   execute string 'stat'");
    eprintln!("  -v        show version information");
    eprintln!("  -         read the script from stdin");
}

#[derive(Default)]
struct Options {
    execute_strings: Vec<String>,
    script_file: Option<String>,
    show_version: bool,
    read_stdin: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();
    let mut i = 1;

    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-e" => {
                i += 1;
                if i >= args.len() {
                    return Err("'-e' needs argument".to_string());
                }
                opts.execute_strings.push(args[i].clone());
            }
            "-v" => opts.show_version = true,
            "-" => opts.read_stdin = true,
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("unrecognized option '{other}'"));
            }
            _ => opts.script_file = Some(arg.clone()),
        }
        i += 1;
    }

    Ok(opts)
}

fn run_source(source: &str) -> Result<(), String> {
    let ctx = whisker_script::run(source);
    for line in &ctx.output {
        println!("{line}");
    }
    if !ctx.success() {
        return Err(ctx.errors.join("\n"));
    }
    Ok(())
}

fn main() {
    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("whisker: {e}");
            print_usage();
            std::process::exit(1);
        }
    };

    if opts.show_version {
        println!("{VERSION}");
        if opts.execute_strings.is_empty() && opts.script_file.is_none() && !opts.read_stdin {
            return;
        }
    }

    for code in &opts.execute_strings {
        if let Err(e) = run_source(code) {
            eprintln!("whisker: {e}");
            std::process::exit(1);
        }
    }

    if let Some(filename) = &opts.script_file {
        let source = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("whisker: cannot open {filename}: {e}");
                std::process::exit(1);
            }
        };
        if let Err(e) = run_source(&source) {
            eprintln!("whisker: {e}");
            std::process::exit(1);
        }
    } else if opts.read_stdin {
        let mut source = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut source) {
            eprintln!("whisker: error reading stdin: {e}");
            std::process::exit(1);
        }
        if let Err(e) = run_source(&source) {
            eprintln!("whisker: {e}");
            std::process::exit(1);
        }
    } else if opts.execute_strings.is_empty() {
        print_usage();
    }
}

