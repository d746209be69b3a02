//! Simple command that prints one or '-n count' identifiers of the kind given
//!
//! Kinds: v1, v4, v6, v7 (default), ulid. A '-m' flag makes v7 and ulid monotonic.

use std::{env, io, io::Write, process::ExitCode};

use cup_uid::{Args, IdGenerator, Version};

struct Options {
    count: usize,
    version: Version,
    monotonic: bool,
}

fn main() -> io::Result<ExitCode> {
    let opts = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(opts) => opts,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!(
                    "Usage: {} [-n count] [-m] [v1|v4|v6|v7|ulid]",
                    program.as_deref().unwrap_or("ident")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let g = IdGenerator::new();
    let args = Args {
        monotonic: opts.monotonic,
        ..Default::default()
    };
    let mut buf = io::BufWriter::new(io::stdout());
    for _ in 0..opts.count {
        match g.generate(opts.version, &args) {
            Ok(id) => writeln!(buf, "{}", id)?,
            Err(err) => {
                buf.flush()?;
                eprintln!("Error: {}", err);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut count = None;
    let mut version = None;
    let mut monotonic = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-n" => {
                if count.is_some() {
                    return Err("option 'n' given more than once".to_owned());
                }
                let Some(n_arg) = args.next() else {
                    return Err("argument to option 'n' missing".to_owned());
                };
                let Ok(c) = n_arg.parse() else {
                    return Err(format!("invalid argument to option 'n': '{}'", n_arg));
                };
                count.replace(c);
            }
            "-m" => monotonic = true,
            kind => {
                if version.is_some() {
                    return Err("identifier kind given more than once".to_owned());
                }
                version.replace(match kind {
                    "v1" => Version::V1,
                    "v4" => Version::V4,
                    "v6" => Version::V6,
                    "v7" => Version::V7,
                    "ulid" => Version::Ulid,
                    _ => return Err(format!("unrecognized argument '{}'", kind)),
                });
            }
        }
    }
    Ok(Options {
        count: count.unwrap_or(1),
        version: version.unwrap_or(Version::V7),
        monotonic,
    })
}
