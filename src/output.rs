//! User-facing console lines, kept separate from tracing logs.
//! Prefixes are colored only when stdout is a TTY, so piped output stays
//! parseable.

use owo_colors::OwoColorize;

enum Level {
    Info,
    Warn,
    Error,
    Ok,
}

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn print(level: Level, msg: &str) {
    let plain = match level {
        Level::Info => "info:",
        Level::Warn => "warn:",
        Level::Error => "error:",
        Level::Ok => "ok:",
    };
    let colored = if is_tty() {
        match level {
            Level::Info => plain.cyan().bold().to_string(),
            Level::Warn => plain.yellow().bold().to_string(),
            Level::Error => plain.red().bold().to_string(),
            Level::Ok => plain.green().bold().to_string(),
        }
    } else {
        plain.to_string()
    };
    match level {
        Level::Warn | Level::Error => eprintln!("{} {}", colored, msg),
        _ => println!("{} {}", colored, msg),
    }
}

pub fn print_info(msg: &str) {
    print(Level::Info, msg);
}

pub fn print_warn(msg: &str) {
    print(Level::Warn, msg);
}

pub fn print_error(msg: &str) {
    print(Level::Error, msg);
}

pub fn print_success(msg: &str) {
    print(Level::Ok, msg);
}

/// Plain user-facing line (no prefix). Progress lines and the final per-file
/// summary go through this so scripts can parse them.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}
