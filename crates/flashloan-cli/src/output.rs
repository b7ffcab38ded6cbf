use std::fmt::Display;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

pub fn print<T: Serialize + Display>(value: &T) -> anyhow::Result<()> {
    if is_json() {
        let s = serde_json::to_string_pretty(value)?;
        println!("{s}");
        return Ok(());
    }
    println!("{value}");
    Ok(())
}

/// Human-mode line with a colored status tag, e.g. `[created] hello1 ...`.
pub fn status_line(tag: &str, fresh: bool, msg: &str) -> io::Result<()> {
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let color = if fresh { Color::Green } else { Color::Yellow };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "[{tag}]")?;
    out.reset()?;
    writeln!(out, " {msg}")
}
