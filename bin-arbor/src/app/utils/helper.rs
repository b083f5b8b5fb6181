use std::path::Path;
use arbor::{Container, Value};
use arbor_linalg::Array;
use crate::app::err::*;

pub fn measure<F, Res>(proc: F) -> (Res, std::time::Duration)
where F: FnOnce() -> Res {
    let start = std::time::Instant::now();
    let res = proc();
    let time = start.elapsed();
    (res, time)
}

pub fn guard_panic<F, R>(f: F) -> Result<R, Box<dyn std::error::Error>>
where F: FnOnce() -> Result<R, Box<dyn std::error::Error>> + std::panic::UnwindSafe {
    std::panic::catch_unwind(|| {
        f()
    }).unwrap_or_else(|e| {
        let info = match e.downcast::<String>() {
            Ok(v) => *v,
            Err(e) => match e.downcast::<&str>() {
                Ok(v) => v.to_string(),
                _ => "Unknown Source of Error".to_owned()
            }
        };
        err!("panic: {info}")
    })
}

/// Reads `input` as a JSON file if such a file exists, otherwise as inline JSON.
pub fn load_value(input: &str) -> Result<Value<Array>, Box<dyn std::error::Error>> {
    let text = if Path::new(input).is_file() {
        std::fs::read_to_string(input)?
    } else {
        input.to_owned()
    };

    match serde_json::from_str::<Value<Array>>(&text) {
        Ok(v) => Ok(v),
        Err(e) => err!("invalid input '{}': {e}", input)
    }
}

pub fn load_container(path: &str) -> Result<Container<Array>, Box<dyn std::error::Error>> {
    ensure!(Path::new(path).is_file(), "output file not found: '{}'", path);

    match load_value(path)? {
        Value::Map(c) => Ok(c),
        _ => err!("output file '{}' must hold a JSON object", path)
    }
}

pub fn save_container(path: &str, c: &Container<Array>) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(c)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Parses `key=value`.
pub fn parse_assign(s: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    let r = regex::Regex::new(r"^\s*([^=\s]+)\s*=\s*(.*?)\s*$")?;
    if let Some(m) = r.captures(s) {
        return Ok((m[1].to_string(), m[2].to_string()))
    }

    err!("cannot parse '{}' as `key=value`.", s)
}
