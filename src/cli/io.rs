//! JSON output for CLI commands
//!
//! - Output: single JSON object via stdout
//! - `{"status":"ok","data":...}` or `{"status":"error","code":..,"message":..}`
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&mut io::stdout(), &success(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str, details: Option<Value>) -> CliResult<()> {
    write_line(&mut io::stdout(), &failure(code, message, details))
}

fn success(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

fn failure(code: &str, message: &str, details: Option<Value>) -> Value {
    let mut response = json!({
        "status": "error",
        "code": code,
        "message": message
    });
    if let Some(details) = details {
        response["details"] = details;
    }
    response
}

fn write_line<W: Write>(out: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
