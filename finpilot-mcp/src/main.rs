//! FinPilot MCP Server
//!
//! Model Context Protocol server over stdio: one JSON-RPC message per line
//! on stdin, responses on stdout, logs on stderr.

mod config;
mod server;

use config::ServerConfig;
use finpilot::FinPilot;
use server::{Server, PROTOCOL_VERSION, SERVER_VERSION};
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("finpilot-mcp: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.env_filter() {
        Ok(filter) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .init(),
        Err(e) => {
            eprintln!("finpilot-mcp: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let server = Server::new(FinPilot::with_calculators().with_precision(config.precision));

    tracing::info!(version = SERVER_VERSION, protocol = PROTOCOL_VERSION, precision = config.precision, "FinPilot MCP server started");

    match serve(&server, io::stdin().lock(), io::stdout()) {
        Ok(()) => {
            tracing::info!("client disconnected, shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "stdio failure, shutting down");
            ExitCode::FAILURE
        }
    }
}

/// Serve requests until EOF
fn serve<R: BufRead, W: Write>(server: &Server, mut reader: R, mut writer: W) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        tracing::trace!(bytes = message.len(), "received");
        let Some(response) = server.handle_line(message) else {
            continue;
        };

        let json = serde_json::to_string(&response).map_err(io::Error::other)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_answers_requests_only() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, "\n",
            "\n",
            r#"{"jsonrpc":"2.0","method":"initialized"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"calculate","arguments":{"calculator":"cagr","args":[100000,200000,5]}}}"#, "\n",
        );
        let server = Server::new(FinPilot::with_calculators());
        let mut out = Vec::new();
        serve(&server, input.as_bytes(), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], 2);
        assert_eq!(lines[1]["result"]["isError"], false);
    }
}
