//! RangeKV CLI Client
//!
//! Two modes over one TCP connection:
//! - One-shot: a subcommand runs a single operation and prints its reply
//! - Line mode: with no subcommand, operations are read from stdin one per
//!   line (`PUT k v`, `GET k`, `SWAP k v`, `DELETE k`, `SCAN a b`, `STOP`)
//!   and one reply line is printed per operation
//!
//! A single stream is used for sequential write-then-read; the socket is
//! never cloned into separate reader/writer handles.

use std::io::{BufRead, Write};
use std::net::{Shutdown, TcpStream};
use std::process::exit;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rangekv::protocol::{
    decode_pairs, encode_command, read_response, Command, Response, Status,
};
use rangekv::Result;

/// RangeKV CLI
#[derive(Parser, Debug)]
#[command(name = "rangekv-cli")]
#[command(about = "CLI for the RangeKV key-value store")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7050")]
    server: String,

    /// Socket timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a key-value pair
    Put { key: String, value: String },

    /// Get a value by key
    Get { key: String },

    /// Install a key-value pair, printing the displaced value
    Swap { key: String, value: String },

    /// Delete a key
    Del { key: String },

    /// List entries with start_key <= key <= end_key
    Scan { start_key: String, end_key: String },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    let addr = match args.server.parse() {
        Ok(addr) => addr,
        Err(_) => {
            eprintln!("invalid server address: {}", args.server);
            exit(1);
        }
    };

    let mut stream = match TcpStream::connect_timeout(&addr, Duration::from_millis(args.timeout)) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("failed to connect to {}: {e}", args.server);
            exit(1);
        }
    };

    let _ = stream.set_read_timeout(Some(Duration::from_millis(args.timeout)));
    let _ = stream.set_write_timeout(Some(Duration::from_millis(args.timeout)));
    let _ = stream.set_nodelay(true);

    match args.command {
        Some(command) => one_shot(&mut stream, command),
        None => line_mode(&mut stream),
    }

    // Half-close so the server's read loop sees EOF immediately
    let _ = stream.shutdown(Shutdown::Write);
}

/// Write one command and read its reply off the same stream
fn exchange(stream: &mut TcpStream, command: &Command) -> Result<Response> {
    stream.write_all(&encode_command(command))?;
    stream.flush()?;
    read_response(stream)
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {err}");
    exit(1);
}

// =============================================================================
// One-shot mode
// =============================================================================

fn one_shot(stream: &mut TcpStream, command: Commands) {
    match command {
        Commands::Put { key, value } => {
            let response = exchange(
                stream,
                &Command::Put {
                    key: key.clone(),
                    value: value.clone(),
                },
            )
            .unwrap_or_else(|e| fail("PUT failed", e));
            match reply_found(&response) {
                Ok(found) => println!("PUT {key} {value} (found={found})"),
                Err(msg) => fail("PUT failed", msg),
            }
        }
        Commands::Get { key } => {
            let response = exchange(stream, &Command::Get { key: key.clone() })
                .unwrap_or_else(|e| fail("GET failed", e));
            match response.status {
                Status::Ok => println!("GET {key} {}", payload_text(&response)),
                Status::NotFound => println!("GET {key} null"),
                Status::Error => fail("GET failed", payload_text(&response)),
            }
        }
        Commands::Swap { key, value } => {
            let response = exchange(
                stream,
                &Command::Swap {
                    key: key.clone(),
                    value: value.clone(),
                },
            )
            .unwrap_or_else(|e| fail("SWAP failed", e));
            match response.status {
                Status::Ok => println!("SWAP {key} old={} new={value}", payload_text(&response)),
                Status::NotFound => println!("SWAP {key} null"),
                Status::Error => fail("SWAP failed", payload_text(&response)),
            }
        }
        Commands::Del { key } => {
            let response = exchange(stream, &Command::Delete { key: key.clone() })
                .unwrap_or_else(|e| fail("DELETE failed", e));
            match reply_found(&response) {
                Ok(found) => println!("DELETE {key} (found={found})"),
                Err(msg) => fail("DELETE failed", msg),
            }
        }
        Commands::Scan {
            start_key,
            end_key,
        } => {
            let response = exchange(
                stream,
                &Command::Scan {
                    start_key: start_key.clone(),
                    end_key: end_key.clone(),
                },
            )
            .unwrap_or_else(|e| fail("SCAN failed", e));
            match scan_pairs(&response) {
                Ok(pairs) => {
                    println!("SCAN {start_key} {end_key} ({} pairs)", pairs.len());
                    for (key, value) in pairs {
                        println!("  {key} {value}");
                    }
                }
                Err(msg) => fail("SCAN failed", msg),
            }
        }
        Commands::Ping => {
            let response =
                exchange(stream, &Command::Ping).unwrap_or_else(|e| fail("PING failed", e));
            match response.status {
                Status::Ok => println!("{}", payload_text(&response)),
                _ => fail("PING failed", payload_text(&response)),
            }
        }
    }
}

// =============================================================================
// Line mode
// =============================================================================

fn line_mode(stream: &mut TcpStream) {
    let stdin = std::io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => fail("stdin read failed", e),
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&verb) = parts.first() else {
            continue;
        };

        match (verb.to_ascii_uppercase().as_str(), &parts[1..]) {
            ("PUT", [key, value]) => {
                match exchange(
                    stream,
                    &Command::Put {
                        key: (*key).to_string(),
                        value: (*value).to_string(),
                    },
                )
                .map(|r| reply_found(&r))
                {
                    Ok(Ok(found)) => {
                        println!("PUT {key} {}", if found { "found" } else { "not_found" })
                    }
                    Ok(Err(msg)) => eprintln!("PUT failed: {msg}"),
                    Err(e) => eprintln!("PUT failed: {e}"),
                }
            }
            ("GET", [key]) => match exchange(
                stream,
                &Command::Get {
                    key: (*key).to_string(),
                },
            ) {
                Ok(response) => match response.status {
                    Status::Ok => println!("GET {key} {}", payload_text(&response)),
                    Status::NotFound => println!("GET {key} null"),
                    Status::Error => eprintln!("GET failed: {}", payload_text(&response)),
                },
                Err(e) => eprintln!("GET failed: {e}"),
            },
            ("SWAP", [key, value]) => match exchange(
                stream,
                &Command::Swap {
                    key: (*key).to_string(),
                    value: (*value).to_string(),
                },
            ) {
                Ok(response) => match response.status {
                    Status::Ok => println!("SWAP {key} {}", payload_text(&response)),
                    Status::NotFound => println!("SWAP {key} null"),
                    Status::Error => eprintln!("SWAP failed: {}", payload_text(&response)),
                },
                Err(e) => eprintln!("SWAP failed: {e}"),
            },
            ("DELETE", [key]) => {
                match exchange(
                    stream,
                    &Command::Delete {
                        key: (*key).to_string(),
                    },
                )
                .map(|r| reply_found(&r))
                {
                    Ok(Ok(found)) => {
                        println!("DELETE {key} {}", if found { "found" } else { "not_found" })
                    }
                    Ok(Err(msg)) => eprintln!("DELETE failed: {msg}"),
                    Err(e) => eprintln!("DELETE failed: {e}"),
                }
            }
            ("SCAN", [start_key, end_key]) => match exchange(
                stream,
                &Command::Scan {
                    start_key: (*start_key).to_string(),
                    end_key: (*end_key).to_string(),
                },
            )
            .map(|r| scan_pairs(&r))
            {
                Ok(Ok(pairs)) => {
                    println!("SCAN {start_key} {end_key} BEGIN");
                    for (key, value) in pairs {
                        println!("  {key} {value}");
                    }
                    println!("SCAN END");
                }
                Ok(Err(msg)) => eprintln!("SCAN failed: {msg}"),
                Err(e) => eprintln!("SCAN failed: {e}"),
            },
            ("STOP", []) => return,
            _ => eprintln!("unknown command: {line}"),
        }
    }
}

// =============================================================================
// Reply helpers
// =============================================================================

/// Found flag out of a PUT or DELETE reply, or the server's error message
fn reply_found(response: &Response) -> std::result::Result<bool, String> {
    match response.status {
        Status::Error => Err(payload_text(response)),
        _ => response.found().map_err(|e| e.to_string()),
    }
}

/// Pair list out of a SCAN reply, or the server's error message
fn scan_pairs(response: &Response) -> std::result::Result<Vec<(String, String)>, String> {
    match response.status {
        Status::Ok => decode_pairs(response.payload.as_deref().unwrap_or(&[]))
            .map_err(|e| e.to_string()),
        _ => Err(payload_text(response)),
    }
}

/// Payload rendered as text for display
fn payload_text(response: &Response) -> String {
    match &response.payload {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => String::new(),
    }
}
