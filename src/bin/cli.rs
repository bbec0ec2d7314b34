//! fileport CLI Client
//!
//! Interactive prompt for listing, downloading, and uploading files.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use fileport::protocol::CommandKind;
use fileport::storage::validate_filename;
use fileport::{Client, FileportError, Limits};
use tracing_subscriber::{fmt, EnvFilter};

const HELP: &str = "Available commands: LS, GET <file>, PUT <file>, QUIT";

/// fileport CLI
#[derive(Parser, Debug)]
#[command(name = "fileport-cli")]
#[command(about = "Interactive client for a fileport server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:5002")]
    server: String,

    /// Local directory for downloads and uploads
    #[arg(short, long, default_value = "./client_files")]
    dir: PathBuf,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();

    if let Err(e) = std::fs::create_dir_all(&args.dir) {
        eprintln!("Error: cannot create {}: {}", args.dir.display(), e);
        std::process::exit(1);
    }

    println!("Connecting to {}...", args.server);
    let mut client = match Client::connect_with(args.server.as_str(), Limits::default()) {
        Ok(c) => c,
        Err(FileportError::Io(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
            eprintln!("Error: Could not connect to server at {}", args.server);
            eprintln!("Make sure the server is running.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C re-prompts instead of dropping the session
    if let Err(e) = ctrlc::set_handler(|| {
        print!("\nInterrupted. Use QUIT to disconnect properly.\nftp> ");
        let _ = io::stdout().flush();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    println!("{}\n", client.greeting());
    println!("{}", HELP);
    println!("Client directory: {}\n", args.dir.display());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("ftp> ");
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            // EOF on stdin ends the session politely
            Some(Err(_)) | None => {
                println!();
                quit(client);
                break;
            }
        };

        let Some((word, filename)) = parse_input(&line) else {
            continue;
        };

        let kind = match word.parse::<CommandKind>() {
            Ok(kind) => kind,
            Err(_) => {
                println!("Unknown command: {}", word);
                println!("{}", HELP);
                continue;
            }
        };

        let name = match filename {
            Some(name) => name,
            None if kind.takes_filename() => {
                println!("Error: {} requires a filename", kind);
                continue;
            }
            None => "",
        };

        let result = match kind {
            CommandKind::Ls => handle_ls(&mut client),
            CommandKind::Get => handle_get(&mut client, &args.dir, name),
            CommandKind::Put => handle_put(&mut client, &args.dir, name),
            CommandKind::Quit => {
                quit(client);
                break;
            }
        };

        if let Err(e) = result {
            println!("Error: {}", e);
            if e.is_connection_fatal() {
                println!("Error: Connection lost");
                break;
            }
        }
    }

    println!("Connection closed");
}

/// Split a prompt line into an upper-cased command word and optional filename
fn parse_input(line: &str) -> Option<(String, Option<&str>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut parts = line.splitn(2, char::is_whitespace);
    let word = parts.next()?.to_ascii_uppercase();
    let filename = parts.next().map(str::trim).filter(|f| !f.is_empty());
    Some((word, filename))
}

fn handle_ls(client: &mut Client) -> fileport::Result<()> {
    let files = client.list()?;
    println!("\nServer files ({}):", files.len());
    for file in files {
        println!("  - {}", file);
    }
    Ok(())
}

fn handle_get(client: &mut Client, dir: &Path, name: &str) -> fileport::Result<()> {
    let dest = dir.join(validate_filename(name)?);
    let report = client.get(name, &dest)?;
    println!("Downloaded: {} ({} bytes)", name, report.bytes_received);
    Ok(())
}

fn handle_put(client: &mut Client, dir: &Path, name: &str) -> fileport::Result<()> {
    let source = dir.join(validate_filename(name)?);
    let sent = client.put(name, &source)?;
    println!("Uploaded: {} ({} bytes)", name, sent);
    Ok(())
}

fn quit(client: Client) {
    match client.quit() {
        Ok(message) => println!("{}", message),
        Err(e) => println!("Error: {}", e),
    }
}
