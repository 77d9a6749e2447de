//! vaultkv CLI Client
//!
//! Command-line interface for interacting with a vaultkv server.

use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vaultkv::protocol::{read_response, write_command, Command, Credentials, Response};

/// vaultkv CLI
#[derive(Parser, Debug)]
#[command(name = "vaultkv-cli")]
#[command(about = "CLI for the vaultkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9999")]
    server: String,

    /// Username for the request
    #[arg(short, long)]
    user: String,

    /// Password for the request
    #[arg(short, long)]
    password: String,

    /// Write the response payload to this file instead of stdout
    #[arg(short, long)]
    out: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register the credentials as a new account
    Reg,

    /// Stop the server
    Bye,

    /// Set this account's content from a file
    Set {
        /// File whose bytes become the content
        file: String,
    },

    /// Get a user's content
    Get {
        /// The account to read
        target: String,
    },

    /// List all registered users
    All,

    /// Compact the server's log
    Persist,

    /// Insert a new key from a file
    Kvi { key: String, file: String },

    /// Insert or update a key from a file
    Kvu { key: String, file: String },

    /// Get a key's value
    Kvg { key: String },

    /// Delete a key
    Kvd { key: String },

    /// List all keys
    Kva,

    /// List the most recently touched keys
    Kvt,

    /// Register a map-reduce extension from a shared object
    Kvf { name: String, object: String },

    /// Invoke a registered map-reduce extension
    Kmr { name: String },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(response) => {
            println!("{}", response.status.code());
            if let Some(payload) = response.payload {
                if let Err(e) = emit(&args.out, &payload) {
                    eprintln!("failed to write payload: {e}");
                    return ExitCode::FAILURE;
                }
            }
            if response.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> vaultkv::Result<Response> {
    let creds = Credentials::new(&args.user, &args.password);
    let command = build_command(&args.command, creds)?;

    let stream = TcpStream::connect(&args.server)?;
    let mut writer = stream.try_clone()?;
    let mut reader = stream;

    write_command(&mut writer, &command)?;
    read_response(&mut reader)
}

fn build_command(command: &Commands, creds: Credentials) -> vaultkv::Result<Command> {
    let command = match command {
        Commands::Reg => Command::Register { creds },
        Commands::Bye => Command::Bye { creds },
        Commands::Set { file } => Command::SetContent {
            creds,
            content: fs::read(file)?,
        },
        Commands::Get { target } => Command::GetContent {
            creds,
            target: target.clone(),
        },
        Commands::All => Command::AllUsers { creds },
        Commands::Persist => Command::Persist { creds },
        Commands::Kvi { key, file } => Command::KvInsert {
            creds,
            key: key.clone(),
            value: fs::read(file)?,
        },
        Commands::Kvu { key, file } => Command::KvUpsert {
            creds,
            key: key.clone(),
            value: fs::read(file)?,
        },
        Commands::Kvg { key } => Command::KvGet {
            creds,
            key: key.clone(),
        },
        Commands::Kvd { key } => Command::KvDelete {
            creds,
            key: key.clone(),
        },
        Commands::Kva => Command::KvAll { creds },
        Commands::Kvt => Command::KvTop { creds },
        Commands::Kvf { name, object } => Command::FuncRegister {
            creds,
            name: name.clone(),
            object: fs::read(object)?,
        },
        Commands::Kmr { name } => Command::FuncInvoke {
            creds,
            name: name.clone(),
        },
    };
    Ok(command)
}

fn emit(out: &Option<String>, payload: &[u8]) -> std::io::Result<()> {
    match out {
        Some(path) => fs::write(path, payload),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(payload)?;
            if !payload.ends_with(b"\n") {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}
