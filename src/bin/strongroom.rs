//! Strongroom CLI - personal file vault
//!
//! Command-line interface for encrypting files in place under generated
//! per-file passwords, tracked in an encrypted manifest unlocked by a
//! single session passphrase.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use strongroom::error::{ErrorCategory, ErrorKind, Result, VaultError};
use strongroom::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use strongroom::vault::Vault;

#[derive(Parser)]
#[command(name = "strongroom")]
#[command(version)]
#[command(about = "Personal file vault with per-file passwords.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Path to the vault manifest file
    #[arg(short = 'f', long, global = true, value_name = "FILE", default_value = "strongroom.vault")]
    vault_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files registered in the vault
    #[command(alias = "ls")]
    List,

    /// Encrypt a file in place and register it
    #[command(alias = "a")]
    Add {
        /// Path to the file to encrypt
        file: PathBuf,

        /// Tag to attach to the file (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Decrypt a registered file and print its contents to stdout
    #[command(alias = "s")]
    Show {
        /// Path to the registered file
        file: PathBuf,
    },

    /// Decrypt a registered file back to plaintext on disk and forget it
    #[command(alias = "r")]
    Restore {
        /// Path to the registered file
        file: PathBuf,
    },

    /// Replace the tags on a registered file
    Retag {
        /// Path to the registered file
        file: PathBuf,

        /// New tag set (repeatable)
        #[arg(long = "tag", value_name = "TAG", required = true)]
        tags: Vec<String>,
    },

    /// Rename a registered file's manifest entry (the file is not moved)
    Rename {
        /// Path currently registered
        file: PathBuf,

        /// New path to register it under
        new_name: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut reader = get_passphrase_reader(cli.passphrase_stdin);
    let passphrase = reader.read_passphrase()?;
    let mut vault = Vault::open(&cli.vault_file, &passphrase)?;

    match cli.command {
        Commands::List => {
            let mut names = vault.list_names();
            names.sort();
            for name in names {
                println!("{name}");
            }
        }
        Commands::Add { file, tags } => {
            vault.add_and_encrypt(&file, tags)?;
        }
        Commands::Show { file } => {
            let plaintext = vault.decrypt_read(&file)?;
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&plaintext)
                .and_then(|()| stdout.flush())
                .map_err(|e| {
                    VaultError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write plaintext to stdout",
                        e,
                    )
                })?;
        }
        Commands::Restore { file } => {
            vault.decrypt_restore(&file)?;
        }
        Commands::Retag { file, tags } => {
            vault.update_metadata(&file, None, Some(tags))?;
        }
        Commands::Rename { file, new_name } => {
            vault.update_metadata(&file, Some(&new_name), None)?;
        }
    }

    Ok(())
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}
