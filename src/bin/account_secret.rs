// Encrypt or decrypt ENC(...) configuration values
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::env;

use lifusic_account::config::ENCRYPTOR_PASSWORD_VAR;
use lifusic_account::core::secrets;

#[derive(Parser, Debug)]
#[command(version, about = "Encrypt or decrypt account service configuration values", long_about = None)]
struct Cli {
    /// Encryptor password; defaults to JASYPT_ENCRYPTOR_PASSWORD
    #[arg(short, long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the value wrapped as ENC(...)
    Encrypt {
        value: String,
    },
    /// Print the plain value of an ENC(...) or bare payload
    Decrypt {
        value: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    let password = cli
        .password
        .or_else(|| env::var(ENCRYPTOR_PASSWORD_VAR).ok())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow!("No password given and {} is not set", ENCRYPTOR_PASSWORD_VAR))?;

    let output = match cli.command {
        Command::Encrypt { value } => {
            secrets::encrypt_wrapped(&value, &password).context("Encryption failed")?
        }
        Command::Decrypt { value } => {
            let decrypted = if secrets::is_encrypted(&value) {
                secrets::resolve(&value, Some(&password))
            } else {
                secrets::decrypt(&value, &password)
            };
            decrypted.context("Decryption failed")?
        }
    };

    println!("{}", output);
    Ok(())
}
