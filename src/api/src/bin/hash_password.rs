//! Reads a password from stdin and prints the argon2 PHC string to put in
//! `admin.password_hash`.
use anyhow::Context;
use oasis::authentication::compute_password_hash;
use secrecy::{ExposeSecret, Secret};
use std::io::Read;

fn main() -> anyhow::Result<()> {
    let mut password = String::new();
    std::io::stdin()
        .read_to_string(&mut password)
        .context("Failed to read the password from stdin")?;
    let password = password.trim_end_matches(&['\r', '\n'][..]).to_string();
    if password.is_empty() {
        anyhow::bail!("The password cannot be empty");
    }

    let hash = compute_password_hash(Secret::new(password))?;
    println!("{}", hash.expose_secret());
    Ok(())
}
