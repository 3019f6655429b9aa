//! Reads a password from stdin and prints its encoded Argon2id hash,
//! ready to paste into an account's `password_hash` setting.

use std::io::{self, BufRead};

use blog_auth::auth::hash_password;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);

    if password.is_empty() {
        return Err("no password given on stdin".into());
    }

    println!("{}", hash_password(password)?);
    Ok(())
}
