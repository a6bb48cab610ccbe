//! Interactive terminal prompts.

use std::io::{self, Write};

use anyhow::Result;

/// Ask for a username, offering `default` when one is known
pub fn username(default: Option<&str>) -> Result<String> {
    match default {
        Some(last_user) => print!("Username [{}]: ", last_user),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(pick_username(&input, default))
}

pub fn password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    Ok(password)
}

fn pick_username(input: &str, default: Option<&str>) -> String {
    let input = input.trim();
    match default {
        Some(last_user) if input.is_empty() => last_user.to_string(),
        _ => input.to_string(),
    }
}
