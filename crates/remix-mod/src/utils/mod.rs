use crate::errors::CliError;
use miette::Result;
use regex::Regex;
use std::sync::OnceLock;

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[[:word:]-]+$").unwrap())
}

pub fn is_valid_slug(name: impl AsRef<str>) -> bool {
    slug_regex().is_match(name.as_ref())
}

/// Output names become file names, so they must be a bare slug.
pub fn validate_output_name(name: impl AsRef<str>) -> Result<()> {
    let name_str = name.as_ref();
    if !is_valid_slug(name_str) {
        return Err(CliError::invalid_output_name(name_str.to_string(), None).into());
    }

    Ok(())
}
