pub mod models;
pub mod render;

pub use color_eyre::{
    eyre::{bail, eyre as err, Context, Report},
    install,
};

#[twelf::config]
pub struct Conf {
    /// SQLite connection URI for the advisory cache
    pub database: String,

    /// Address the add-on server listens on
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Parental guide page template, `{id}` is replaced with the title identifier
    #[serde(default = "default_upstream")]
    pub upstream: String,

    /// Upstream request timeout, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
}

fn default_listen() -> String {
    String::from("0.0.0.0:7000")
}

fn default_upstream() -> String {
    String::from("https://www.imdb.com/title/{id}/parentalguide")
}

fn default_fetch_timeout() -> u64 {
    10
}

/// Checks that `raw` looks like a title identifier (two letters then digits)
/// and returns the title part of it.
///
/// Episode identifiers carry `:season:episode` after the title, the advisory
/// is per title so those are dropped.
pub fn parse_identifier(raw: &str) -> Result<&str, InvalidIdentifier> {
    let title = raw.split(':').next().unwrap_or(raw);

    let (prefix, digits) = match (title.get(..2), title.get(2..)) {
        (Some(prefix), Some(digits)) => (prefix, digits),
        _ => return Err(InvalidIdentifier(raw.to_string())),
    };

    let valid = prefix.chars().all(|c| c.is_ascii_alphabetic())
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit());

    if valid {
        Ok(title)
    } else {
        Err(InvalidIdentifier(raw.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a valid title identifier")]
pub struct InvalidIdentifier(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_title_identifiers() {
        assert_eq!(parse_identifier("tt0111161").unwrap(), "tt0111161");
        assert_eq!(parse_identifier("tt1").unwrap(), "tt1");
    }

    #[test]
    fn strips_episode_suffix() {
        assert_eq!(parse_identifier("tt0944947:1:2").unwrap(), "tt0944947");
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for raw in ["", "tt", "t1", "0111161", "tt01a1161", "ttt0111161", "tt 0111161", "ét123"] {
            assert!(parse_identifier(raw).is_err(), "{:?} should be rejected", raw);
        }
    }
}
