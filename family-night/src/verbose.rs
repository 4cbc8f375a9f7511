//! `-v`/`-q` flags mapped onto a tracing level, based on clap-verbosity-flag

use tracing::{level_filters::LevelFilter, Level};

/// Level used when neither flag is given.
const DEFAULT_LEVEL: Level = Level::INFO;

#[derive(clap::Args, Debug, Clone)]
pub struct Verbosity {
    #[clap(
        long,
        short = 'v',
        parse(from_occurrences),
        global = true,
        help = "More output per occurrence"
    )]
    verbose: i8,

    #[clap(
        long,
        short = 'q',
        parse(from_occurrences),
        global = true,
        help = "Less output per occurrence",
        conflicts_with = "verbose"
    )]
    quiet: i8,
}

impl Verbosity {
    pub fn log_level_filter(&self) -> LevelFilter {
        level_enum(self.verbosity())
            .map(LevelFilter::from_level)
            .unwrap_or(LevelFilter::OFF)
    }

    fn verbosity(&self) -> i8 {
        level_value(DEFAULT_LEVEL) - self.quiet + self.verbose
    }
}

fn level_value(level: Level) -> i8 {
    match level {
        Level::ERROR => 0,
        Level::WARN => 1,
        Level::INFO => 2,
        Level::DEBUG => 3,
        Level::TRACE => 4,
    }
}

fn level_enum(verbosity: i8) -> Option<Level> {
    match verbosity {
        i8::MIN..=-1 => None,
        0 => Some(Level::ERROR),
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        4..=i8::MAX => Some(Level::TRACE),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[clap(flatten)]
        verbose: Verbosity,
    }

    fn filter(args: &[&str]) -> LevelFilter {
        Cli::parse_from(args).verbose.log_level_filter()
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(filter(&["bin"]), LevelFilter::INFO);
    }

    #[test]
    fn flags_move_the_level() {
        assert_eq!(filter(&["bin", "-v"]), LevelFilter::DEBUG);
        assert_eq!(filter(&["bin", "-vvvv"]), LevelFilter::TRACE);
        assert_eq!(filter(&["bin", "-q"]), LevelFilter::WARN);
        assert_eq!(filter(&["bin", "-qqq"]), LevelFilter::OFF);
    }
}
