//! Runtime configuration: command line first, then environment, then
//! defaults. Read once at start-up.

use clap::builder::FalseyValueParser;
use clap::{Arg, ArgAction, ArgMatches};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:1234";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SOCKET_PATH: &str = "/socket.io/?EIO=4&transport=websocket";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub socket_url: String,
    pub force_debug: bool,
    /// Running outside the host wallet, so the auth gate applies.
    pub fallback_mode: bool,
    pub timeout: Duration,
}

/// `http(s)://host[/path]` -> `ws(s)://host/socket.io/...`.
pub fn socket_url_for(backend_url: &str) -> String {
    let trimmed = backend_url.trim_end_matches('/');
    let (scheme, rest) = match trimmed.split_once("://") {
        Some(("https", rest)) => ("wss", rest),
        Some(("http", rest)) => ("ws", rest),
        Some((scheme, rest)) => (scheme, rest),
        None => ("ws", trimmed),
    };
    let host = rest.split('/').next().unwrap_or(rest);
    format!("{scheme}://{host}{SOCKET_PATH}")
}

/// Global flags shared by every subcommand.
pub fn args() -> Vec<Arg> {
    vec![
        Arg::new("backend-url")
            .long("backend-url")
            .value_name("URL")
            .env("BACKEND_URL")
            .global(true)
            .help("GraphQL endpoint"),
        Arg::new("socket-url")
            .long("socket-url")
            .value_name("URL")
            .env("SOCKET_URL")
            .global(true)
            .help("Socket endpoint (derived from the backend URL if absent)"),
        Arg::new("debug")
            .long("debug")
            .env("FORCE_DEBUG")
            .action(ArgAction::SetTrue)
            .value_parser(FalseyValueParser::new())
            .global(true)
            .help("Force debug-level logging"),
        Arg::new("fallback-mode")
            .long("fallback-mode")
            .env("FALLBACK_MODE")
            .action(ArgAction::SetTrue)
            .value_parser(FalseyValueParser::new())
            .global(true)
            .help("Running outside the host wallet; require authentication"),
        Arg::new("timeout")
            .long("timeout")
            .value_name("SECS")
            .env("REQUEST_TIMEOUT_SECS")
            .value_parser(clap::value_parser!(u64))
            .global(true)
            .help("HTTP request timeout in seconds"),
    ]
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let backend_url = matches
            .get_one::<String>("backend-url")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let socket_url = matches
            .get_one::<String>("socket-url")
            .cloned()
            .unwrap_or_else(|| socket_url_for(&backend_url));
        let timeout = matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            backend_url,
            socket_url,
            force_debug: matches.get_flag("debug"),
            fallback_mode: matches.get_flag("fallback-mode"),
            timeout: Duration::from_secs(timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn parse(argv: &[&str]) -> Config {
        let cmd = Command::new("t").args(args());
        Config::from_matches(&cmd.get_matches_from(argv))
    }

    #[test]
    fn socket_url_is_derived_from_backend() {
        assert_eq!(
            socket_url_for("https://api.example.com/graphql"),
            "wss://api.example.com/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url_for("http://localhost:1234/"),
            "ws://localhost:1234/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url_for("localhost:9"),
            "ws://localhost:9/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = parse(&[
            "t",
            "--backend-url",
            "https://bank.test/graphql",
            "--timeout",
            "5",
            "--debug",
        ]);
        assert_eq!(cfg.backend_url, "https://bank.test/graphql");
        assert_eq!(cfg.socket_url, socket_url_for("https://bank.test/graphql"));
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert!(cfg.force_debug);
        assert!(!cfg.fallback_mode);

        let explicit = parse(&["t", "--socket-url", "ws://elsewhere/ws"]);
        assert_eq!(explicit.socket_url, "ws://elsewhere/ws");
    }

    #[test]
    fn debug_env_accepts_any_truthy_value() {
        // only this test touches FORCE_DEBUG
        unsafe { std::env::set_var("FORCE_DEBUG", "1") };
        let on = Command::new("t").args(args()).try_get_matches_from(["t"]);
        unsafe { std::env::set_var("FORCE_DEBUG", "0") };
        let off = Command::new("t").args(args()).try_get_matches_from(["t"]);
        unsafe { std::env::remove_var("FORCE_DEBUG") };

        assert!(Config::from_matches(&on.unwrap()).force_debug);
        assert!(!Config::from_matches(&off.unwrap()).force_debug);
    }
}
