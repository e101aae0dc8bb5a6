//! Tracing subscriber set-up

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How log records are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub verbose: bool,
    pub json: bool,
}

/// Default level of the gcn crates
pub fn default_level(options: &LogOptions) -> Level {
    if options.verbose { Level::DEBUG } else { Level::WARN }
}

/// Filter directives applied when `RUST_LOG` is unset
pub fn default_directives(options: &LogOptions) -> Vec<String> {
    let level = default_level(options).as_str().to_lowercase();
    ["gcn", "gcn_core", "gcn_undeploy", "gcn_oci", "gcn_cli"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect()
}

/// Install the global subscriber; later calls are ignored.
///
/// `RUST_LOG` takes precedence over `--verbose`. Output goes to stderr so it
/// does not interleave with progress lines.
pub fn init(options: LogOptions) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if std::env::var("RUST_LOG").is_err() {
            for directive in default_directives(&options) {
                if let Ok(directive) = directive.parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        let registry = tracing_subscriber::registry().with(filter);
        if options.json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_level() {
        let quiet = LogOptions::default();
        let verbose = LogOptions { verbose: true, json: false };
        assert_eq!(default_level(&quiet), Level::WARN);
        assert_eq!(default_level(&verbose), Level::DEBUG);
    }

    #[test]
    fn test_directives_parse() {
        let directives = default_directives(&LogOptions { verbose: true, json: true });
        assert!(directives.contains(&"gcn_undeploy=debug".to_string()));
        for directive in directives {
            assert!(directive.parse::<tracing_subscriber::filter::Directive>().is_ok());
        }
    }
}
