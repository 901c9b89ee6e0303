// ABOUTME: Shared logging setup for yasnoop binaries
// ABOUTME: init() for plain stderr logging, init_for() for the bot and its helper crates

use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Crate-filtered logging to stderr. Default: INFO for the named crates, WARN for everything else.
/// The bot passes its own crate plus `yasnoop_disk` so storage calls show up next to chat events.
pub fn init_for(crate_names: &[&str]) {
    let mut filter =
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());
    for name in crate_names {
        filter = filter.add_directive(crate_directive(name));
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn crate_directive(crate_name: &str) -> tracing_subscriber::filter::Directive {
    format!("{crate_name}=info")
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_init() {
        let _ = super::init as fn();
    }

    #[test]
    fn exports_init_for() {
        let _ = super::init_for as fn(&[&str]);
    }

    #[test]
    fn crate_directive_targets_named_crate() {
        let directive = crate_directive("yasnoop_disk");
        assert_eq!(directive.to_string(), "yasnoop_disk=info");
    }
}
