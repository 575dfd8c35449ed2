//! Watch party server binary
//!
//! Run with: watch-party [BIND_ADDR]
//!
//! Set `SSL_CERT` and `SSL_KEY` to serve `wss://`. Commands typed on stdin
//! are run by the operator console; `help` lists them.

use std::future::Future;
use std::net::SocketAddr;

use watch_party::console::{self, ConsoleExit};
use watch_party::server::config::DEFAULT_PORT;
use watch_party::{ServerConfig, WatchPartyServer};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:13579
/// - "localhost:8080" -> 127.0.0.1:8080
/// - "127.0.0.1" -> 127.0.0.1:13579
/// - "0.0.0.0:8080" -> 0.0.0.0:8080
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: watch-party [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: $WATCH_PARTY_ADDR or 0.0.0.0:13579)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SSL_CERT, SSL_KEY    PEM certificate and key; both enable TLS");
    eprintln!("  RUST_LOG             Log filter (default: watch_party=info)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  watch-party                     # binds to 0.0.0.0:13579");
    eprintln!("  watch-party localhost           # binds to 127.0.0.1:13579");
    eprintln!("  watch-party 127.0.0.1:8080      # binds to 127.0.0.1:8080");
}

/// Resolves when the operator types `exit`, or on Ctrl+C or SIGTERM
async fn shutdown_signal<C>(console: C)
where
    C: Future<Output = watch_party::Result<ConsoleExit>>,
{
    let console = async {
        match console.await {
            Ok(ConsoleExit::Shutdown) => {}
            Ok(ConsoleExit::EndOfInput) => std::future::pending().await,
            Err(e) => {
                tracing::warn!(error = %e, "Console stopped");
                std::future::pending().await
            }
        }
    };

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = console => {}
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => Some(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => None,
    };

    // Logs on stderr, console on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("watch_party=info".parse()?),
        )
        .init();

    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(addr) = bind_addr {
        config = config.bind(addr);
    }

    println!(
        "Starting watch party server on {}://{}",
        config.scheme(),
        config.bind_addr
    );
    println!("Viewers connect to /viewer, controllers to /controller.");
    println!("Type \"help\" for a list of commands.");
    println!();

    let server = WatchPartyServer::new(config);
    let console = console::run_stdio(server.coordinator().clone());

    let code = match server.run_until(shutdown_signal(console)).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Server error: {}", e);
            1
        }
    };

    // A pending stdin read blocks runtime shutdown
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(
            parse_bind_addr("localhost").unwrap(),
            "127.0.0.1:13579".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_bind_addr("localhost:8080").unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_bind_addr("10.0.0.2").unwrap(),
            "10.0.0.2:13579".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_bind_addr("watch.example:80").is_err());
    }
}
