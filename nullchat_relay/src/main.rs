// CLI entry point for the nullchat relay.
//
// Starts a standalone relay that chat clients connect to. The relay tracks
// nicknames and forwards each message to every other connected client. See
// `server.rs` for the event-loop architecture and `session.rs` for the
// session table.
//
// Usage:
//   relay [OPTIONS]
//     --host <ADDR>           Interface to bind (default: 0.0.0.0)
//     --port <PORT>           Listen port (default: 21500)
//     --max-clients <N>       Max concurrent sessions (default: 8)
//     --nick <NAME>           Default nickname for new sessions (default: Anonymous)
//     --config <FILE>         JSON config file (flags override its values)

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use nullchat_relay::server::{RelayConfig, run_relay};

fn main() {
    env_logger::init();

    let config = parse_args();

    let listener = match std::net::TcpListener::bind((config.bind_host.as_str(), config.port)) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}:{}: {e}", config.bind_host, config.port);
            std::process::exit(1);
        }
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Failed to read bound address: {e}");
            std::process::exit(1);
        }
    };

    println!("Relay listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // The loop runs directly on the main thread — the whole server is one
    // thread of control. The process exits on SIGINT/SIGTERM, which closes
    // every session socket; that is fine for a relay with no durable state.
    let keep_running = AtomicBool::new(true);
    run_relay(&listener, &config, &keep_running);
}

/// Parse command-line arguments into a `RelayConfig`. Uses simple
/// `std::env::args()` matching — no clap dependency. A `--config` file is
/// loaded first; explicit flags override its values.
fn parse_args() -> RelayConfig {
    let args: Vec<String> = std::env::args().collect();

    // First pass: locate --config so flag overrides can be applied on top.
    let mut config = RelayConfig::default();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" {
            i += 1;
            let path: PathBuf = args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                eprintln!("--config requires a file path");
                std::process::exit(1);
            });
            config = RelayConfig::load(&path).unwrap_or_else(|e| {
                eprintln!("Failed to load config {}: {e}", path.display());
                std::process::exit(1);
            });
        }
        i += 1;
    }

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                config.bind_host = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--host requires an address");
                    std::process::exit(1);
                });
            }
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--max-clients" => {
                i += 1;
                config.max_clients =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--max-clients requires a valid number");
                        std::process::exit(1);
                    });
            }
            "--nick" => {
                i += 1;
                config.default_nick = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--nick requires a value");
                    std::process::exit(1);
                });
            }
            "--config" => {
                // Handled in the first pass; skip the path argument.
                i += 1;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host <ADDR>           Interface to bind (default: 0.0.0.0)");
    println!("  --port <PORT>           Listen port (default: 21500)");
    println!("  --max-clients <N>       Max concurrent sessions (default: 8)");
    println!("  --nick <NAME>           Default nickname for new sessions (default: Anonymous)");
    println!("  --config <FILE>         JSON config file (flags override its values)");
    println!("  --help, -h              Show this help");
}
