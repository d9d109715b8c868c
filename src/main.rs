use daemon_guard::cli::{print_error, Cli};

fn main() {
    // Any startup failure is fatal for the daemon
    if let Err(e) = Cli::run() {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
