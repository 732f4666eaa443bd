//! Binary entrypoint for depends-cli.

fn main() {
    if let Err(err) = depends_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
