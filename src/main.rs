fn main() {
    #[cfg(feature = "cli")]
    bitwire::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("bitwire: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
