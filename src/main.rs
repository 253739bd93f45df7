fn main() {
    if let Err(err) = gemichat::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
