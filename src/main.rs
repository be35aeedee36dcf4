fn main() {
    if let Err(e) = outliner::tui::run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
