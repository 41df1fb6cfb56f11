fn main() {
    if let Err(err) = csv_formgen::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
