fn main() {
    let _ = dotenvy::dotenv();
    if let Err(err) = folio_palette::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
