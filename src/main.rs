fn main() {
    if let Err(err) = shipment_loader::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
