//! MariaDB service broker

fn main() {
    if let Err(e) = mariadb_broker::cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
