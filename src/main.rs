use error_chain::ChainedError;
use nc_news::db;

#[rocket::main]
async fn main() {
    let pool = match db::DbConfig::from_env().and_then(|config| db::init_pool(&config)) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to create database pool: {}", e.display_chain());
            std::process::exit(1);
        }
    };
    if let Err(e) = nc_news::rocket(pool).launch().await {
        eprintln!("Server failed: {}", e);
        std::process::exit(1);
    }
}
