use error_chain::ChainedError;
use nc_news::db::{self, seed};

fn run() -> db::Result<()> {
    let config = db::DbConfig::from_env()?;
    let pool = db::init_pool(&config)?;
    let mut connection = pool.get()?;
    let data = seed::SeedData::fixture()?;
    seed::seed(&mut connection, &data)?;
    println!("Seeded {} articles and {} comments", data.articles.len(), data.comments.len());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Seeding failed: {}", e.display_chain());
        std::process::exit(1);
    }
}
