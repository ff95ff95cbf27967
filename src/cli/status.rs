use crate::db::get_connection;
use crate::error::Result;
use crate::settings::{load_settings, settings_file_exists, settings_path};
use crate::store::SqliteStore;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    let note = if settings_file_exists() { "" } else { " (not created, using defaults)" };
    println!("Settings:   {}{note}", settings_path().display());
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("People:     {}", settings.people.join(", "));
    println!("Categories: {}", settings.categories.join(", "));
    println!("Currency:   {}", settings.currency);
    if let Some(merchants) = &settings.import.merchant_allow_list {
        println!(
            "Merchants:  {} \u{2192} {}",
            merchants.join(", "),
            settings.import.merchant_category
        );
    }

    if db_path.exists() {
        let store = SqliteStore::new(get_connection(&db_path)?);
        println!();
        println!("Expenses:   {}", store.count()?);
    } else {
        println!();
        println!("Database not found. Run `splitbook init` to set up.");
    }

    Ok(())
}
