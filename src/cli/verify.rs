use crate::config::ProvisionConfig;
use crate::provision::verify;
use crate::rest::RestClient;

use super::print_table_status;

pub fn run_verify() -> anyhow::Result<()> {
    let config = ProvisionConfig::from_env()?;
    let rest = RestClient::new(&config)?;

    println!("Checking tables on {}", config.base_url);
    let verification = verify(&rest);
    for (table, status) in &verification.tables {
        print_table_status(table, status);
    }

    let unreadable = verification
        .tables
        .iter()
        .filter(|(_, status)| !status.is_readable())
        .count();
    if unreadable > 0 {
        anyhow::bail!("{unreadable} of {} tables are not readable", verification.tables.len());
    }

    println!("All tables are readable.");
    Ok(())
}
