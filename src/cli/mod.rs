mod provision;
mod schema;
mod verify;

pub use provision::run_provision;
pub use schema::run_schema;
pub use verify::run_verify;

use crate::rest::TableStatus;

pub(crate) fn print_table_status(table: &str, status: &TableStatus) {
    match status {
        TableStatus::Readable { sampled } => {
            let rows = if *sampled == 1 { "row" } else { "rows" };
            println!("  ok       {table} ({sampled} {rows} sampled)");
        }
        TableStatus::Unreadable { reason } => {
            println!("  missing  {table}: {reason}");
        }
    }
}
