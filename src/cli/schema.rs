use crate::schema::SchemaBatch;

pub fn run_schema() -> anyhow::Result<()> {
    let batch = SchemaBatch::portfolio();
    println!("-- {}", batch.summary());
    print!("{}", batch.to_script());
    Ok(())
}
