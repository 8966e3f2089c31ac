use adf_costs::cli;

pub fn main() -> anyhow::Result<()> {
    cli::process_command()
}
