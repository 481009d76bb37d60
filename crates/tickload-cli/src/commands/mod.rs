mod run;
mod show;

use serde_json::Value;
use tickload_warehouse::Warehouse;

use crate::cli::{Cli, Command};
use crate::config;
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    match &cli.command {
        Command::Run(args) => run::run(args, open_warehouse(cli)?).await,
        Command::Show(args) => show::run(args, &open_warehouse(cli)?),
    }
}

fn open_warehouse(cli: &Cli) -> Result<Warehouse, CliError> {
    Ok(Warehouse::open(config::warehouse_config(cli.db.as_deref()))?)
}
