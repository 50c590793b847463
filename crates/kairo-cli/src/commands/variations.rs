use crate::commands::print_json;
use anyhow::Result;
use clap::Args;
use kairo_core::{DialingRuleTable, VariationGenerator};

#[derive(Debug, Args)]
pub struct VariationsArgs {
    pub phone: String,
}

pub fn print_variations(table: &DialingRuleTable, json: bool, args: VariationsArgs) -> Result<()> {
    let tokens = VariationGenerator::new(table).generate(&args.phone);

    if json {
        print_json(&tokens.as_slice())?;
        return Ok(());
    }

    for token in tokens.iter() {
        println!("{token}");
    }
    Ok(())
}
