use clap::Args;
use bigtimer_core::format_duration;

#[derive(Args)]
pub struct FormatArgs {
    /// Duration in whole seconds
    seconds: u64,
    /// Always show the hour field
    #[arg(long, conflicts_with = "no_hours")]
    hours: bool,
    /// Never show the hour field; minutes run past 59
    #[arg(long)]
    no_hours: bool,
}

pub fn run(args: FormatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let show_hours = match (args.hours, args.no_hours) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    println!("{}", format_duration(args.seconds, show_hours));
    Ok(())
}
