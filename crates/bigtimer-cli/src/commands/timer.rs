use clap::Subcommand;
use bigtimer_core::{Decision, StartOutcome};

use super::session::{drive, open_session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Count down from the given duration
    Run {
        /// Hours (0-99)
        #[arg(short = 'H', long, default_value = "0", allow_negative_numbers = true)]
        hours: i64,
        /// Minutes (0-59)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        minutes: i64,
        /// Seconds (0-59)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        seconds: i64,
    },
    /// Report whether a countdown may be started now, without starting one
    Check,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        TimerAction::Run { hours, minutes, seconds } => {
            session.configure_countdown(hours, minutes, seconds);
            match session.start_countdown() {
                StartOutcome::Started | StartOutcome::Resumed | StartOutcome::AlreadyRunning => {}
                StartOutcome::NothingToRun => return Err("nothing to count down".into()),
                // The presenter has already shown the reason.
                StartOutcome::Denied(_) => return Err("timer start denied".into()),
            }
            if let Some(meter) = session.gate_mut().usage_meter() {
                eprintln!("{}", meter.label());
            }
            eprintln!("Enter: pause/resume  r: reset  q: quit");
            drive(&mut session)?;
        }
        TimerAction::Check => match session.gate_mut().authorize_timer_start() {
            Decision::Allow => println!("allowed"),
            Decision::Deny(reason) => {
                println!("denied: {reason}");
                std::process::exit(2);
            }
        },
    }
    Ok(())
}
