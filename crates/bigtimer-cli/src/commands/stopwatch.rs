use clap::Subcommand;
use bigtimer_core::TimerMode;

use super::session::{drive, open_session};

#[derive(Subcommand)]
pub enum StopwatchAction {
    /// Start the stopwatch. Enter pauses/resumes, `l` records a lap
    Run,
}

pub fn run(action: StopwatchAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        StopwatchAction::Run => {
            session.switch_mode(TimerMode::Stopwatch);
            session.start_stopwatch();
            eprintln!("Enter: pause/resume  l: lap  r: reset  q: quit");
            drive(&mut session)?;

            let laps = session.engine().stopwatch().laps();
            if !laps.is_empty() {
                println!("{} laps:", laps.len());
                for lap in laps {
                    println!("  {:<8}{}", lap.label(), lap.display());
                }
            }
        }
    }
    Ok(())
}
