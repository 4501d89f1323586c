//! Wiring shared by the interactive commands: opening a session against
//! the on-disk store and driving it from the terminal.

use std::error::Error;
use std::io::Write;
use std::time::Duration;

use bigtimer_core::{
    BigTimer, Config, Database, EntitlementGate, Lap, Plan, Presenter, StubCheckout, SystemClock,
    TimerEngine, TimerMode, WallClockScheduler,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

pub type CliSession = BigTimer<WallClockScheduler, TerminalPresenter>;

/// How often the scheduler is polled for due ticks.
const POLL: Duration = Duration::from_millis(100);

/// Renders session callbacks as terminal output.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    redraw: bool,
    finished: bool,
}

impl TerminalPresenter {
    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl Presenter for TerminalPresenter {
    fn on_tick(&mut self, _mode: TimerMode, _value: u64) {
        self.redraw = true;
    }

    fn on_finished(&mut self) {
        self.finished = true;
    }

    fn on_lap_recorded(&mut self, lap: &Lap) {
        println!("\r{}  {}", lap.label(), lap.display());
    }

    fn on_authorization_denied(&mut self, reason: &str) {
        eprintln!("{reason}");
        eprintln!("Upgrade with `bigtimer account checkout <monthly|yearly|lifetime>`.");
    }

    fn on_premium_activated(&mut self, plan: Plan) {
        println!("Premium activated ({plan}). Enjoy unlimited timers.");
    }
}

pub fn open_session() -> Result<CliSession, Box<dyn Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let gate = EntitlementGate::load(Box::new(db), Box::new(SystemClock), config.gate.clone());
    debug!(user_id = %gate.record().user_id, tier = ?gate.tier(), "session opened");
    let checkout = StubCheckout::from_config(&config.checkout)?;
    Ok(BigTimer::new(
        TimerEngine::new(WallClockScheduler::new()),
        gate,
        TerminalPresenter::default(),
        Box::new(checkout),
        config.checkout,
    ))
}

fn face(session: &CliSession, mode: TimerMode) -> String {
    match mode {
        TimerMode::Countdown => session.engine().countdown_display(),
        TimerMode::Stopwatch => session.engine().stopwatch_display(),
    }
}

fn draw(session: &CliSession, mode: TimerMode) {
    print!("\r{}   ", face(session, mode));
    let _ = std::io::stdout().flush();
}

/// Run the visible sub-timer until it finishes, `q` is entered or Ctrl-C
/// arrives. Enter toggles start/pause, `l` records a lap, `r` resets.
pub fn drive(session: &mut CliSession) -> Result<(), Box<dyn Error>> {
    let mode = session.visible_mode();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut interval = tokio::time::interval(POLL);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        draw(session, mode);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    session.pump();
                    if std::mem::take(&mut session.presenter_mut().redraw) {
                        draw(session, mode);
                    }
                    if session.presenter().finished() {
                        println!("\nTime's up!\x07");
                        break;
                    }
                }
                line = lines.next_line(), if stdin_open => {
                    match line? {
                        Some(input) => match input.trim() {
                            "" => {
                                session.toggle_visible();
                            }
                            "l" => {
                                if mode == TimerMode::Stopwatch && session.record_lap().is_none() {
                                    eprintln!("start the stopwatch to record laps");
                                }
                            }
                            "r" => match mode {
                                TimerMode::Countdown => session.reset_countdown(),
                                TimerMode::Stopwatch => session.reset_stopwatch(),
                            },
                            "q" => break,
                            other => eprintln!("unknown input '{other}' (Enter, l, r, q)"),
                        },
                        None => stdin_open = false,
                    }
                    draw(session, mode);
                }
                _ = &mut ctrl_c => break,
            }
        }
        Ok::<(), Box<dyn Error>>(())
    })?;

    if !session.presenter().finished() {
        println!("\nStopped at {}", face(session, mode));
    }
    Ok(())
}
