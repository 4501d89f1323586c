use clap::Subcommand;
use bigtimer_core::{CheckoutReturn, Decision, Plan, Theme, Tier};
use url::Url;

use super::session::open_session;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Show tier, trial and today's usage
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the premium plans
    Plans,
    /// Start a checkout for a plan and print the redirect URL
    Checkout {
        /// monthly, yearly or lifetime
        plan: String,
        /// Open the URL in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Process the location the checkout returned to
    Complete {
        /// Return URL, e.g. http://localhost:8080/?success=true&plan=yearly
        url: String,
    },
    /// Check whether a theme is available to this account
    Theme {
        /// default, ocean-blue, forest-green or galaxy-purple
        name: String,
    },
}

pub fn run(action: AccountAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        AccountAction::Status { json } => {
            let summary = session.gate_mut().summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            println!("User:  {}", summary.user_id);
            match (summary.tier, summary.trial_days_left) {
                (Tier::Premium, _) => println!("Tier:  premium"),
                (Tier::Trial, Some(days)) => println!("Tier:  trial ({days} days left)"),
                (Tier::Trial, None) => println!("Tier:  trial"),
                (Tier::Free, _) => println!("Tier:  free"),
            }
            if let Some(plan) = summary.plan {
                println!("Plan:  {plan}");
            }
            if let Some(meter) = summary.usage {
                println!("{}", meter.label());
            }
        }
        AccountAction::Plans => {
            for plan in Plan::ALL {
                println!("{:<10}{}", plan.as_str(), plan.price_label());
            }
        }
        AccountAction::Checkout { plan, open } => {
            let plan: Plan = plan.parse()?;
            let url = session.begin_checkout(plan)?;
            println!("{url}");
            if open {
                open::that(url.as_str())?;
            }
        }
        AccountAction::Complete { url } => {
            let location = Url::parse(&url)?;
            let (outcome, clean) = session.complete_checkout(&location)?;
            match outcome {
                CheckoutReturn::Success(_) => {}
                CheckoutReturn::Canceled => println!("Checkout canceled. No changes were made."),
                CheckoutReturn::Absent => println!("No checkout result in that location."),
            }
            println!("{clean}");
        }
        AccountAction::Theme { name } => {
            let theme: Theme = serde_json::from_value(serde_json::Value::String(name.clone()))
                .map_err(|_| format!("unknown theme: {name}"))?;
            match session.gate().authorize_theme(theme) {
                Decision::Allow => println!("{} is available", theme.name()),
                Decision::Deny(reason) => {
                    println!("{reason}");
                    std::process::exit(2);
                }
            }
        }
    }
    Ok(())
}
