//! Plan catalog, account tiers and premium themes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// Purchasable premium plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Yearly,
    Lifetime,
}

/// How the checkout provider should bill a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingMode {
    Subscription,
    Payment,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Monthly, Plan::Yearly, Plan::Lifetime];

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
            Plan::Lifetime => "lifetime",
        }
    }

    pub fn price_cents(self) -> u32 {
        match self {
            Plan::Monthly => 499,
            Plan::Yearly => 3999,
            Plan::Lifetime => 7999,
        }
    }

    /// Price as shown on the pricing card, e.g. `$39.99/year`.
    pub fn price_label(self) -> String {
        let cents = self.price_cents();
        let suffix = match self {
            Plan::Monthly => "/month",
            Plan::Yearly => "/year",
            Plan::Lifetime => " once",
        };
        format!("${}.{:02}{suffix}", cents / 100, cents % 100)
    }

    /// Lifetime is a one-off payment, the rest are recurring.
    pub fn billing_mode(self) -> BillingMode {
        match self {
            Plan::Lifetime => BillingMode::Payment,
            Plan::Monthly | Plan::Yearly => BillingMode::Subscription,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Plan::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CheckoutError::UnknownPlan(s.to_string()))
    }
}

/// Account standing, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Premium,
    Trial,
    Free,
}

impl Tier {
    /// Premium and trial users are not subject to any limit.
    pub fn is_unrestricted(self) -> bool {
        !matches!(self, Tier::Free)
    }
}

/// Display themes. Only `Default` is available on the free tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Default,
    OceanBlue,
    ForestGreen,
    GalaxyPurple,
}

impl Theme {
    pub const ALL: [Theme; 4] = [
        Theme::Default,
        Theme::OceanBlue,
        Theme::ForestGreen,
        Theme::GalaxyPurple,
    ];

    pub fn is_premium(self) -> bool {
        self != Theme::Default
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Default => "Default",
            Theme::OceanBlue => "Ocean Blue",
            Theme::ForestGreen => "Forest Green",
            Theme::GalaxyPurple => "Galaxy Purple",
        }
    }
}
