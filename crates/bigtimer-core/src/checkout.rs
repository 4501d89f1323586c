//! Hosted checkout collaborator.
//!
//! Building a checkout session and reading the provider's answer back from
//! the return location. No payment is processed here: a
//! [`CheckoutProvider`] only turns a session into the URL the user is sent
//! to. The return contract is a query string on the configured origin:
//! `success=true&plan=<id>` on success, `canceled=true` on abandonment.

use serde::Serialize;
use url::Url;

use crate::entitlement::{BillingMode, Plan};
use crate::error::CheckoutError;
use crate::storage::CheckoutConfig;

const RETURN_PARAMS: [&str; 3] = ["success", "canceled", "plan"];

/// Everything the provider needs to run one purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSession {
    pub plan: Plan,
    pub price_id: String,
    pub quantity: u32,
    pub mode: BillingMode,
    pub success_url: Url,
    pub cancel_url: Url,
    /// Ties the purchase back to the entitlement record.
    pub client_reference_id: String,
}

impl CheckoutSession {
    pub fn new(plan: Plan, user_id: &str, config: &CheckoutConfig) -> Result<Self, CheckoutError> {
        let price_id = config.prices.for_plan(plan).trim();
        if price_id.is_empty() {
            return Err(CheckoutError::PriceNotConfigured(plan));
        }

        let origin = Url::parse(&config.origin)
            .map_err(|e| CheckoutError::Unavailable(format!("bad origin '{}': {e}", config.origin)))?;

        let mut success_url = origin.clone();
        success_url
            .query_pairs_mut()
            .clear()
            .append_pair("success", "true")
            .append_pair("plan", plan.as_str());

        let mut cancel_url = origin;
        cancel_url
            .query_pairs_mut()
            .clear()
            .append_pair("canceled", "true");

        Ok(Self {
            plan,
            price_id: price_id.to_string(),
            quantity: 1,
            mode: plan.billing_mode(),
            success_url,
            cancel_url,
            client_reference_id: user_id.to_string(),
        })
    }
}

/// Starts a hosted checkout and reports where to send the user.
pub trait CheckoutProvider {
    fn redirect_to_checkout(&self, session: &CheckoutSession) -> Result<Url, CheckoutError>;
}

/// Provider that encodes the session into the hosted checkout URL without
/// contacting anything.
#[derive(Debug, Clone)]
pub struct StubCheckout {
    checkout_url: Url,
    publishable_key: String,
}

impl StubCheckout {
    pub fn from_config(config: &CheckoutConfig) -> Result<Self, CheckoutError> {
        let checkout_url = Url::parse(&config.checkout_url).map_err(|e| {
            CheckoutError::Unavailable(format!("bad checkout url '{}': {e}", config.checkout_url))
        })?;
        Ok(Self {
            checkout_url,
            publishable_key: config.publishable_key.clone(),
        })
    }
}

impl CheckoutProvider for StubCheckout {
    fn redirect_to_checkout(&self, session: &CheckoutSession) -> Result<Url, CheckoutError> {
        if self.publishable_key.trim().is_empty() {
            return Err(CheckoutError::Unavailable(
                "no publishable key configured".to_string(),
            ));
        }
        let mode = match session.mode {
            BillingMode::Subscription => "subscription",
            BillingMode::Payment => "payment",
        };
        let mut url = self.checkout_url.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.publishable_key)
            .append_pair("price", &session.price_id)
            .append_pair("quantity", &session.quantity.to_string())
            .append_pair("mode", mode)
            .append_pair("success_url", session.success_url.as_str())
            .append_pair("cancel_url", session.cancel_url.as_str())
            .append_pair("client_reference_id", &session.client_reference_id);
        Ok(url)
    }
}

/// What the return location says about a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutReturn {
    Success(Plan),
    Canceled,
    /// The location carries no checkout parameters.
    Absent,
}

impl CheckoutReturn {
    /// Read the return contract off a location.
    ///
    /// `success=true` with a missing or unknown plan is an error rather
    /// than a success, so premium is never granted on a malformed signal.
    pub fn from_url(url: &Url) -> Result<Self, CheckoutError> {
        let mut success = false;
        let mut canceled = false;
        let mut plan = None;
        for (key, value) in url.query_pairs() {
            match &*key {
                "success" => success = value == "true",
                "canceled" => canceled = value == "true",
                "plan" => plan = Some(value.into_owned()),
                _ => {}
            }
        }

        if success {
            let raw = plan.ok_or_else(|| {
                CheckoutError::InvalidReturn("success without a plan".to_string())
            })?;
            let plan = raw
                .parse::<Plan>()
                .map_err(|_| CheckoutError::InvalidReturn(format!("unknown plan '{raw}'")))?;
            return Ok(CheckoutReturn::Success(plan));
        }
        if canceled {
            return Ok(CheckoutReturn::Canceled);
        }
        Ok(CheckoutReturn::Absent)
    }
}

/// Remove the checkout return parameters, keeping anything else.
pub fn strip_return_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !RETURN_PARAMS.contains(&&**k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CheckoutConfig {
        CheckoutConfig::default()
    }

    #[test]
    fn session_carries_return_urls() {
        let session = CheckoutSession::new(Plan::Yearly, "user_abc", &config()).unwrap();
        assert_eq!(session.price_id, "price_yearly_id");
        assert_eq!(session.mode, BillingMode::Subscription);
        assert_eq!(
            session.success_url.as_str(),
            "http://localhost:8080/?success=true&plan=yearly"
        );
        assert_eq!(session.cancel_url.as_str(), "http://localhost:8080/?canceled=true");
        assert_eq!(session.client_reference_id, "user_abc");
    }

    #[test]
    fn lifetime_is_a_payment() {
        let session = CheckoutSession::new(Plan::Lifetime, "u", &config()).unwrap();
        assert_eq!(session.mode, BillingMode::Payment);
    }

    #[test]
    fn missing_price_is_reported() {
        let mut cfg = config();
        cfg.prices.monthly = "  ".into();
        assert!(matches!(
            CheckoutSession::new(Plan::Monthly, "u", &cfg),
            Err(CheckoutError::PriceNotConfigured(Plan::Monthly))
        ));
    }

    #[test]
    fn bad_origin_is_reported() {
        let mut cfg = config();
        cfg.origin = "not a url".into();
        assert!(matches!(
            CheckoutSession::new(Plan::Monthly, "u", &cfg),
            Err(CheckoutError::Unavailable(_))
        ));
    }

    #[test]
    fn stub_builds_redirect() {
        let cfg = config();
        let provider = StubCheckout::from_config(&cfg).unwrap();
        let session = CheckoutSession::new(Plan::Monthly, "user_1", &cfg).unwrap();
        let url = provider.redirect_to_checkout(&session).unwrap();
        assert!(url.as_str().starts_with("https://checkout.stripe.com/pay?"));
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["price"], "price_monthly_id");
        assert_eq!(pairs["mode"], "subscription");
        assert_eq!(pairs["client_reference_id"], "user_1");
        assert_eq!(pairs["success_url"], session.success_url.as_str());
    }

    #[test]
    fn stub_without_key_is_unavailable() {
        let mut cfg = config();
        cfg.publishable_key.clear();
        let provider = StubCheckout::from_config(&cfg).unwrap();
        let session = CheckoutSession::new(Plan::Monthly, "u", &cfg).unwrap();
        assert!(matches!(
            provider.redirect_to_checkout(&session),
            Err(CheckoutError::Unavailable(_))
        ));
    }

    #[test]
    fn parses_return_contract() {
        let ok = Url::parse("http://localhost:8080/?success=true&plan=lifetime").unwrap();
        assert_eq!(CheckoutReturn::from_url(&ok).unwrap(), CheckoutReturn::Success(Plan::Lifetime));

        let canceled = Url::parse("http://localhost:8080/?canceled=true").unwrap();
        assert_eq!(CheckoutReturn::from_url(&canceled).unwrap(), CheckoutReturn::Canceled);

        let plain = Url::parse("http://localhost:8080/?ref=news").unwrap();
        assert_eq!(CheckoutReturn::from_url(&plain).unwrap(), CheckoutReturn::Absent);
    }

    #[test]
    fn malformed_success_is_rejected() {
        for raw in [
            "http://localhost:8080/?success=true",
            "http://localhost:8080/?success=true&plan=weekly",
        ] {
            let url = Url::parse(raw).unwrap();
            assert!(matches!(
                CheckoutReturn::from_url(&url),
                Err(CheckoutError::InvalidReturn(_))
            ));
        }
    }

    #[test]
    fn strips_only_return_params() {
        let url = Url::parse("http://localhost:8080/app?success=true&plan=yearly&ref=news").unwrap();
        assert_eq!(strip_return_params(&url).as_str(), "http://localhost:8080/app?ref=news");

        let url = Url::parse("http://localhost:8080/app?canceled=true").unwrap();
        assert_eq!(strip_return_params(&url).as_str(), "http://localhost:8080/app");
    }
}
