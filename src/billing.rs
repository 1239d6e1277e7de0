//! Plans, clinic subscriptions and the upgrade-only plan gating policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription status considered active.
pub const STATUS_SUCCESS: &str = "success";

/// Status written to a previously active subscription once a newer one
/// replaces it.
pub const STATUS_SUPERSEDED: &str = "superseded";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub billing_cycle: BillingCycle,
    pub booking_limit: i64,
    /// Price in currency minor units.
    pub price_minor: i64,
    pub is_trial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub plan_id: Uuid,
    pub booking_limit: i64,
    pub remaining_booking_limit: i64,
    pub expiry_date: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Active means paid-up and unexpired. A clinic has at most one such
    /// subscription at a time.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == STATUS_SUCCESS && self.expiry_date > now
    }
}

/// A catalog plan annotated with whether the clinic may select it now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOption {
    pub plan: Plan,
    pub selectable: bool,
}

/// The gated catalog, partitioned by billing cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatedCatalog {
    pub monthly: Vec<PlanOption>,
    pub yearly: Vec<PlanOption>,
}

/// Decide which plans a clinic may select next.
///
/// 1. No active subscription: everything is selectable.
/// 2. Active but quota exhausted (`remaining_booking_limit == 0`):
///    everything is selectable again; an exhausted clinic re-ups freely.
/// 3. Active with remaining quota: the current plan and every plan at or
///    below its capacity are disabled; only strictly higher-capacity plans
///    stay selectable (upgrade-only while quota remains).
pub fn gate_plans(
    catalog: &[Plan],
    subscription: Option<&Subscription>,
    now: DateTime<Utc>,
) -> GatedCatalog {
    let active = subscription.filter(|s| s.is_active(now));

    let selectable = |plan: &Plan| -> bool {
        match active {
            None => true,
            Some(current) if current.remaining_booking_limit == 0 => true,
            Some(current) => {
                plan.id != current.plan_id && plan.booking_limit > current.booking_limit
            }
        }
    };

    let mut monthly = Vec::new();
    let mut yearly = Vec::new();
    for plan in catalog {
        let option = PlanOption {
            plan: plan.clone(),
            selectable: selectable(plan),
        };
        match plan.billing_cycle {
            BillingCycle::Monthly => monthly.push(option),
            BillingCycle::Yearly => yearly.push(option),
        }
    }

    GatedCatalog { monthly, yearly }
}
