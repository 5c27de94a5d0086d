use orgdesk_core::DomainError;
use orgdesk_tenancy::SubscriptionTier;

/// Price of one subscription period, in minor currency units.
pub fn tier_price(tier: SubscriptionTier) -> i64 {
    match tier {
        SubscriptionTier::Basic => 100_000,
        SubscriptionTier::Standard => 250_000,
        SubscriptionTier::Premium => 500_000,
        SubscriptionTier::Enterprise => 1_000_000,
    }
}

/// Parse a client-supplied tier name (case-insensitive).
pub fn parse_tier(raw: &str) -> Result<SubscriptionTier, DomainError> {
    raw.trim().to_ascii_uppercase().parse()
}
