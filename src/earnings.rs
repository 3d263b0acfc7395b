//! CPM earnings math
//!
//! All money amounts are fixed-point [`Decimal`] values; floating point
//! never touches an amount that can be paid out. Amounts are rounded to
//! two decimal places only at the point of persistence or payout.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Campaign, Submission};

/// Gross earnings for a view count at a CPM rate
///
/// `earnings(views, cpm) = views / 1000 * cpm`, unrounded.
pub fn earnings(views: u64, cpm_rate: Decimal) -> Decimal {
    Decimal::from(views) / Decimal::from(1000) * cpm_rate
}

/// Round an amount to the 2-decimal money precision used for persistence
pub fn to_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Earnings on the views accrued above the payout watermark
///
/// Re-scrapes only ever pay the delta: views already covered by
/// `paid_views` were settled by a prior payout.
pub fn delta_earnings(views: u64, paid_views: u64, cpm_rate: Decimal) -> Decimal {
    earnings(views.saturating_sub(paid_views), cpm_rate)
}

/// Payable amount for a submission under its campaign terms, money-rounded
pub fn payable_amount(submission: &Submission, campaign: &Campaign) -> Decimal {
    to_money(delta_earnings(
        submission.views,
        submission.paid_views,
        campaign.cpm_rate,
    ))
}

/// Gross potential earnings for a submission's current views, money-rounded
///
/// Used for the admin listing; ignores the watermark.
pub fn potential_earnings(submission: &Submission, campaign: &Campaign) -> Decimal {
    to_money(earnings(submission.views, campaign.cpm_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Submission;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn campaign(cpm: &str) -> Campaign {
        Campaign {
            id: "camp-1".to_string(),
            cpm_rate: dec(cpm),
            required_views: 10_000,
            budget: dec("1000"),
            total_spent: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_earnings_basic() {
        assert_eq!(earnings(10_000, dec("0.03")), dec("0.30"));
        assert_eq!(earnings(1_000, dec("0.50")), dec("0.50"));
        assert_eq!(earnings(0, dec("0.03")), Decimal::ZERO);
    }

    #[test]
    fn test_earnings_no_float_drift() {
        // 333 views at 0.03 CPM is 0.00999; exact in fixed point
        assert_eq!(earnings(333, dec("0.03")), dec("0.00999"));
        assert_eq!(to_money(earnings(333, dec("0.03"))), dec("0.01"));
    }

    #[test]
    fn test_delta_earnings() {
        assert_eq!(delta_earnings(40_000, 20_000, dec("0.03")), dec("0.60"));
        assert_eq!(delta_earnings(20_000, 20_000, dec("0.03")), Decimal::ZERO);
        // Watermark above views saturates to zero, never negative
        assert_eq!(delta_earnings(10_000, 20_000, dec("0.03")), Decimal::ZERO);
    }

    #[test]
    fn test_payable_amount() {
        let campaign = campaign("0.03");
        let mut submission = Submission::new(&campaign.id, "clipper-1", "https://t/video/1");
        submission.views = 40_000;
        submission.paid_views = 0;
        assert_eq!(payable_amount(&submission, &campaign), dec("1.20"));

        submission.paid_views = 20_000;
        assert_eq!(payable_amount(&submission, &campaign), dec("0.60"));
    }

    #[test]
    fn test_potential_earnings_ignores_watermark() {
        let campaign = campaign("0.05");
        let mut submission = Submission::new(&campaign.id, "clipper-1", "https://t/video/1");
        submission.views = 22_000;
        submission.paid_views = 20_000;
        assert_eq!(potential_earnings(&submission, &campaign), dec("1.10"));
    }

    #[test]
    fn test_money_rounding() {
        assert_eq!(to_money(dec("0.005")), dec("0.01"));
        assert_eq!(to_money(dec("0.004")), dec("0.00"));
        assert_eq!(to_money(dec("1.239")), dec("1.24"));
    }
}
