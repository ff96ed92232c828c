//! Rating aggregation for cafes.
//!
//! Pure arithmetic only; persistence happens in the review handler, inside
//! the same transaction as the review insert (with a row lock on the cafe)
//! so that concurrent submissions cannot clobber each other's contribution
//! to the cached average.

use crate::entity::review;

/// Round to the nearest integer, with .5 rounding toward positive infinity.
///
/// This matches JavaScript's `Math.round`, which is the contract clients
/// were built against. `f64::round` rounds half away from zero instead,
/// which differs for negative inputs.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Compute the new cafe-level average after inserting one review.
///
/// `existing` holds the overall ratings of every review already stored for
/// the cafe; `new_rating` is the submitted (possibly fractional) overall
/// rating of the review being inserted, rounded half-up before it is
/// weighted in. The result is not rounded.
pub fn recompute_average(existing: &[i32], new_rating: f64) -> f64 {
    let sum: i64 = existing.iter().map(|&r| i64::from(r)).sum();
    let total = sum + i64::from(round_half_up(new_rating));
    total as f64 / (existing.len() + 1) as f64
}

/// Per-dimension averages over a cafe's full review set.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct RatingSummary {
    pub overall: f64,
    pub location: f64,
    pub price: f64,
    pub coffee: f64,
    pub bakery: f64,
}

impl RatingSummary {
    pub const ZERO: RatingSummary = RatingSummary {
        overall: 0.0,
        location: 0.0,
        price: 0.0,
        coffee: 0.0,
        bakery: 0.0,
    };
}

/// Recompute every dimension's average from scratch.
///
/// Side-effect-free and idempotent; used on the read path so the
/// per-dimension averages never live in a denormalized column.
/// All-zero when there are no reviews.
pub fn compute_all_averages(reviews: &[review::Model]) -> RatingSummary {
    if reviews.is_empty() {
        return RatingSummary::ZERO;
    }

    let mut sums = [0i64; 5];
    for r in reviews {
        sums[0] += i64::from(r.overall_rating);
        sums[1] += i64::from(r.location_rating);
        sums[2] += i64::from(r.price_rating);
        sums[3] += i64::from(r.coffee_rating);
        sums[4] += i64::from(r.bakery_rating);
    }

    let count = reviews.len() as f64;
    RatingSummary {
        overall: sums[0] as f64 / count,
        location: sums[1] as f64 / count,
        price: sums[2] as f64 / count,
        coffee: sums[3] as f64 / count,
        bakery: sums[4] as f64 / count,
    }
}
