//! Vendor-buyer compatibility scoring.
//!
//! # Algorithm
//!
//! For every sector the buyer ranks that the vendor also serves:
//!
//! 1. `sector = max(0.1, 1 - 0.1 * priority)`
//! 2. `sub = 1 - Π(1 - sᵢ)` over matching sub-sectors, each normalized the
//!    same way (0 when none match)
//! 3. `composite = 0.4 * sector + 0.4 * sub + 0.2 * product`
//!
//! Composites of all matching sectors are combined with the same
//! probabilistic OR. Tier and breakdown come from the best composite.
//! Without any sector match the pair scores `0.2 * product` (tier 3).
//!
//! The product term is a stable hash of the two IDs mapped into
//! `[0.2, 0.6]`, so scores are reproducible bit for bit.

use crate::models::{Buyer, MatchScore, ScoreBreakdown, SectorPriority, SubSectorPriority, Tier, Vendor};

/// Weight of the sector term.
pub const SECTOR_WEIGHT: f64 = 0.4;
/// Weight of the sub-sector term.
pub const SUB_SECTOR_WEIGHT: f64 = 0.4;
/// Weight of the product term.
pub const PRODUCT_WEIGHT: f64 = 0.2;

const PRIORITY_DECAY: f64 = 0.1;
const PRIORITY_FLOOR: f64 = 0.1;

#[derive(Debug, Clone)]
struct SectorMatch<'a> {
    sector_score: f64,
    sub_sector_score: f64,
    composite: f64,
    tier: Tier,
    sector: &'a str,
    sub_sector: Option<&'a str>,
}

/// Scores one vendor-buyer pair.
///
/// # Example
/// ```
/// use u_meeting::matching::calculate_match_score;
/// use u_meeting::models::{Buyer, SectorPriority, Tier, Vendor};
///
/// let vendor = Vendor::new("V1").with_sector("tech").with_sub_sector("cloud");
/// let buyer = Buyer::new("B1")
///     .with_sector_priority(SectorPriority::new("tech", 1).with_sub_sector("cloud", 1));
///
/// let m = calculate_match_score(&vendor, &buyer);
/// assert_eq!(m.tier, Tier::Tier1);
/// assert!(m.score > 0.7);
/// ```
pub fn calculate_match_score(vendor: &Vendor, buyer: &Buyer) -> MatchScore {
    let product = product_affinity(&vendor.id, &buyer.id);

    let matches: Vec<SectorMatch<'_>> = buyer
        .sector_priorities
        .iter()
        .filter(|sp| vendor.serves_sector(&sp.sector))
        .map(|sp| score_sector(vendor, sp, product))
        .collect();

    let best = matches
        .iter()
        .fold(None::<&SectorMatch<'_>>, |best, m| match best {
            Some(b) if m.composite <= b.composite => Some(b),
            _ => Some(m),
        });

    match best {
        Some(best) => {
            let composites: Vec<f64> = matches.iter().map(|m| m.composite).collect();
            MatchScore {
                score: round3(combine_scores(&composites)),
                tier: best.tier,
                breakdown: ScoreBreakdown {
                    sector_match: best.sector_score,
                    sub_sector_match: best.sub_sector_score,
                    product_match: product,
                },
                matched_sector: Some(best.sector.to_string()),
                matched_sub_sector: best.sub_sector.map(str::to_string),
            }
        }
        None => MatchScore {
            score: round3(PRODUCT_WEIGHT * product),
            tier: Tier::Tier3,
            breakdown: ScoreBreakdown {
                sector_match: 0.0,
                sub_sector_match: 0.0,
                product_match: product,
            },
            matched_sector: None,
            matched_sub_sector: None,
        },
    }
}

/// Deterministic product-affinity placeholder in `[0.2, 0.6]`.
///
/// String hash `h = c + ((h << 5) - h)` over the UTF-16 code units of
/// `vendor_id ++ buyer_id`, reduced mod 100. Only the shifted operand is
/// truncated to 32 bits; the running hash itself is not, so long IDs can
/// leave the `i32` range.
pub fn product_affinity(vendor_id: &str, buyer_id: &str) -> f64 {
    let hash = vendor_id
        .encode_utf16()
        .chain(buyer_id.encode_utf16())
        .fold(0i64, |h, c| {
            let shifted = i64::from((h as i32).wrapping_shl(5));
            i64::from(c).wrapping_add(shifted.wrapping_sub(h))
        });
    let unit = (hash.unsigned_abs() % 100) as f64 / 100.0;
    (unit + 0.2).min(0.6)
}

/// Maps a rank (1 = best) to a score, decaying by 0.1 per rank, floored at 0.1.
pub fn normalize_priority(priority: u32) -> f64 {
    (1.0 - f64::from(priority) * PRIORITY_DECAY).max(PRIORITY_FLOOR)
}

/// Probabilistic OR: `1 - Π(1 - sᵢ)`. Zero for no scores.
pub fn combine_scores(scores: &[f64]) -> f64 {
    match scores {
        [] => 0.0,
        [single] => *single,
        _ => 1.0 - scores.iter().fold(1.0, |acc, s| acc * (1.0 - s)),
    }
}

/// Tier from the sector and sub-sector terms.
pub fn determine_tier(sector_score: f64, sub_sector_score: f64) -> Tier {
    if sub_sector_score > 0.0 {
        Tier::Tier1
    } else if sector_score > 0.0 {
        Tier::Tier2
    } else {
        Tier::Tier3
    }
}

fn score_sector<'a>(vendor: &Vendor, sp: &'a SectorPriority, product: f64) -> SectorMatch<'a> {
    let sector_score = normalize_priority(sp.priority);
    let (sub_sector_score, sub_sector) = score_sub_sectors(&vendor.sub_sectors, &sp.sub_sectors);
    let composite = SECTOR_WEIGHT * sector_score
        + SUB_SECTOR_WEIGHT * sub_sector_score
        + PRODUCT_WEIGHT * product;

    SectorMatch {
        sector_score,
        sub_sector_score,
        composite,
        tier: determine_tier(sector_score, sub_sector_score),
        sector: &sp.sector,
        sub_sector,
    }
}

fn score_sub_sectors<'a>(
    vendor_sub_sectors: &[String],
    ranked: &'a [SubSectorPriority],
) -> (f64, Option<&'a str>) {
    let matched: Vec<&SubSectorPriority> = ranked
        .iter()
        .filter(|ss| vendor_sub_sectors.contains(&ss.sub_sector))
        .collect();

    let scores: Vec<f64> = matched
        .iter()
        .map(|ss| normalize_priority(ss.priority))
        .collect();

    let best = matched
        .iter()
        .zip(&scores)
        .fold(None::<(&SubSectorPriority, f64)>, |best, (ss, &s)| match best {
            Some((_, b)) if s <= b => best,
            _ => Some((*ss, s)),
        });

    (
        combine_scores(&scores),
        best.map(|(ss, _)| ss.sub_sector.as_str()),
    )
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
