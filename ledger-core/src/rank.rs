//! Rank ladder: named tiers unlocked by cumulative credits.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub name: &'static str,
    pub threshold: u64,
}

/// Strictly increasing thresholds, first entry at 0.
pub const RANKS: &[Rank] = &[
    Rank { name: "INITIATE", threshold: 0 },
    Rank { name: "SPLICER", threshold: 1_000 },
    Rank { name: "DATA BROKER", threshold: 2_500 },
    Rank { name: "FIXER", threshold: 5_000 },
    Rank { name: "NETRUNNER", threshold: 10_000 },
    Rank { name: "CYBER BARON", threshold: 25_000 },
    Rank { name: "SYSTEM ARCHITECT", threshold: 50_000 },
];

/// Highest tier whose threshold does not exceed `score`.
pub fn rank_for(score: u64) -> &'static Rank {
    let idx = RANKS.partition_point(|r| r.threshold <= score);
    // RANKS[0].threshold == 0, so idx >= 1 for every score.
    &RANKS[idx.saturating_sub(1)]
}

pub fn next_rank(score: u64) -> Option<&'static Rank> {
    RANKS.iter().find(|r| r.threshold > score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankProgress {
    pub score: u64,
    pub current: &'static Rank,
    pub next: Option<&'static Rank>,
    /// Credits the progress bar fills towards.
    pub target: u64,
    /// 0..=100
    pub percent: u8,
}

impl RankProgress {
    pub fn for_score(score: u64) -> Self {
        let current = rank_for(score);
        let next = next_rank(score);
        // Past the top tier the bar keeps a moving target of twice the score.
        let target = next.map(|r| r.threshold).unwrap_or(score.saturating_mul(2)).max(1);
        let percent = (score.saturating_mul(100) / target).min(100) as u8;
        Self {
            score,
            current,
            next,
            target,
            percent,
        }
    }

    pub fn next_name(&self) -> &'static str {
        self.next.map(|r| r.name).unwrap_or("MAX LEVEL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_well_formed() {
        assert_eq!(RANKS[0].threshold, 0);
        assert!(RANKS.windows(2).all(|w| w[0].threshold < w[1].threshold));
    }

    #[test]
    fn test_rank_for_boundaries() {
        assert_eq!(rank_for(0).name, "INITIATE");
        assert_eq!(rank_for(999).name, "INITIATE");
        assert_eq!(rank_for(1_000).name, "SPLICER");
        assert_eq!(rank_for(2_499).name, "SPLICER");
        assert_eq!(rank_for(50_000).name, "SYSTEM ARCHITECT");
        assert_eq!(rank_for(u64::MAX).name, "SYSTEM ARCHITECT");
    }

    #[test]
    fn test_rank_is_monotonic() {
        let mut prev = 0;
        for score in (0..60_000).step_by(125) {
            let t = rank_for(score).threshold;
            assert!(t >= prev, "rank threshold dropped at score {score}");
            assert!(t <= score);
            prev = t;
        }
    }

    #[test]
    fn test_progress_towards_next_rank() {
        let p = RankProgress::for_score(950);
        assert_eq!(p.current.name, "INITIATE");
        assert_eq!(p.next_name(), "SPLICER");
        assert_eq!(p.target, 1_000);
        assert_eq!(p.percent, 95);
    }

    #[test]
    fn test_progress_at_top_tier() {
        let p = RankProgress::for_score(60_000);
        assert!(p.next.is_none());
        assert_eq!(p.next_name(), "MAX LEVEL");
        assert_eq!(p.target, 120_000);
        assert_eq!(p.percent, 50);
    }
}
