use crate::domain::candidate::TickerCandidate;

/// Highest-volume candidates first, truncated to `n`.
///
/// The sort is stable: equal volumes keep their input order. Symbols are not de-duplicated;
/// merging listed and OTC sources is the caller's concern.
pub fn select_top_n(mut candidates: Vec<TickerCandidate>, n: usize) -> Vec<TickerCandidate> {
    candidates.sort_by(|a, b| b.volume.cmp(&a.volume));
    candidates.truncate(n);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(symbol: &str, volume: u64) -> TickerCandidate {
        TickerCandidate::new(symbol, volume)
    }

    fn symbols(v: &[TickerCandidate]) -> Vec<&str> {
        v.iter().map(|c| c.symbol.as_str()).collect()
    }

    #[test]
    fn orders_by_volume_and_truncates() {
        let out = select_top_n(
            vec![c("A.TW", 10), c("B.TW", 30), c("C.TWO", 20), c("D.TW", 5)],
            3,
        );
        assert_eq!(symbols(&out), vec!["B.TW", "C.TWO", "A.TW"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let out = select_top_n(
            vec![c("A.TW", 10), c("B.TW", 20), c("C.TW", 10), c("D.TW", 20)],
            4,
        );
        assert_eq!(symbols(&out), vec!["B.TW", "D.TW", "A.TW", "C.TW"]);
    }

    #[test]
    fn n_larger_than_input_returns_everything() {
        let out = select_top_n(vec![c("A.TW", 1), c("B.TW", 2)], 10);
        assert_eq!(out.len(), 2);
        assert!(select_top_n(Vec::new(), 3).is_empty());
        assert!(select_top_n(vec![c("A.TW", 1)], 0).is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let out = select_top_n(vec![c("5871.TW", 7), c("5871.TW", 7)], 5);
        assert_eq!(symbols(&out), vec!["5871.TW", "5871.TW"]);
    }
}
