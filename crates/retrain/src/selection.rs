use argus_core::CompositeScore;

/// Index of the candidate to promote, if any beats the active score
///
/// The best candidate is the one with the lowest composite score; it is
/// accepted only when strictly lower than `active`. Ties keep the active
/// model, and NaN scores never win.
pub fn select_candidate(active: CompositeScore, candidates: &[CompositeScore]) -> Option<usize> {
    let best = candidates
        .iter()
        .enumerate()
        .filter(|(_, score)| !score.value().is_nan())
        .min_by(|(_, a), (_, b)| a.value().total_cmp(&b.value()))?;

    best.1.is_better_than(active).then_some(best.0)
}
