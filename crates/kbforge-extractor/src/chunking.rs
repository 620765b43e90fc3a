//! Span planning for token sequences longer than the model context

use kbforge_domain::SpanBoundary;

/// Ordered span windows for one item plus their shared overlap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanPlan {
    /// Windows in sequence order
    pub boundaries: Vec<SpanBoundary>,

    /// Tokens shared by consecutive windows
    pub overlap: usize,
}

impl SpanPlan {
    /// Number of windows
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// True if the plan has no windows (never the case for `plan_spans`)
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

/// Split `num_tokens` tokens into overlapping windows of `span_length`
///
/// A sequence that fits in one window (including an empty one) yields the
/// single boundary `[0, num_tokens)`. Otherwise `ceil(N / L)` windows of width
/// exactly `L` are spread evenly with a shared overlap; the last window may end
/// past `num_tokens`, so callers clip before slicing.
///
/// # Examples
///
/// ```
/// use kbforge_extractor::plan_spans;
///
/// let plan = plan_spans(300, 128);
/// assert_eq!(plan.overlap, 42);
/// assert_eq!(plan.boundaries[1].start, 86);
/// ```
pub fn plan_spans(num_tokens: usize, span_length: usize) -> SpanPlan {
    // A zero-width window cannot make progress
    let span_length = span_length.max(1);
    let num_spans = num_tokens.div_ceil(span_length);

    if num_spans <= 1 {
        return SpanPlan {
            boundaries: vec![SpanBoundary::new(0, num_tokens)],
            overlap: 0,
        };
    }

    // Rounded down so the last window always reaches num_tokens
    let overlap = (num_spans * span_length - num_tokens) / (num_spans - 1);
    let stride = span_length - overlap;

    let boundaries = (0..num_spans)
        .map(|i| {
            let start = i * stride;
            SpanBoundary::new(start, start + span_length)
        })
        .collect();

    SpanPlan { boundaries, overlap }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_sequence_is_single_span() {
        let plan = plan_spans(50, 128);
        assert_eq!(plan.boundaries, vec![SpanBoundary::new(0, 50)]);
        assert_eq!(plan.overlap, 0);
    }

    #[test]
    fn test_exact_fit_is_single_span() {
        let plan = plan_spans(128, 128);
        assert_eq!(plan.boundaries, vec![SpanBoundary::new(0, 128)]);
        assert_eq!(plan.overlap, 0);
    }

    #[test]
    fn test_empty_sequence() {
        let plan = plan_spans(0, 128);
        assert_eq!(plan.boundaries, vec![SpanBoundary::new(0, 0)]);
        assert_eq!(plan.overlap, 0);
        assert!(plan.boundaries[0].is_empty());
    }

    #[test]
    fn test_two_spans() {
        // ceil(200 / 128) = 2, overlap = 256 - 200 = 56
        let plan = plan_spans(200, 128);
        assert_eq!(
            plan.boundaries,
            vec![SpanBoundary::new(0, 128), SpanBoundary::new(72, 200)]
        );
        assert_eq!(plan.overlap, 56);
    }

    #[test]
    fn test_three_spans_even_overlap() {
        let plan = plan_spans(300, 128);
        assert_eq!(plan.overlap, 42);
        assert_eq!(
            plan.boundaries,
            vec![
                SpanBoundary::new(0, 128),
                SpanBoundary::new(86, 214),
                SpanBoundary::new(172, 300),
            ]
        );
    }

    #[test]
    fn test_overlap_rounds_down_to_cover_tail() {
        // (3 * 128 - 301) / 2 = 41.5; rounding up to 42 would stop the last
        // window at 300 and leave token 300 uncovered
        let plan = plan_spans(301, 128);
        assert_eq!(plan.overlap, 41);
        assert_eq!(
            plan.boundaries,
            vec![
                SpanBoundary::new(0, 128),
                SpanBoundary::new(87, 215),
                SpanBoundary::new(174, 302),
            ]
        );
        assert_eq!(plan.boundaries[2].clip(301), 174..301);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(plan_spans(1000, 128), plan_spans(1000, 128));
    }

    proptest! {
        #[test]
        fn prop_short_sequences_single_span(l in 1usize..512, n_frac in 0usize..=100) {
            let n = l * n_frac / 100;
            let plan = plan_spans(n, l);
            prop_assert_eq!(plan.boundaries, vec![SpanBoundary::new(0, n)]);
            prop_assert_eq!(plan.overlap, 0);
        }

        #[test]
        fn prop_long_sequences_are_covered(l in 1usize..256, extra in 1usize..4000) {
            let n = l + extra;
            let plan = plan_spans(n, l);

            prop_assert_eq!(plan.len(), n.div_ceil(l));
            prop_assert_eq!(plan.boundaries[0].start, 0);
            prop_assert!(plan.overlap < l);

            for pair in plan.boundaries.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].start + l - plan.overlap);
                // No gap between consecutive windows
                prop_assert!(pair[1].start <= pair[0].end);
            }
            for boundary in &plan.boundaries {
                prop_assert_eq!(boundary.len(), l);
            }
            let last = plan.boundaries[plan.len() - 1];
            prop_assert!(last.end >= n);
        }
    }
}
