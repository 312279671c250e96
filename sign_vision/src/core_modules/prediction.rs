use crate::error::{Result, VisionError};

/// The top-scoring class of a single classifier run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class_id: usize,
    /// Raw score of `class_id`, usually a softmax probability in `[0, 1]`.
    pub score: f32,
}

impl Prediction {
    /// Argmax over `scores`. Ties go to the lowest index; NaN is never selected.
    pub fn from_scores(scores: &[f32]) -> Result<Self> {
        let mut best: Option<Prediction> = None;
        for (class_id, &score) in scores.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some(current) if score <= current.score => {}
                _ => best = Some(Prediction { class_id, score }),
            }
        }
        best.ok_or(VisionError::EmptyScores)
    }

    pub fn confidence_percent(&self) -> f32 {
        self.score * 100.0
    }

    /// Confidence with two decimals, e.g. `85.00%`.
    pub fn format_confidence(&self) -> String {
        format!("{:.2}%", self.confidence_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_index_of_maximum() {
        let p = Prediction::from_scores(&[0.1, 0.85, 0.05]).expect("non-empty");
        assert_eq!(p.class_id, 1);
        assert_eq!(p.format_confidence(), "85.00%");
    }

    #[test]
    fn ties_resolve_to_first_index() {
        let p = Prediction::from_scores(&[0.2, 0.4, 0.4]).expect("non-empty");
        assert_eq!(p.class_id, 1);
    }

    #[test]
    fn nan_scores_are_skipped() {
        let p = Prediction::from_scores(&[f32::NAN, 0.3, f32::NAN]).expect("has a number");
        assert_eq!(p.class_id, 1);
    }

    #[test]
    fn negative_scores_still_have_a_maximum() {
        let p = Prediction::from_scores(&[-3.0, -0.5, -1.0]).expect("non-empty");
        assert_eq!(p.class_id, 1);
    }

    #[test]
    fn empty_or_all_nan_is_an_error() {
        assert!(matches!(Prediction::from_scores(&[]), Err(VisionError::EmptyScores)));
        assert!(matches!(
            Prediction::from_scores(&[f32::NAN]),
            Err(VisionError::EmptyScores)
        ));
    }

    #[test]
    fn confidence_is_rounded_to_two_decimals() {
        let p = Prediction { class_id: 0, score: 0.123456 };
        assert_eq!(p.format_confidence(), "12.35%");
    }
}
