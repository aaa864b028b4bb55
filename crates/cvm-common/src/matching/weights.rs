use crate::error::MatchError;

/// Fixed heuristic weights.
/// Technical coverage dominates; ATS keywords act as a secondary technical
/// signal; experience, education and soft skills round out the score.
pub const DEFAULT_WEIGHTS: Weights = Weights {
    technical: 0.45,
    ats: 0.20,
    experience: 0.15,
    education: 0.10,
    soft: 0.10,
};

#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub technical: f64,
    pub ats: f64,
    pub experience: f64,
    pub education: f64,
    pub soft: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.technical + self.ats + self.experience + self.education + self.soft
    }

    /// Weights must form a convex combination so the weighted component sum
    /// stays in [0,1].
    pub fn validate(&self) -> Result<(), MatchError> {
        if (self.sum() - 1.0).abs() > 1e-6 {
            return Err(MatchError::InvalidWeights(format!(
                "weights sum to {:.6}, expected 1.0",
                self.sum()
            )));
        }
        Ok(())
    }
}

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-6);
        assert!(DEFAULT_WEIGHTS.validate().is_ok());
    }

    #[test]
    fn unbalanced_weights_are_rejected() {
        let bad = Weights {
            technical: 0.9,
            ..DEFAULT_WEIGHTS
        };
        assert!(bad.validate().is_err());
    }
}
