use crate::render::ViewModel;

pub const HIGH_CONFIDENCE: u32 = 80;
pub const MODERATE_CONFIDENCE: u32 = 50;

/// One-line report on the view currently on screen.
pub fn run_analysis(view: &ViewModel) -> String {
    let verdict = if view.harmony >= HIGH_CONFIDENCE {
        "High confidence morphology."
    } else if view.harmony >= MODERATE_CONFIDENCE {
        "Moderate confidence morphology."
    } else {
        "Low confidence morphology; measurements sit between species."
    };
    format!(
        "Analysis complete. {} ({}%). {}",
        view.species.label(),
        view.harmony,
        verdict
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements::Measurements;
    use crate::service::{PredictResponse, Probabilities};
    use crate::species::Species;

    fn view_with(p: [f64; 3], species: Species) -> ViewModel {
        ViewModel::build(
            &PredictResponse {
                species,
                probabilities: Probabilities {
                    setosa: p[0],
                    versicolor: p[1],
                    virginica: p[2],
                },
            },
            &Measurements::default(),
        )
    }

    #[test]
    fn test_confidence_bands() {
        let high = run_analysis(&view_with([0.95, 0.05, 0.0], Species::Setosa));
        assert_eq!(high, "Analysis complete. Iris-setosa (95%). High confidence morphology.");

        let moderate = run_analysis(&view_with([0.0, 0.6, 0.4], Species::Versicolor));
        assert!(moderate.ends_with("Moderate confidence morphology."));

        let low = run_analysis(&view_with([0.3, 0.3, 0.4], Species::Virginica));
        assert!(low.contains("Low confidence"));
    }

    #[test]
    fn test_band_edges() {
        assert!(run_analysis(&view_with([0.0, 0.2, 0.8], Species::Virginica)).contains("High"));
        assert!(run_analysis(&view_with([0.0, 0.5, 0.5], Species::Versicolor)).contains("Moderate"));
    }
}
