//! View model for an applied prediction and the sinks that display it.

use serde::{Deserialize, Serialize};

use crate::measurements::Measurements;
use crate::service::{PredictResponse, Probabilities};
use crate::species::Species;

mod terminal;

pub use terminal::TerminalRenderer;

/// Alpha suffix appended to a species color for the radar fill.
pub const RADAR_FILL_ALPHA: &str = "55";
/// Mesh growth per centimetre of the driving measurement.
pub const MESH_SCALE_PER_CM: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarDataset {
    pub data: [f64; 4],
    pub border_color: String,
    pub fill_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshState {
    pub scale: [f64; 3],
    pub color: String,
}

/// Everything visible after a result is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub species: Species,
    pub title: String,
    pub title_color: String,
    pub hud_name: String,
    pub harmony: u32,
    pub probabilities: Probabilities,
    pub radar: RadarDataset,
    pub mesh: MeshState,
    pub input: Measurements,
}

impl ViewModel {
    pub fn build(response: &PredictResponse, input: &Measurements) -> Self {
        let species = response.species;
        let color = species.color().to_string();
        Self {
            species,
            title: species.short_name().to_string(),
            title_color: color.clone(),
            hud_name: species.label().to_uppercase(),
            harmony: (response.probabilities.max() * 100.0).round().clamp(0.0, 100.0) as u32,
            probabilities: response.probabilities,
            radar: RadarDataset {
                data: species.profile(),
                border_color: color.clone(),
                fill_color: format!("{}{}", color, RADAR_FILL_ALPHA),
            },
            mesh: MeshState {
                scale: [
                    1.0 + input.petal_length * MESH_SCALE_PER_CM,
                    1.0 + input.sepal_width * MESH_SCALE_PER_CM,
                    1.0 + input.petal_width * MESH_SCALE_PER_CM,
                ],
                color,
            },
            input: *input,
        }
    }

    /// Probability bars in backend class order with their fixed colors.
    pub fn bars(&self) -> [(Species, f64, &'static str); 3] {
        Species::ALL.map(|s| (s, self.probabilities.get(s), s.color()))
    }
}

pub trait Renderer: Send {
    fn render(&mut self, view: &ViewModel);
}

/// Keeps the last applied view; the console reads it for archive and
/// analysis commands.
#[derive(Debug, Default, Clone)]
pub struct ViewState {
    current: Option<ViewModel>,
    applied: u64,
}

impl ViewState {
    pub fn current(&self) -> Option<&ViewModel> {
        self.current.as_ref()
    }

    /// Number of results applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

impl Renderer for ViewState {
    fn render(&mut self, view: &ViewModel) {
        self.current = Some(view.clone());
        self.applied += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(species: Species, p: [f64; 3]) -> PredictResponse {
        PredictResponse {
            species,
            probabilities: Probabilities {
                setosa: p[0],
                versicolor: p[1],
                virginica: p[2],
            },
        }
    }

    #[test]
    fn test_view_text_fields() {
        let view = ViewModel::build(&response(Species::Versicolor, [0.02, 0.874, 0.106]), &Measurements::default());
        assert_eq!(view.title, "versicolor");
        assert_eq!(view.title_color, "#7a3cff");
        assert_eq!(view.hud_name, "IRIS-VERSICOLOR");
        assert_eq!(view.harmony, 87);
    }

    #[test]
    fn test_radar_uses_species_profile_and_alpha() {
        let view = ViewModel::build(&response(Species::Virginica, [0.0, 0.2, 0.8]), &Measurements::default());
        assert_eq!(view.radar.data, [6.59, 2.97, 5.55, 2.03]);
        assert_eq!(view.radar.border_color, "#ff2e88");
        assert_eq!(view.radar.fill_color, "#ff2e8855");
    }

    #[test]
    fn test_mesh_scale_from_input() {
        let input = Measurements {
            sepal_length: 6.0,
            sepal_width: 3.0,
            petal_length: 4.0,
            petal_width: 2.0,
        };
        let view = ViewModel::build(&response(Species::Setosa, [1.0, 0.0, 0.0]), &input);
        let expect = [1.2, 1.15, 1.1];
        for (got, want) in view.mesh.scale.iter().zip(expect) {
            assert!((got - want).abs() < 1e-12, "{} vs {}", got, want);
        }
        assert_eq!(view.mesh.color, "#00f2ff");
        assert_eq!(view.harmony, 100);
    }

    #[test]
    fn test_bars_keep_class_order() {
        let view = ViewModel::build(&response(Species::Setosa, [0.7, 0.2, 0.1]), &Measurements::default());
        let bars = view.bars();
        assert_eq!(bars[0], (Species::Setosa, 0.7, "#00f2ff"));
        assert_eq!(bars[2].1, 0.1);
    }

    #[test]
    fn test_view_state_counts_applies() {
        let mut state = ViewState::default();
        assert!(state.current().is_none());
        let view = ViewModel::build(&response(Species::Setosa, [0.9, 0.1, 0.0]), &Measurements::default());
        state.render(&view);
        state.render(&view);
        assert_eq!(state.applied(), 2);
        assert_eq!(state.current(), Some(&view));
    }
}
