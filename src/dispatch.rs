//! Request dispatch: one prediction call per input change, results filtered
//! through the [`StaleGuard`] before they reach the view.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::{AbortHandle, JoinHandle};

use crate::guard::{RequestToken, StaleGuard};
use crate::logging::{log_dispatch, log_outcome, params_hash};
use crate::measurements::Measurements;
use crate::render::{Renderer, ViewModel};
use crate::service::PredictionService;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Latest request; its result is now on screen.
    Applied(RequestToken),
    /// A newer request was issued before this one completed.
    Superseded(RequestToken),
    /// Latest request, but the call failed. The view is unchanged.
    Failed(RequestToken, String),
}

impl DispatchOutcome {
    pub fn token(&self) -> RequestToken {
        match self {
            DispatchOutcome::Applied(t) | DispatchOutcome::Superseded(t) | DispatchOutcome::Failed(t, _) => *t,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied(_))
    }

    fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Applied(_) => "applied",
            DispatchOutcome::Superseded(_) => "superseded",
            DispatchOutcome::Failed(..) => "failed",
        }
    }
}

/// Pending request. Dropping it does not cancel the call.
pub struct DispatchHandle {
    token: RequestToken,
    task: JoinHandle<DispatchOutcome>,
}

impl DispatchHandle {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn outcome(self) -> DispatchOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            // only a newer dispatch aborts a task
            Err(err) if err.is_cancelled() => DispatchOutcome::Superseded(self.token),
            Err(err) => DispatchOutcome::Failed(self.token, err.to_string()),
        }
    }
}

pub struct Dispatcher<R: Renderer + 'static> {
    guard: Arc<StaleGuard>,
    service: Arc<dyn PredictionService>,
    view: Arc<Mutex<R>>,
    cancel_superseded: bool,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl<R: Renderer + 'static> Dispatcher<R> {
    pub fn new(service: Arc<dyn PredictionService>, view: Arc<Mutex<R>>) -> Self {
        Self {
            guard: Arc::new(StaleGuard::new()),
            service,
            view,
            cancel_superseded: false,
            in_flight: Mutex::new(None),
        }
    }

    /// Abort the previous in-flight call on every new dispatch instead of
    /// letting it finish and be discarded.
    pub fn cancel_superseded(mut self, enabled: bool) -> Self {
        self.cancel_superseded = enabled;
        self
    }

    pub fn guard(&self) -> &StaleGuard {
        &self.guard
    }

    pub fn view(&self) -> &Arc<Mutex<R>> {
        &self.view
    }

    /// Issues a token and starts the prediction call for `input`. Returns
    /// without waiting. Must be called from within a tokio runtime.
    pub fn dispatch(&self, input: Measurements) -> DispatchHandle {
        let token = self.guard.next_token();
        log_dispatch(token.value(), &params_hash(&input.key()));

        let guard = self.guard.clone();
        let service = self.service.clone();
        let view = self.view.clone();
        let task = tokio::spawn(async move {
            let started = Instant::now();
            let result = service.predict(&input).await;
            let outcome = complete(&guard, &view, token, &input, result);
            let reason = match &outcome {
                DispatchOutcome::Failed(_, reason) => Some(reason.as_str()),
                _ => None,
            };
            log_outcome(token.value(), outcome.label(), started.elapsed().as_millis() as u64, reason);
            outcome
        });

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = in_flight.replace(task.abort_handle()) {
            if self.cancel_superseded {
                previous.abort();
            }
        }
        drop(in_flight);

        DispatchHandle { token, task }
    }
}

fn complete<R: Renderer>(
    guard: &StaleGuard,
    view: &Mutex<R>,
    token: RequestToken,
    input: &Measurements,
    result: anyhow::Result<crate::service::PredictResponse>,
) -> DispatchOutcome {
    match result {
        Ok(response) => {
            let model = ViewModel::build(&response, input);
            let applied = guard.apply_if_latest(token, || {
                view.lock().unwrap_or_else(|e| e.into_inner()).render(&model);
            });
            if applied {
                DispatchOutcome::Applied(token)
            } else {
                DispatchOutcome::Superseded(token)
            }
        }
        Err(_) if !guard.is_latest(token) => DispatchOutcome::Superseded(token),
        Err(err) => DispatchOutcome::Failed(token, format!("{:#}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ViewState;
    use crate::service::{PredictResponse, Probabilities};
    use crate::species::Species;
    use anyhow::anyhow;

    fn setosa() -> PredictResponse {
        PredictResponse {
            species: Species::Setosa,
            probabilities: Probabilities {
                setosa: 0.9,
                versicolor: 0.1,
                virginica: 0.0,
            },
        }
    }

    #[test]
    fn test_complete_applies_latest() {
        let guard = StaleGuard::new();
        let view = Mutex::new(ViewState::default());
        let t = guard.next_token();
        let outcome = complete(&guard, &view, t, &Measurements::default(), Ok(setosa()));
        assert_eq!(outcome, DispatchOutcome::Applied(t));
        assert_eq!(view.lock().unwrap().applied(), 1);
    }

    #[test]
    fn test_complete_discards_stale_success() {
        let guard = StaleGuard::new();
        let view = Mutex::new(ViewState::default());
        let old = guard.next_token();
        guard.next_token();
        let outcome = complete(&guard, &view, old, &Measurements::default(), Ok(setosa()));
        assert_eq!(outcome, DispatchOutcome::Superseded(old));
        assert!(view.lock().unwrap().current().is_none());
    }

    #[test]
    fn test_complete_failure_leaves_view() {
        let guard = StaleGuard::new();
        let view = Mutex::new(ViewState::default());
        let t = guard.next_token();
        let outcome = complete(&guard, &view, t, &Measurements::default(), Err(anyhow!("connection reset")));
        assert_eq!(outcome, DispatchOutcome::Failed(t, "connection reset".to_string()));
        assert_eq!(view.lock().unwrap().applied(), 0);

        let old = t;
        guard.next_token();
        let outcome = complete(&guard, &view, old, &Measurements::default(), Err(anyhow!("timeout")));
        assert_eq!(outcome, DispatchOutcome::Superseded(old));
    }
}
