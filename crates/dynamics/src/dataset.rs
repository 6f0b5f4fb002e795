use crate::error::DynamicsError;

/// One observed real-environment transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: Vec<f32>,
    pub next_state: Vec<f32>,
}

impl Transition {
    pub fn new(state: Vec<f32>, action: Vec<f32>, next_state: Vec<f32>) -> Self {
        Self { state, action, next_state }
    }

    /// `next_state - state`, the regression target of the dynamics ensemble.
    #[must_use]
    pub fn delta(&self) -> Vec<f32> {
        self.next_state
            .iter()
            .zip(&self.state)
            .map(|(n, s)| n - s)
            .collect()
    }

    /// `state ‖ action`, the regression input of the dynamics ensemble.
    #[must_use]
    pub fn model_input(&self) -> Vec<f32> {
        let mut input = Vec::with_capacity(self.state.len() + self.action.len());
        input.extend_from_slice(&self.state);
        input.extend_from_slice(&self.action);
        input
    }
}

/// Regression view of a dataset handed to ensemble training.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub inputs: Vec<Vec<f32>>,
    pub targets: Vec<Vec<f32>>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn input_dim(&self) -> usize {
        self.inputs.first().map_or(0, Vec::len)
    }

    pub fn target_dim(&self) -> usize {
        self.targets.first().map_or(0, Vec::len)
    }
}

/// Append-only store of every transition seen in the real environment.
///
/// Transitions are never removed or rewritten. Trainers only ever see a
/// [`TrainingSet`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct TransitionDataset {
    transitions: Vec<Transition>,
}

impl TransitionDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transition.
    ///
    /// # Errors
    ///
    /// The first transition fixes the state and action dimensions; later
    /// transitions that disagree are rejected with
    /// [`DynamicsError::DimensionMismatch`].
    pub fn push(&mut self, transition: Transition) -> Result<(), DynamicsError> {
        let (state_dim, action_dim) = match self.transitions.first() {
            Some(first) => (first.state.len(), first.action.len()),
            None => (transition.state.len(), transition.action.len()),
        };
        if transition.state.len() != state_dim {
            return Err(DynamicsError::DimensionMismatch {
                what: "state",
                expected: state_dim,
                actual: transition.state.len(),
            });
        }
        if transition.next_state.len() != state_dim {
            return Err(DynamicsError::DimensionMismatch {
                what: "next state",
                expected: state_dim,
                actual: transition.next_state.len(),
            });
        }
        if transition.action.len() != action_dim {
            return Err(DynamicsError::DimensionMismatch {
                what: "action",
                expected: action_dim,
                actual: transition.action.len(),
            });
        }
        self.transitions.push(transition);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Inputs `state ‖ action` and delta targets for the whole history, in
    /// insertion order.
    #[must_use]
    pub fn snapshot(&self) -> TrainingSet {
        TrainingSet {
            inputs: self.transitions.iter().map(Transition::model_input).collect(),
            targets: self.transitions.iter().map(Transition::delta).collect(),
        }
    }
}
