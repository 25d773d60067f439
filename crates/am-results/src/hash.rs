//! Content-based hashing of simulation inputs.

use am_core::SimulationInput;
use sha2::{Digest, Sha256};

/// Hash of the input excluding the simulation id, so two inputs that differ
/// only by id hash the same.
pub fn compute_input_hash(input: &SimulationInput) -> String {
    let mut input = input.clone();
    input.set_id("");

    let mut hasher = Sha256::new();
    let json = serde_json::to_string(&input).unwrap_or_default();
    hasher.update(json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_core::{AdditiveMachine, AdditiveMaterial, MachineParams, SingleBeadInput};

    fn input(id: &str, power: f64) -> SimulationInput {
        let machine = AdditiveMachine::new(MachineParams {
            laser_power: power,
            ..Default::default()
        })
        .unwrap();
        SingleBeadInput::new(id, machine, AdditiveMaterial::default()).into()
    }

    #[test]
    fn hash_ignores_id() {
        assert_eq!(
            compute_input_hash(&input("a", 200.0)),
            compute_input_hash(&input("b", 200.0))
        );
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        assert_ne!(
            compute_input_hash(&input("a", 200.0)),
            compute_input_hash(&input("a", 300.0))
        );
    }
}
