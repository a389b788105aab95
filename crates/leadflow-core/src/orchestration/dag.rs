//! Dependency graph validation and topological ordering.
//!
//! `build_execution_order` validates the step set (unique IDs, known
//! dependencies) and linearizes it with an iterative three-color
//! depth-first sort: an explicit stack instead of call-stack recursion, so
//! very large graphs cannot overflow, and a white/gray/black marking where
//! reaching a gray node proves a cycle.
//!
//! The output is insertion-stable: steps with no dependency relationship
//! keep their request order, and every dependency precedes its dependents.
//! Ordering says nothing about parallelism -- the engine still walks the
//! result sequentially.

use std::collections::{HashMap, HashSet};

use leadflow_types::orchestration::WorkflowStep;

use super::error::OrchestrationError;

#[derive(Clone, Copy, PartialEq)]
enum Color {
    /// Not visited yet.
    White,
    /// On the current DFS path.
    Gray,
    /// Fully processed and emitted.
    Black,
}

/// Produce the execution order for a step set, or fail on duplicate IDs,
/// unknown dependencies, or cycles.
pub fn build_execution_order(
    steps: &[WorkflowStep],
) -> Result<Vec<String>, OrchestrationError> {
    validate_references(steps)?;

    let dependencies: HashMap<&str, &[String]> = steps
        .iter()
        .map(|step| (step.id.as_str(), step.depends_on.as_slice()))
        .collect();

    let mut colors: HashMap<&str, Color> =
        steps.iter().map(|step| (step.id.as_str(), Color::White)).collect();
    let mut order: Vec<String> = Vec::with_capacity(steps.len());

    for root in steps {
        if colors[root.id.as_str()] != Color::White {
            continue;
        }

        // Each frame is (step id, index of the next dependency to visit).
        let mut stack: Vec<(&str, usize)> = vec![(root.id.as_str(), 0)];
        colors.insert(root.id.as_str(), Color::Gray);

        while let Some((current, next_dep)) = stack.pop() {
            let deps = dependencies[current];
            match deps.get(next_dep) {
                Some(dep) => {
                    stack.push((current, next_dep + 1));
                    match colors[dep.as_str()] {
                        Color::Black => {}
                        Color::Gray => {
                            return Err(OrchestrationError::CycleDetected(dep.clone()));
                        }
                        Color::White => {
                            colors.insert(dep.as_str(), Color::Gray);
                            stack.push((dep.as_str(), 0));
                        }
                    }
                }
                None => {
                    colors.insert(current, Color::Black);
                    order.push(current.to_string());
                }
            }
        }
    }

    Ok(order)
}

/// Check ID uniqueness and that every dependency names a step in the set.
fn validate_references(steps: &[WorkflowStep]) -> Result<(), OrchestrationError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(steps.len());
    for step in steps {
        if !seen.insert(step.id.as_str()) {
            return Err(OrchestrationError::DuplicateStepId(step.id.clone()));
        }
    }

    for step in steps {
        for dependency in &step.depends_on {
            if !seen.contains(dependency.as_str()) {
                return Err(OrchestrationError::UnknownDependency {
                    step_id: step.id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_types::orchestration::{StepConfig, WaitUnit};

    /// Helper: build a step with the given ID and dependencies.
    fn step(id: &str, depends_on: Vec<&str>) -> WorkflowStep {
        WorkflowStep {
            id: id.to_string(),
            name: id.to_string(),
            depends_on: depends_on.into_iter().map(String::from).collect(),
            retry: None,
            config: StepConfig::Wait {
                duration: 1,
                unit: WaitUnit::Milliseconds,
            },
        }
    }

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|entry| entry == id).unwrap()
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[test]
    fn test_linear_chain_in_order() {
        let steps = vec![step("a", vec![]), step("b", vec!["a"]), step("c", vec!["b"])];
        let order = build_execution_order(&steps).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_declaration_order_does_not_break_dependencies() {
        // Dependencies declared after their dependents still come first.
        let steps = vec![step("c", vec!["b"]), step("b", vec!["a"]), step("a", vec![])];
        let order = build_execution_order(&steps).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_every_step_exactly_once() {
        let steps = vec![
            step("a", vec![]),
            step("b", vec!["a"]),
            step("c", vec!["a"]),
            step("d", vec!["b", "c"]),
            step("e", vec![]),
        ];
        let order = build_execution_order(&steps).unwrap();
        assert_eq!(order.len(), 5);
        for wanted in ["a", "b", "c", "d", "e"] {
            assert_eq!(
                order.iter().filter(|id| *id == wanted).count(),
                1,
                "step {wanted} should appear exactly once"
            );
        }
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        //     a
        //    / \
        //   b   c
        //   |   |
        //   d   e
        //    \ /
        //     f
        let steps = vec![
            step("a", vec![]),
            step("b", vec!["a"]),
            step("c", vec!["a"]),
            step("d", vec!["b"]),
            step("e", vec!["c"]),
            step("f", vec!["d", "e"]),
        ];
        let order = build_execution_order(&steps).unwrap();
        for (before, after) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "e"), ("d", "f"), ("e", "f")] {
            assert!(
                position(&order, before) < position(&order, after),
                "{before} must precede {after}, got {order:?}"
            );
        }
    }

    #[test]
    fn test_independent_steps_keep_insertion_order() {
        let steps = vec![
            step("third", vec![]),
            step("first", vec![]),
            step("second", vec![]),
        ];
        let order = build_execution_order(&steps).unwrap();
        assert_eq!(order, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_empty_step_set() {
        let order = build_execution_order(&[]).unwrap();
        assert!(order.is_empty());
    }

    // -----------------------------------------------------------------------
    // Cycles
    // -----------------------------------------------------------------------

    #[test]
    fn test_direct_cycle_detected() {
        let steps = vec![step("a", vec!["b"]), step("b", vec!["a"])];
        let err = build_execution_order(&steps).unwrap_err();
        assert!(matches!(err, OrchestrationError::CycleDetected(_)));
        assert!(err.to_string().contains("cycle detected"));
    }

    #[test]
    fn test_indirect_cycle_detected() {
        let steps = vec![
            step("a", vec!["c"]),
            step("b", vec!["a"]),
            step("c", vec!["b"]),
        ];
        let err = build_execution_order(&steps).unwrap_err();
        assert!(matches!(err, OrchestrationError::CycleDetected(_)));
    }

    #[test]
    fn test_self_cycle_detected() {
        let steps = vec![step("a", vec!["a"])];
        let err = build_execution_order(&steps).unwrap_err();
        assert!(matches!(err, OrchestrationError::CycleDetected(id) if id == "a"));
    }

    // -----------------------------------------------------------------------
    // Reference validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_unknown_dependency_rejected() {
        let steps = vec![step("a", vec!["ghost"])];
        let err = build_execution_order(&steps).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::UnknownDependency { ref dependency, .. } if dependency == "ghost"
        ));
    }

    #[test]
    fn test_duplicate_step_id_rejected() {
        let steps = vec![step("a", vec![]), step("a", vec![])];
        let err = build_execution_order(&steps).unwrap_err();
        assert!(matches!(err, OrchestrationError::DuplicateStepId(id) if id == "a"));
    }
}
