//! Execution-order resolver.
//!
//! Rungs are ordered so a coil written on one rung is visible to contacts
//! that observe it on rungs later in the order within the same scan. The
//! dependency graph has an edge j -> i whenever rung i observes a coil
//! driven by rung j; a Kahn-style pass emits ready rungs in ascending
//! program order, which keeps the result a deterministic function of the
//! program alone.
//!
//! Cycles are expected, not errors: feedback patterns such as a motor
//! start/stop latch observe their own coils. Once no rung is ready, the
//! remaining rungs are emitted in their original program order and the
//! feedback resolves across scans, because a contact in a cycle reads the
//! value committed by the previous scan.
//!
//! The order is computed once per program load, not per scan.

use crate::program::Program;
use std::collections::HashSet;
use tracing::debug;

/// Compute the rung execution order as a permutation of rung indices.
#[must_use]
pub fn resolve(program: &Program) -> Vec<usize> {
    let coils = program.coils_by_rung();
    let contacts = program.contacts_by_rung();
    let n = program.rungs.len();

    // deps[i] holds every j whose coils rung i observes, including i itself
    // for self-latching rungs.
    let mut deps: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for (i, observed) in contacts.iter().enumerate() {
        for (j, driven) in coils.iter().enumerate() {
            if !observed.is_disjoint(driven) {
                deps[i].insert(j);
            }
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut emitted = vec![false; n];

    while order.len() < n {
        let mut progressed = false;
        for i in 0..n {
            if !emitted[i] && deps[i].iter().all(|&j| emitted[j]) {
                emitted[i] = true;
                order.push(i);
                progressed = true;
            }
        }

        if !progressed {
            // The residue is one or more cycles; fall back to program order.
            let residue: Vec<usize> = (0..n).filter(|&i| !emitted[i]).collect();
            debug!(rungs = ?residue, "dependency cycle, emitting residue in program order");
            for i in residue {
                emitted[i] = true;
                order.push(i);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Element, Rung};

    fn rung(contacts: &[&str], coils: &[&str]) -> Rung {
        let mut elements: Vec<Element> =
            contacts.iter().map(|id| Element::contact(*id, true)).collect();
        elements.extend(coils.iter().map(|id| Element::coil(*id)));
        Rung::new(elements)
    }

    /// Check that `order` is a valid topological sort of the program.
    fn assert_topological(program: &Program, order: &[usize]) {
        let coils = program.coils_by_rung();
        let contacts = program.contacts_by_rung();
        let position: Vec<usize> = {
            let mut pos = vec![0; order.len()];
            for (rank, &idx) in order.iter().enumerate() {
                pos[idx] = rank;
            }
            pos
        };

        for (i, observed) in contacts.iter().enumerate() {
            for (j, driven) in coils.iter().enumerate() {
                if i != j && !observed.is_disjoint(driven) {
                    assert!(
                        position[j] < position[i],
                        "rung {j} drives rung {i} but runs after it: {order:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_independent_rungs_keep_program_order() {
        let program = Program::new(vec![
            rung(&["a"], &["x"]),
            rung(&["b"], &["y"]),
            rung(&["c"], &["z"]),
        ]);
        assert_eq!(resolve(&program), vec![0, 1, 2]);
    }

    #[test]
    fn test_dependency_reorders() {
        // Rung 0 observes the coil of rung 2
        let program = Program::new(vec![
            rung(&["x"], &["y"]),
            rung(&["in"], &["z"]),
            rung(&["in"], &["x"]),
        ]);

        let order = resolve(&program);
        assert_topological(&program, &order);
        assert_eq!(order.len(), 3);
        // Rung 2 must run before rung 0
        let pos2 = order.iter().position(|&i| i == 2).unwrap();
        let pos0 = order.iter().position(|&i| i == 0).unwrap();
        assert!(pos2 < pos0);
    }

    #[test]
    fn test_diamond_is_topological() {
        let program = Program::new(vec![
            rung(&["left", "right"], &["sink"]),
            rung(&["src"], &["left"]),
            rung(&["src"], &["right"]),
            rung(&["in"], &["src_unrelated"]),
        ]);

        let order = resolve(&program);
        assert_topological(&program, &order);
    }

    #[test]
    fn test_self_latch_counts_as_cycle() {
        // The rung observes its own coil; it can never become ready, so it
        // falls out in program order.
        let program = Program::new(vec![rung(&["start", "motor"], &["motor"])]);
        assert_eq!(resolve(&program), vec![0]);
    }

    #[test]
    fn test_cycle_residue_keeps_program_order() {
        let program = Program::new(vec![
            rung(&["b"], &["a"]),
            rung(&["a"], &["b"]),
            rung(&["in"], &["c"]),
        ]);

        let order = resolve(&program);
        // Rung 2 is acyclic and ready first; the cycle {0, 1} follows in
        // program order.
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_every_rung_appears_exactly_once() {
        let program = Program::new(vec![
            rung(&["b"], &["a"]),
            rung(&["a"], &["b"]),
            rung(&["x"], &["y"]),
            rung(&["y", "flag"], &["flag"]),
        ]);

        let mut order = resolve(&program);
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_input_only_ids_create_no_edges() {
        // Both rungs observe "in", which no coil drives
        let program = Program::new(vec![rung(&["in"], &["x"]), rung(&["in"], &["y"])]);
        assert_eq!(resolve(&program), vec![0, 1]);
    }
}
