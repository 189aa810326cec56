use crate::model::{by_priority, Roster, Worker};

/// Indices du roster triés par priorité croissante (tri stable : à priorité
/// égale, l'ordre d'insertion est conservé).
pub(super) fn priority_order(roster: &Roster) -> Vec<usize> {
    let workers: Vec<&Worker> = roster.iter().collect();
    let mut order: Vec<usize> = (0..workers.len()).collect();
    order.sort_by(|&a, &b| by_priority(workers[a], workers[b]));
    order
}

/// `candidates` privé de l'élément en position `pos`.
pub(super) fn without(candidates: &[usize], pos: usize) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pos)
        .map(|(_, c)| *c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let mut roster = Roster::new();
        roster.add(Worker::new("carol", 2)).unwrap();
        roster.add(Worker::new("alice", 1)).unwrap();
        roster.add(Worker::new("dave", 2)).unwrap();
        roster.add(Worker::new("bob", 1)).unwrap();
        assert_eq!(priority_order(&roster), vec![1, 3, 0, 2]);
    }

    #[test]
    fn without_drops_only_the_position() {
        assert_eq!(without(&[4, 7, 9], 1), vec![4, 9]);
    }
}
