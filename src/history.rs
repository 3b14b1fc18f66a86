use crate::Action;
use crate::Obs;

/// The ordered (action, observation) pairs that produced a belief.
/// Monotonically extended by belief updates; the search extends and
/// truncates its own copy per trial, never the belief's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History(Vec<(Action, Obs)>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: Action, obs: Obs) {
        self.0.push((action, obs));
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn action(&self, i: usize) -> Action {
        self.0[i].0
    }

    pub fn observation(&self, i: usize) -> Obs {
        self.0[i].1
    }

    pub fn last(&self) -> Option<(Action, Obs)> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Action, Obs)> {
        self.0.iter()
    }
}

impl std::fmt::Display for History {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (action, obs) in self.iter() {
            write!(f, "({}, {}) ", action, obs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut history = History::new();
        history.record(2, 0);
        history.record(1, 1);
        assert_eq!(history.len(), 2);
        assert_eq!(history.action(0), 2);
        assert_eq!(history.observation(1), 1);
        assert_eq!(history.last(), Some((1, 1)));
    }

    #[test]
    fn truncates_back_to_prefix() {
        let mut history = History::new();
        history.record(0, 0);
        let mark = history.len();
        history.record(1, 7);
        history.record(2, 9);
        history.truncate(mark);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last(), Some((0, 0)));
    }
}
