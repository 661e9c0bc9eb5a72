//! Cancellable one-shot timers driven by the host clock.

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScheduledAction {
    Unpin(String),
}

impl ScheduledAction {
    pub fn node_id(&self) -> &str {
        match self {
            Self::Unpin(id) => id,
        }
    }
}

/// Timers keyed by action. Arming an action that is already pending moves its deadline.
#[derive(Clone, Debug, Default)]
pub struct DelayedActions {
    pending: Vec<(f64, ScheduledAction)>,
}

impl DelayedActions {
    pub fn arm(&mut self, action: ScheduledAction, due_at: f64) {
        if let Some(entry) = self.pending.iter_mut().find(|(_, pending)| *pending == action) {
            entry.0 = due_at;
        } else {
            self.pending.push((due_at, action));
        }
    }

    pub fn cancel(&mut self, action: &ScheduledAction) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(_, pending)| pending != action);
        self.pending.len() != before
    }

    pub fn is_armed(&self, action: &ScheduledAction) -> bool {
        self.pending.iter().any(|(_, pending)| pending == action)
    }

    /// Removes and returns every action due at `now`, earliest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledAction> {
        let mut due = Vec::new();
        self.pending.retain(|(due_at, action)| {
            if *due_at <= now {
                due.push((*due_at, action.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, action)| action).collect()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&ScheduledAction) -> bool) {
        self.pending.retain(|(_, action)| keep(action));
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
