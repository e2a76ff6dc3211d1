//! Default names for entities added without one.

use planstore_types::EntityId;

/// Hands out `<prefix> <n>` names.
///
/// The next number is computed once by scanning existing names and then
/// advanced on every issue. Removing the entity that received the most
/// recent number gives that number back, so two replicas replaying the same
/// add/remove sequence end up with the same names. The number is not given
/// back once an explicit name has moved the counter past it.
#[derive(Debug, Clone)]
pub(crate) struct AutoNamer {
    prefix: String,
    next: Option<u64>,
    /// Entity holding the most recently issued number, and that number.
    holder: Option<(EntityId, u64)>,
}

impl AutoNamer {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: None,
            holder: None,
        }
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Issues the next name to `id`.
    pub(crate) fn issue<'a, I>(&mut self, existing: I, id: EntityId) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let number = match self.next {
            Some(n) => n,
            None => self.scan(existing),
        };
        self.next = Some(number + 1);
        self.holder = Some((id, number));
        format!("{} {}", self.prefix, number)
    }

    /// Keeps the cached number past an explicitly chosen `<prefix> <n>` name.
    pub(crate) fn observe_name(&mut self, name: &str) {
        if let (Some(next), Some(n)) = (self.next, self.number_in(name)) {
            if n >= next {
                self.next = Some(n + 1);
            }
        }
    }

    pub(crate) fn on_removed(&mut self, id: EntityId) {
        let Some((holder, number)) = self.holder else {
            return;
        };
        if holder != id {
            return;
        }
        self.holder = None;
        if self.next == Some(number + 1) {
            self.next = Some(number);
        }
    }

    /// Forgets the cache; the next issue rescans.
    pub(crate) fn reset(&mut self) {
        self.next = None;
        self.holder = None;
    }

    fn scan<'a, I>(&self, existing: I) -> u64
    where
        I: IntoIterator<Item = &'a str>,
    {
        existing
            .into_iter()
            .filter_map(|name| self.number_in(name))
            .max()
            .map_or(1, |max| max + 1)
    }

    fn number_in(&self, name: &str) -> Option<u64> {
        name.strip_prefix(self.prefix.as_str())?
            .strip_prefix(' ')?
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> EntityId {
        EntityId::from_raw(raw)
    }

    #[test]
    fn first_issue_scans_existing_names() {
        let mut namer = AutoNamer::new("Job");
        let name = namer.issue(["Job 4", "Job 2", "Jobs 9", "Job x"], id(1));
        assert_eq!(name, "Job 5");
    }

    #[test]
    fn issue_advances_without_rescanning() {
        let mut namer = AutoNamer::new("Job");
        assert_eq!(namer.issue([], id(1)), "Job 1");
        // The cache is authoritative once computed.
        assert_eq!(namer.issue(["Job 40"], id(2)), "Job 2");
    }

    #[test]
    fn removing_holder_rolls_back_once() {
        let mut namer = AutoNamer::new("Job");
        namer.issue([], id(1));
        namer.issue([], id(2));
        namer.on_removed(id(2));
        namer.on_removed(id(2));
        assert_eq!(namer.issue([], id(3)), "Job 2");
    }

    #[test]
    fn removing_other_entity_keeps_counter() {
        let mut namer = AutoNamer::new("Job");
        namer.issue([], id(1));
        namer.issue([], id(2));
        namer.on_removed(id(1));
        assert_eq!(namer.issue([], id(3)), "Job 3");
    }

    #[test]
    fn removing_holder_after_explicit_name_keeps_counter() {
        let mut namer = AutoNamer::new("Job");
        namer.issue([], id(1));
        namer.observe_name("Job 10");
        namer.on_removed(id(1));
        assert_eq!(namer.issue([], id(2)), "Job 11");
    }

    #[test]
    fn explicit_names_push_counter_forward() {
        let mut namer = AutoNamer::new("Job");
        namer.issue([], id(1));
        namer.observe_name("Job 10");
        namer.observe_name("Job 3");
        assert_eq!(namer.issue([], id(2)), "Job 11");
    }

    #[test]
    fn reset_forces_rescan() {
        let mut namer = AutoNamer::new("Plant");
        namer.issue([], id(1));
        namer.reset();
        assert_eq!(namer.issue(["Plant 7"], id(2)), "Plant 8");
        assert_eq!(namer.prefix(), "Plant");
    }
}
