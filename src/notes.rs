use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveNote {
    pub note: u8,
    pub channel: u8,
    pub off_time: Instant,
}

/// Notes currently sounding, in the order they were started.
///
/// Entries are never merged: two overlapping hits on the same note and
/// channel are tracked separately and each gets its own note-off.
#[derive(Debug, Default)]
pub struct ActiveNotes {
    notes: Vec<ActiveNote>,
}

impl ActiveNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, note: u8, channel: u8, off_time: Instant) {
        self.notes.push(ActiveNote {
            note,
            channel,
            off_time,
        });
    }

    /// Removes and returns every note whose off time is at or before `now`,
    /// keeping the start order of both the released and the remaining notes.
    pub fn release_due(&mut self, now: Instant) -> Vec<ActiveNote> {
        if self.notes.is_empty() {
            return Vec::new();
        }
        let (due, still_active): (Vec<_>, Vec<_>) =
            self.notes.drain(..).partition(|n| n.off_time <= now);
        self.notes = still_active;
        due
    }

    /// Forgets every note without releasing it.
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveNote> {
        self.notes.iter()
    }
}
