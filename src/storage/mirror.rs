use std::sync::mpsc;
use std::thread::JoinHandle;

use super::{SessionRecord, SessionStore};

enum MirrorCommand {
    Save(SessionRecord),
    Clear,
    Flush(mpsc::Sender<()>),
}

/// Fire-and-forget writer. The store lives on a dedicated thread; callers only
/// enqueue commands and never wait on a write.
#[derive(Debug)]
pub struct SessionMirror {
    tx: Option<mpsc::Sender<MirrorCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl SessionMirror {
    pub fn spawn<S: SessionStore + 'static>(store: S) -> Self {
        let (tx, rx) = mpsc::channel::<MirrorCommand>();
        let worker = std::thread::Builder::new()
            .name("session-mirror".to_string())
            .spawn(move || run_mirror(store, rx));
        match worker {
            Ok(worker) => Self {
                tx: Some(tx),
                worker: Some(worker),
            },
            Err(err) => {
                tracing::warn!(?err, "failed to start session mirror; persistence disabled");
                Self::disabled()
            }
        }
    }

    /// A mirror that drops every command.
    pub const fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    pub fn save(&self, record: SessionRecord) {
        self.send(MirrorCommand::Save(record));
    }

    pub fn clear(&self) {
        self.send(MirrorCommand::Clear);
    }

    /// Blocks until every command queued before this call has been applied.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.send(MirrorCommand::Flush(ack_tx)) {
            let _ = ack_rx.recv();
        }
    }

    fn send(&self, command: MirrorCommand) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        if tx.send(command).is_err() {
            tracing::warn!("session mirror stopped; dropping persistence command");
            return false;
        }
        true
    }
}

impl Drop for SessionMirror {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("session mirror thread panicked");
            }
        }
    }
}

fn run_mirror<S: SessionStore>(store: S, rx: mpsc::Receiver<MirrorCommand>) {
    while let Ok(first) = rx.recv() {
        let mut batch = vec![first];
        batch.extend(rx.try_iter());

        let mut commands = batch.into_iter().peekable();
        while let Some(command) = commands.next() {
            match command {
                MirrorCommand::Save(record) => {
                    // a later queued save supersedes this one
                    if matches!(commands.peek(), Some(MirrorCommand::Save(_))) {
                        continue;
                    }
                    match store.save(&record) {
                        Ok(()) => tracing::debug!(
                            snapshots = record.history.len(),
                            current_index = record.current_index,
                            "session persisted"
                        ),
                        Err(err) => tracing::warn!(?err, "failed to persist session"),
                    }
                }
                MirrorCommand::Clear => match store.clear() {
                    Ok(()) => tracing::debug!("persisted session cleared"),
                    Err(err) => tracing::warn!(?err, "failed to clear persisted session"),
                },
                MirrorCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }
    tracing::debug!("session mirror stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Snapshot;
    use crate::storage::{MemorySessionStore, SESSION_RECORD_ID};

    fn record(names: &[&str]) -> SessionRecord {
        SessionRecord {
            id: SESSION_RECORD_ID.to_string(),
            history: names
                .iter()
                .map(|name| Snapshot::new(name.as_bytes().to_vec(), "image/png", *name))
                .collect(),
            current_index: names.len() as i64 - 1,
            timestamp: 0,
        }
    }

    #[test]
    fn saves_are_applied_in_order_with_latest_winning() {
        let store = MemorySessionStore::new();
        let mirror = SessionMirror::spawn(store.clone());
        mirror.save(record(&["A"]));
        mirror.save(record(&["A", "B"]));
        mirror.flush();

        let stored = store.stored().unwrap();
        assert_eq!(stored.history.len(), 2);
        assert_eq!(stored.current_index, 1);
    }

    #[test]
    fn clear_after_save_leaves_no_record() {
        let store = MemorySessionStore::new();
        let mirror = SessionMirror::spawn(store.clone());
        mirror.save(record(&["A"]));
        mirror.clear();
        mirror.flush();
        assert!(store.stored().is_none());
    }

    #[test]
    fn save_after_clear_is_kept() {
        let store = MemorySessionStore::new();
        let mirror = SessionMirror::spawn(store.clone());
        mirror.clear();
        mirror.save(record(&["X"]));
        mirror.flush();
        assert_eq!(store.stored().unwrap().history[0].name(), "X");
    }

    #[test]
    fn write_failures_are_swallowed() {
        let store = MemorySessionStore::new();
        store.set_fail_writes(true);
        let mirror = SessionMirror::spawn(store.clone());
        mirror.save(record(&["A"]));
        mirror.clear();
        mirror.flush();
        assert!(store.stored().is_none());

        store.set_fail_writes(false);
        mirror.save(record(&["B"]));
        mirror.flush();
        assert!(store.stored().is_some());
    }

    #[test]
    fn drop_drains_pending_commands() {
        let store = MemorySessionStore::new();
        {
            let mirror = SessionMirror::spawn(store.clone());
            mirror.save(record(&["A", "B", "C"]));
        }
        assert_eq!(store.stored().unwrap().history.len(), 3);
    }

    #[test]
    fn disabled_mirror_ignores_commands() {
        let mirror = SessionMirror::disabled();
        mirror.save(record(&["A"]));
        mirror.clear();
        mirror.flush();
    }
}
