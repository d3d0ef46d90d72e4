//! Aggregation of diff sessions by group.
//!
//! The registry keeps weak references only. Sessions report changes over a
//! channel and the host drains it with `poll_changes`, the same way a
//! file watcher is polled from the UI loop.

use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};
use std::sync::mpsc::{channel, Receiver, Sender};

use buffer_diff::ChunkIdentity;

use crate::error::ReviewError;
use crate::ids::{GroupId, SessionId};
use crate::session::{DiffSession, EventSink, RevertOutcome, SessionEvent, SessionEventKind};

/// Shared handle the host keeps for each session
pub type SessionHandle = Rc<RefCell<DiffSession>>;

/// Aggregate state of one group, recomputed for every notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStatus {
    pub group: GroupId,
    /// Live sessions in the group
    pub sessions: usize,
    pub any_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Operations a host UI can trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    RevertChunk {
        group: GroupId,
        session: SessionId,
        chunk: ChunkIdentity,
    },
    AcceptSession {
        group: GroupId,
        session: SessionId,
    },
    RejectSession {
        group: GroupId,
        session: SessionId,
    },
    AcceptGroup(GroupId),
    RejectGroup(GroupId),
}

struct Entry {
    id: SessionId,
    session: Weak<RefCell<DiffSession>>,
}

impl Entry {
    /// The session, if it is still alive and not disposed
    fn live(&self) -> Option<SessionHandle> {
        let session = self.session.upgrade()?;
        let disposed = match session.try_borrow() {
            Ok(session) => session.is_disposed(),
            // Borrowed mutably by the host right now, so certainly alive
            Err(_) => false,
        };
        (!disposed).then_some(session)
    }
}

type Listener = Box<dyn FnMut(&GroupStatus)>;

/// Tracks the sessions of each group and dispatches group-wide operations
pub struct SessionRegistry {
    groups: BTreeMap<GroupId, Vec<Entry>>,
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            groups: BTreeMap::new(),
            tx,
            rx,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Add a session to a group.
    ///
    /// A session lives in one group at a time; registering it again moves
    /// it. Returns false if the session is disposed or currently borrowed.
    pub fn register(&mut self, group: impl Into<GroupId>, session: &SessionHandle) -> bool {
        let group = group.into();

        let id = {
            let Ok(mut inner) = session.try_borrow_mut() else {
                warn!("Cannot register a session while it is in use");
                return false;
            };
            if inner.is_disposed() {
                debug!("Not registering disposed session {}", inner.id());
                return false;
            }
            inner.attach_events(EventSink::new(group.clone(), self.tx.clone()));
            inner.id().clone()
        };

        let mut moved_from = Vec::new();
        for (other, entries) in self.groups.iter_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            if entries.len() != before && *other != group {
                moved_from.push(other.clone());
            }
        }

        self.groups.entry(group.clone()).or_default().push(Entry {
            id: id.clone(),
            session: Rc::downgrade(session),
        });
        info!("Registered session {} in group {}", id, group);

        for other in moved_from {
            self.notify(&other);
        }
        self.notify(&group);
        true
    }

    /// Remove a session from a group. Returns whether it was there.
    pub fn unregister(&mut self, group: &GroupId, session: &SessionId) -> bool {
        let Some(entries) = self.groups.get_mut(group) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| &entry.id != session);
        let removed = entries.len() != before;

        if removed {
            debug!("Unregistered session {} from group {}", session, group);
            self.notify(group);
        }
        removed
    }

    /// Drop a whole group, as when its host container goes away
    pub fn remove_group(&mut self, group: &GroupId) -> usize {
        let Some(entries) = self.groups.remove(group) else {
            return 0;
        };

        info!("Removed group {} with {} sessions", group, entries.len());
        self.notify(group);
        entries.len()
    }

    /// Live sessions of a group in registration order
    pub fn sessions_for(&self, group: &GroupId) -> Vec<SessionHandle> {
        self.groups
            .get(group)
            .map(|entries| entries.iter().filter_map(Entry::live).collect())
            .unwrap_or_default()
    }

    pub fn find(&self, group: &GroupId, session: &SessionId) -> Option<SessionHandle> {
        self.groups
            .get(group)?
            .iter()
            .find(|entry| &entry.id == session)
            .and_then(Entry::live)
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupId> {
        self.groups.keys()
    }

    /// Whether any session of the group differs from its baseline
    pub fn has_any_pending(&self, group: &GroupId) -> bool {
        self.status(group).any_pending
    }

    pub fn status(&self, group: &GroupId) -> GroupStatus {
        let sessions = self.sessions_for(group);
        let any_pending = sessions.iter().any(|session| {
            session
                .try_borrow()
                .map(|session| session.has_pending_changes())
                // Borrowed elsewhere, most likely mid-edit; it cannot be
                // inspected so it counts as pending
                .unwrap_or(true)
        });

        GroupStatus {
            group: group.clone(),
            sessions: sessions.len(),
            any_pending,
        }
    }

    /// Accept every session in the group.
    ///
    /// Sessions are independent, so one failure does not stop the others;
    /// the first error is returned after all were tried.
    pub fn accept_all_in_group(&mut self, group: &GroupId) -> Result<usize, ReviewError> {
        let mut accepted = 0;
        let mut first_error = None;

        for handle in self.sessions_for(group) {
            let Ok(mut session) = handle.try_borrow_mut() else {
                warn!("Skipping busy session in group {}", group);
                continue;
            };
            match session.accept_all() {
                Ok(()) => accepted += 1,
                Err(err) => {
                    warn!("Accept failed for session {}: {}", session.id(), err);
                    first_error.get_or_insert(err);
                }
            }
        }

        info!("Accepted {} sessions in group {}", accepted, group);
        self.poll_changes();

        match first_error {
            Some(err) => Err(err),
            None => Ok(accepted),
        }
    }

    /// Reject every session in the group
    pub fn reject_all_in_group(&mut self, group: &GroupId) -> usize {
        let mut rejected = 0;

        for handle in self.sessions_for(group) {
            let Ok(mut session) = handle.try_borrow_mut() else {
                warn!("Skipping busy session in group {}", group);
                continue;
            };
            session.reject_all();
            if session.is_disposed() {
                rejected += 1;
            }
        }

        info!("Rejected {} sessions in group {}", rejected, group);
        self.poll_changes();
        rejected
    }

    /// Run a host command. Missing targets are no-ops.
    ///
    /// Returns how many chunks or sessions were affected.
    pub fn execute(&mut self, command: ReviewCommand) -> Result<usize, ReviewError> {
        trace!("Executing {:?}", command);

        let affected = match command {
            ReviewCommand::RevertChunk {
                group,
                session,
                chunk,
            } => self
                .with_session(&group, &session, |session| session.revert_chunk(chunk))
                .map_or(0, |outcome| usize::from(outcome == RevertOutcome::Applied)),
            ReviewCommand::AcceptSession { group, session } => self
                .with_session(&group, &session, DiffSession::accept_all)
                .transpose()?
                .map_or(0, |()| 1),
            ReviewCommand::RejectSession { group, session } => self
                .with_session(&group, &session, |session| {
                    session.reject_all();
                    session.is_disposed()
                })
                .map_or(0, usize::from),
            ReviewCommand::AcceptGroup(group) => self.accept_all_in_group(&group)?,
            ReviewCommand::RejectGroup(group) => self.reject_all_in_group(&group),
        };

        self.poll_changes();
        Ok(affected)
    }

    fn with_session<R>(
        &self,
        group: &GroupId,
        session: &SessionId,
        f: impl FnOnce(&mut DiffSession) -> R,
    ) -> Option<R> {
        let Some(handle) = self.find(group, session) else {
            debug!("No live session {} in group {}", session, group);
            return None;
        };
        let Ok(mut session) = handle.try_borrow_mut() else {
            warn!("Session {} is busy", session);
            return None;
        };
        Some(f(&mut *session))
    }

    /// Drain session events, prune disposed or dropped sessions and notify
    /// listeners once per affected group. Returns the number of events seen.
    pub fn poll_changes(&mut self) -> usize {
        let mut affected = BTreeSet::new();
        let mut seen = 0;

        while let Ok(event) = self.rx.try_recv() {
            seen += 1;
            trace!("Received session event: {:?}", event);

            if event.kind == SessionEventKind::Disposed {
                if let Some(entries) = self.groups.get_mut(&event.group) {
                    entries.retain(|entry| entry.id != event.session);
                }
            }
            if self.groups.contains_key(&event.group) {
                affected.insert(event.group);
            }
        }

        for (group, entries) in self.groups.iter_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.live().is_some());
            if entries.len() != before {
                debug!("Pruned {} sessions from group {}", before - entries.len(), group);
                affected.insert(group.clone());
            }
        }

        for group in &affected {
            self.notify(group);
        }
        seen
    }

    /// Call `listener` with the group status whenever membership or a
    /// session's pending state may have changed
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GroupStatus) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, group: &GroupId) {
        let status = self.status(group);
        trace!("Notifying {} listeners: {:?}", self.listeners.len(), status);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&status);
        }
    }
}
