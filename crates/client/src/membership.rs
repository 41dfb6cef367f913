//! Per-user membership lists (favorites, watched, to-watch).
//!
//! [`MembershipStore`] owns the three id sets for one session. A toggle
//! flips local membership at once, issues the matching remote add or remove,
//! and then either keeps the change or reverts it.
//!
//! While calls are in flight for a `(kind, id)` the store keeps a pending
//! record holding a generation counter and the last membership the remote
//! confirmed. Only the latest toggle for a key may revert it, and it reverts
//! to the last confirmed value, so an older failure never undoes a newer
//! toggle. Once the latest toggle has failed, older calls that succeed later
//! move local state to what they confirmed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cinefest_shared::models::{EnrichedItem, ItemId, MembershipKind};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::session::Session;
use crate::sources::MembershipRemote;
use crate::{Error, Result};

/// Sends the user to the sign-in screen.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSets {
    pub favorites: HashSet<ItemId>,
    pub watched: HashSet<ItemId>,
    pub to_watch: HashSet<ItemId>,
}

impl MembershipSets {
    pub fn get(&self, kind: MembershipKind) -> &HashSet<ItemId> {
        match kind {
            MembershipKind::Favorites => &self.favorites,
            MembershipKind::Watched => &self.watched,
            MembershipKind::ToWatch => &self.to_watch,
        }
    }

    fn get_mut(&mut self, kind: MembershipKind) -> &mut HashSet<ItemId> {
        match kind {
            MembershipKind::Favorites => &mut self.favorites,
            MembershipKind::Watched => &mut self.watched,
            MembershipKind::ToWatch => &mut self.to_watch,
        }
    }

    pub fn contains(&self, kind: MembershipKind, id: &ItemId) -> bool {
        self.get(kind).contains(id)
    }

    fn set(&mut self, kind: MembershipKind, id: &ItemId, member: bool) {
        if member {
            self.get_mut(kind).insert(id.clone());
        } else {
            self.get_mut(kind).remove(id);
        }
    }
}

/// Result of a toggle, for the caller to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The remote accepted the change; `member` is the new membership.
    Applied { member: bool },
    /// The remote call failed. `member` is the membership after rollback
    /// and `reason` is meant to be shown to the user.
    Reverted { member: bool, reason: String },
    /// No session; the user was sent to sign in and nothing changed.
    LoginRequired,
}

/// A record annotated with the session's memberships.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
    pub item: EnrichedItem,
    pub favorite: bool,
    pub watched: bool,
    pub to_watch: bool,
}

impl Annotated {
    pub fn is_member(&self, kind: MembershipKind) -> bool {
        match kind {
            MembershipKind::Favorites => self.favorite,
            MembershipKind::Watched => self.watched,
            MembershipKind::ToWatch => self.to_watch,
        }
    }
}

#[derive(Debug)]
struct Pending {
    generation: u64,
    in_flight: usize,
    confirmed: bool,
    /// Generation whose success set `confirmed`; 0 for the loaded value.
    confirmed_generation: u64,
    latest_failed: bool,
}

#[derive(Default)]
struct State {
    session: Option<Session>,
    sets: MembershipSets,
    pending: HashMap<(MembershipKind, ItemId), Pending>,
}

pub struct MembershipStore {
    remote: Arc<dyn MembershipRemote>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<State>,
}

impl MembershipStore {
    /// A store with empty sets. Use [`MembershipStore::connect`] to load the
    /// session's lists.
    pub fn new(
        remote: Arc<dyn MembershipRemote>,
        navigator: Arc<dyn Navigator>,
        session: Option<Session>,
    ) -> Self {
        MembershipStore {
            remote,
            navigator,
            state: Mutex::new(State {
                session,
                ..Default::default()
            }),
        }
    }

    /// Build a store and load all three lists in parallel.
    ///
    /// If any list fails to load, all three start empty.
    pub async fn connect(
        remote: Arc<dyn MembershipRemote>,
        navigator: Arc<dyn Navigator>,
        session: Option<Session>,
    ) -> Self {
        let store = Self::new(remote, navigator, session);
        store.refresh().await;
        store
    }

    /// Reload all three lists from the remote. No-op without a session.
    pub async fn refresh(&self) {
        let Some(session) = self.session() else {
            debug!("No session, membership lists stay empty");
            return;
        };

        let loaded = futures::try_join!(
            self.remote.fetch(MembershipKind::Favorites, &session),
            self.remote.fetch(MembershipKind::Watched, &session),
            self.remote.fetch(MembershipKind::ToWatch, &session),
        );

        let sets = match loaded {
            Ok((favorites, watched, to_watch)) => MembershipSets {
                favorites: favorites.into_iter().collect(),
                watched: watched.into_iter().collect(),
                to_watch: to_watch.into_iter().collect(),
            },
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "Failed to load membership lists");
                MembershipSets::default()
            }
        };

        info!(
            user_id = %session.user_id,
            favorites = sets.favorites.len(),
            watched = sets.watched.len(),
            to_watch = sets.to_watch.len(),
            "Membership lists loaded"
        );
        let mut state = self.state.lock();
        if state.session.as_ref() == Some(&session) {
            state.sets = sets;
            state.pending.clear();
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.state.lock().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().session.is_some()
    }

    pub fn contains(&self, kind: MembershipKind, id: &ItemId) -> bool {
        self.state.lock().sets.contains(kind, id)
    }

    /// Copy of the current sets.
    pub fn snapshot(&self) -> MembershipSets {
        self.state.lock().sets.clone()
    }

    /// The signed-in user's lists.
    pub fn lists(&self) -> Result<MembershipSets> {
        let state = self.state.lock();
        if state.session.is_none() {
            return Err(Error::Unauthenticated);
        }
        Ok(state.sets.clone())
    }

    /// Flip membership of `id` in list `kind`.
    ///
    /// Without a session this redirects to sign-in and changes nothing.
    /// Otherwise the local set changes immediately and the remote call is
    /// awaited; on failure the change is rolled back unless a newer toggle
    /// for the same key has been made since.
    pub async fn toggle(&self, kind: MembershipKind, id: &ItemId) -> ToggleOutcome {
        let key = (kind, id.clone());
        let (session, target, generation) = {
            let mut state = self.state.lock();
            let Some(session) = state.session.clone() else {
                drop(state);
                debug!(%kind, %id, "Toggle without session, redirecting to login");
                self.navigator.redirect_to_login();
                return ToggleOutcome::LoginRequired;
            };

            let was_member = state.sets.contains(kind, id);
            let target = !was_member;
            state.sets.set(kind, id, target);

            let pending = state.pending.entry(key.clone()).or_insert(Pending {
                generation: 0,
                in_flight: 0,
                confirmed: was_member,
                confirmed_generation: 0,
                latest_failed: false,
            });
            pending.generation += 1;
            pending.in_flight += 1;
            pending.latest_failed = false;
            (session, target, pending.generation)
        };

        let result = if target {
            self.remote.add(kind, &session, id).await
        } else {
            self.remote.remove(kind, &session, id).await
        };

        let mut state = self.state.lock();
        if state.session.as_ref() != Some(&session) {
            // Logged out while the call was in flight; the sets are gone.
            return match result {
                Ok(()) => ToggleOutcome::Applied { member: target },
                Err(e) => ToggleOutcome::Reverted {
                    member: !target,
                    reason: e.to_string(),
                },
            };
        }

        let State { sets, pending, .. } = &mut *state;
        let Some(entry) = pending.get_mut(&key) else {
            // Sets were reloaded while the call was in flight. A write the
            // remote accepted is newer than that snapshot.
            return match result {
                Ok(()) => {
                    sets.set(kind, id, target);
                    ToggleOutcome::Applied { member: target }
                }
                Err(e) => ToggleOutcome::Reverted {
                    member: sets.contains(kind, id),
                    reason: format!("Could not update {kind}: {e}"),
                },
            };
        };

        let latest = entry.generation == generation;
        let outcome = match result {
            Ok(()) => {
                if generation > entry.confirmed_generation {
                    entry.confirmed = target;
                    entry.confirmed_generation = generation;
                }
                if entry.latest_failed {
                    sets.set(kind, id, entry.confirmed);
                }
                debug!(%kind, %id, member = target, "Membership change confirmed");
                ToggleOutcome::Applied { member: target }
            }
            Err(e) => {
                if latest {
                    entry.latest_failed = true;
                    sets.set(kind, id, entry.confirmed);
                }
                warn!(
                    %kind,
                    %id,
                    error = %e,
                    superseded = !latest,
                    "Membership change failed"
                );
                ToggleOutcome::Reverted {
                    member: sets.contains(kind, id),
                    reason: format!("Could not update {kind}: {e}"),
                }
            }
        };

        entry.in_flight -= 1;
        if entry.in_flight == 0 {
            pending.remove(&key);
        }
        outcome
    }

    /// Pair each record with its memberships.
    pub fn annotate(&self, items: &[EnrichedItem]) -> Vec<Annotated> {
        let state = self.state.lock();
        items
            .iter()
            .map(|item| Annotated {
                favorite: state.sets.favorites.contains(item.id()),
                watched: state.sets.watched.contains(item.id()),
                to_watch: state.sets.to_watch.contains(item.id()),
                item: item.clone(),
            })
            .collect()
    }

    /// Log out: drop the session and every list.
    pub fn end_session(&self) {
        let mut state = self.state.lock();
        state.session = None;
        state.sets = MembershipSets::default();
        state.pending.clear();
        info!("Session ended, membership lists discarded");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    pub(crate) struct CountingNavigator {
        pub redirects: AtomicUsize,
    }

    impl Navigator for CountingNavigator {
        fn redirect_to_login(&self) {
            self.redirects.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Fetch(MembershipKind),
        Add(MembershipKind, String),
        Remove(MembershipKind, String),
    }

    /// In-memory remote. The next `fail_writes` writes error, as does every
    /// add when `fail_adds` is set. `gate`, when set, holds each write until
    /// notified; `add_gate` holds adds only. Accepted writes land in
    /// `members`.
    #[derive(Default)]
    pub(crate) struct FakeRemote {
        pub lists: Mutex<HashMap<MembershipKind, Vec<ItemId>>>,
        pub calls: Mutex<Vec<Call>>,
        pub fail_fetch: bool,
        pub fail_writes: Mutex<usize>,
        pub fail_adds: bool,
        pub gate: Option<Arc<Notify>>,
        pub add_gate: Option<Arc<Notify>>,
        pub members: Mutex<HashSet<(MembershipKind, ItemId)>>,
    }

    impl FakeRemote {
        pub(crate) fn with_lists(favorites: &[&str], watched: &[&str], to_watch: &[&str]) -> Self {
            let ids = |xs: &[&str]| xs.iter().map(|x| ItemId::new(*x)).collect::<Vec<_>>();
            let remote = FakeRemote::default();
            {
                let mut lists = remote.lists.lock();
                lists.insert(MembershipKind::Favorites, ids(favorites));
                lists.insert(MembershipKind::Watched, ids(watched));
                lists.insert(MembershipKind::ToWatch, ids(to_watch));
            }
            remote
        }

        async fn write(&self, call: Call) -> Result<()> {
            let is_add = matches!(call, Call::Add(..));
            self.calls.lock().push(call);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let (true, Some(gate)) = (is_add, &self.add_gate) {
                gate.notified().await;
            }
            let mut fail = self.fail_writes.lock();
            if *fail > 0 || (is_add && self.fail_adds) {
                *fail = fail.saturating_sub(1);
                return Err(Error::Api {
                    status: 500,
                    message: "write failed".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MembershipRemote for FakeRemote {
        async fn fetch(&self, kind: MembershipKind, _session: &Session) -> Result<Vec<ItemId>> {
            self.calls.lock().push(Call::Fetch(kind));
            if self.fail_fetch && kind == MembershipKind::ToWatch {
                return Err(Error::Api {
                    status: 500,
                    message: "down".to_string(),
                });
            }
            Ok(self.lists.lock().get(&kind).cloned().unwrap_or_default())
        }

        async fn add(&self, kind: MembershipKind, _session: &Session, id: &ItemId) -> Result<()> {
            self.write(Call::Add(kind, id.to_string())).await?;
            self.members.lock().insert((kind, id.clone()));
            Ok(())
        }

        async fn remove(&self, kind: MembershipKind, _session: &Session, id: &ItemId) -> Result<()> {
            self.write(Call::Remove(kind, id.to_string())).await?;
            self.members.lock().remove(&(kind, id.clone()));
            Ok(())
        }
    }

    fn session() -> Option<Session> {
        Some(Session::new("u1", "tok"))
    }

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    async fn store_with(remote: FakeRemote) -> (MembershipStore, Arc<FakeRemote>, Arc<CountingNavigator>) {
        let remote = Arc::new(remote);
        let nav = Arc::new(CountingNavigator::default());
        let store = MembershipStore::connect(remote.clone(), nav.clone(), session()).await;
        (store, remote, nav)
    }

    // --- Initialization ---

    #[tokio::test]
    async fn test_connect_loads_all_three_lists() {
        let (store, remote, _) =
            store_with(FakeRemote::with_lists(&["a"], &["b"], &["a", "c"])).await;
        assert!(store.contains(MembershipKind::Favorites, &id("a")));
        assert!(store.contains(MembershipKind::Watched, &id("b")));
        assert!(store.contains(MembershipKind::ToWatch, &id("c")));
        assert!(!store.contains(MembershipKind::Watched, &id("a")));
        assert_eq!(remote.calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_all_lists_empty() {
        let mut remote = FakeRemote::with_lists(&["a"], &["b"], &["c"]);
        remote.fail_fetch = true;
        let (store, _, _) = store_with(remote).await;
        assert_eq!(store.snapshot(), MembershipSets::default());
    }

    #[tokio::test]
    async fn test_connect_without_session_fetches_nothing() {
        let remote = Arc::new(FakeRemote::with_lists(&["a"], &[], &[]));
        let nav = Arc::new(CountingNavigator::default());
        let store = MembershipStore::connect(remote.clone(), nav, None).await;
        assert!(!store.is_authenticated());
        assert!(remote.calls.lock().is_empty());
        assert_eq!(store.snapshot(), MembershipSets::default());
    }

    // --- Toggle ---

    #[tokio::test]
    async fn test_toggle_is_a_true_toggle() {
        let (store, remote, _) = store_with(FakeRemote::default()).await;
        let m = id("m1");

        let first = store.toggle(MembershipKind::Favorites, &m).await;
        assert_eq!(first, ToggleOutcome::Applied { member: true });
        assert!(store.contains(MembershipKind::Favorites, &m));

        let second = store.toggle(MembershipKind::Favorites, &m).await;
        assert_eq!(second, ToggleOutcome::Applied { member: false });
        assert!(!store.contains(MembershipKind::Favorites, &m));

        let writes: Vec<Call> = remote
            .calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, Call::Fetch(_)))
            .cloned()
            .collect();
        assert_eq!(
            writes,
            vec![
                Call::Add(MembershipKind::Favorites, "m1".to_string()),
                Call::Remove(MembershipKind::Favorites, "m1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let (store, _, _) = store_with(FakeRemote::with_lists(&[], &["m1"], &[])).await;
        let m = id("m1");

        store.toggle(MembershipKind::Favorites, &m).await;
        assert!(store.contains(MembershipKind::Favorites, &m));
        assert!(store.contains(MembershipKind::Watched, &m));
        assert!(!store.contains(MembershipKind::ToWatch, &m));

        store.toggle(MembershipKind::Favorites, &m).await;
        assert!(store.contains(MembershipKind::Watched, &m));
        assert!(!store.contains(MembershipKind::ToWatch, &m));
    }

    #[tokio::test]
    async fn test_toggle_without_session_redirects_once() {
        let remote = Arc::new(FakeRemote::default());
        let nav = Arc::new(CountingNavigator::default());
        let store = MembershipStore::new(remote.clone(), nav.clone(), None);

        let outcome = store.toggle(MembershipKind::Watched, &id("m1")).await;
        assert_eq!(outcome, ToggleOutcome::LoginRequired);
        assert_eq!(nav.redirects.load(Ordering::SeqCst), 1);
        assert!(!store.contains(MembershipKind::Watched, &id("m1")));
        assert!(remote.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let remote = FakeRemote::with_lists(&["m1"], &[], &[]);
        *remote.fail_writes.lock() = 1;
        let (store, _, _) = store_with(remote).await;

        let outcome = store.toggle(MembershipKind::Favorites, &id("m1")).await;
        match outcome {
            ToggleOutcome::Reverted { member, reason } => {
                assert!(member);
                assert!(reason.contains("favorites"));
            }
            other => panic!("expected rollback, got {other:?}"),
        }
        assert!(store.contains(MembershipKind::Favorites, &id("m1")));
    }

    #[tokio::test]
    async fn test_change_is_visible_before_remote_answers() {
        let gate = Arc::new(Notify::new());
        let remote = FakeRemote {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let (store, _, _) = store_with(remote).await;
        let store = Arc::new(store);

        let task = {
            let store = store.clone();
            tokio::spawn(async move {
                let id = ItemId::new("m1");
                let outcome = store.toggle(MembershipKind::ToWatch, &id).await;
                outcome
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.contains(MembershipKind::ToWatch, &id("m1")));

        gate.notify_one();
        assert_eq!(task.await.unwrap(), ToggleOutcome::Applied { member: true });
    }

    #[tokio::test]
    async fn test_older_failure_does_not_undo_newer_toggle() {
        let gate = Arc::new(Notify::new());
        let remote = FakeRemote {
            gate: Some(gate.clone()),
            fail_adds: true,
            ..Default::default()
        };
        let (store, _, _) = store_with(remote).await;
        let store = Arc::new(store);

        // Add then remove before either call resolves.
        let first = {
            let store = store.clone();
            tokio::spawn(async move {
                let id = ItemId::new("m1");
                let outcome = store.toggle(MembershipKind::Favorites, &id).await;
                outcome
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let store = store.clone();
            tokio::spawn(async move {
                let id = ItemId::new("m1");
                let outcome = store.toggle(MembershipKind::Favorites, &id).await;
                outcome
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.contains(MembershipKind::Favorites, &id("m1")));

        // The add fails but is superseded by the remove, so nothing changes.
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.contains(MembershipKind::Favorites, &id("m1")));

        gate.notify_one();
        assert!(matches!(first.await.unwrap(), ToggleOutcome::Reverted { member: false, .. }));
        assert_eq!(second.await.unwrap(), ToggleOutcome::Applied { member: false });
        assert!(!store.contains(MembershipKind::Favorites, &id("m1")));
    }

    #[tokio::test]
    async fn test_older_success_after_latest_failure_settles_to_remote() {
        let add_gate = Arc::new(Notify::new());
        let remote = FakeRemote {
            add_gate: Some(add_gate.clone()),
            ..Default::default()
        };
        *remote.fail_writes.lock() = 1;
        let (store, remote, _) = store_with(remote).await;
        let store = Arc::new(store);
        let key = (MembershipKind::Favorites, id("m1"));

        // The add is held while a remove for the same key fails outright.
        let add = {
            let store = store.clone();
            tokio::spawn(async move {
                let id = ItemId::new("m1");
                let outcome = store.toggle(MembershipKind::Favorites, &id).await;
                outcome
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let remove = store.toggle(MembershipKind::Favorites, &id("m1")).await;
        assert!(matches!(remove, ToggleOutcome::Reverted { member: false, .. }));
        assert!(!store.contains(MembershipKind::Favorites, &id("m1")));

        add_gate.notify_one();
        assert_eq!(add.await.unwrap(), ToggleOutcome::Applied { member: true });
        assert!(remote.members.lock().contains(&key));
        assert!(store.contains(MembershipKind::Favorites, &id("m1")));
    }

    #[tokio::test]
    async fn test_refresh_during_toggle_keeps_accepted_write() {
        let gate = Arc::new(Notify::new());
        let remote = FakeRemote {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let (store, _, _) = store_with(remote).await;
        let store = Arc::new(store);

        let task = {
            let store = store.clone();
            tokio::spawn(async move {
                let id = ItemId::new("m1");
                let outcome = store.toggle(MembershipKind::Watched, &id).await;
                outcome
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.refresh().await;
        assert!(!store.contains(MembershipKind::Watched, &id("m1")));

        gate.notify_one();
        assert_eq!(task.await.unwrap(), ToggleOutcome::Applied { member: true });
        assert!(store.contains(MembershipKind::Watched, &id("m1")));
    }

    #[tokio::test]
    async fn test_lists_require_session() {
        let (store, _, _) = store_with(FakeRemote::with_lists(&["1"], &[], &[])).await;
        assert!(store.lists().unwrap().favorites.contains(&id("1")));

        store.end_session();
        assert!(matches!(store.lists(), Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_rapid_toggles_each_issue_a_call() {
        let (store, remote, _) = store_with(FakeRemote::default()).await;
        for _ in 0..3 {
            store.toggle(MembershipKind::Watched, &id("m1")).await;
        }
        let writes = remote
            .calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, Call::Fetch(_)))
            .count();
        assert_eq!(writes, 3);
        assert!(store.contains(MembershipKind::Watched, &id("m1")));
    }

    // --- Annotation and logout ---

    #[tokio::test]
    async fn test_annotate_marks_each_kind() {
        let (store, _, _) = store_with(FakeRemote::with_lists(&["1"], &["1", "2"], &["2"])).await;
        let items = vec![
            EnrichedItem::plain(crate::enrich::tests::film("1", "A")),
            EnrichedItem::plain(crate::enrich::tests::film("2", "B")),
        ];
        let cards = store.annotate(&items);
        assert!(cards[0].favorite && cards[0].watched && !cards[0].to_watch);
        assert!(!cards[1].favorite && cards[1].watched && cards[1].to_watch);
        assert!(cards[1].is_member(MembershipKind::ToWatch));
    }

    #[tokio::test]
    async fn test_end_session_discards_lists_and_blocks_toggles() {
        let (store, _, nav) = store_with(FakeRemote::with_lists(&["1"], &[], &[])).await;
        store.end_session();
        assert!(!store.contains(MembershipKind::Favorites, &id("1")));

        let outcome = store.toggle(MembershipKind::Favorites, &id("1")).await;
        assert_eq!(outcome, ToggleOutcome::LoginRequired);
        assert_eq!(nav.redirects.load(Ordering::SeqCst), 1);
    }
}
