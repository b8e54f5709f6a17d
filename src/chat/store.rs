//! In-memory thread list, most recently active first.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{ReentrantMutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::thread::{
    ChatMessage, ChatThread, EnsureThread, NewMessage, ThreadKeyPolicy, non_empty,
};
use crate::observer::{Listeners, Subscription};

/// Local mirror of the user's conversation threads.
///
/// Every mutation promotes the touched thread to index 0 and notifies
/// observers with the full ordered list. Untouched threads keep their
/// relative order.
#[derive(Clone)]
pub struct ChatStore {
    inner: Arc<ChatStoreInner>,
}

struct ChatStoreInner {
    policy: ThreadKeyPolicy,
    threads: RwLock<Vec<ChatThread>>,
    dispatch: ReentrantMutex<()>,
    listeners: Listeners<[ChatThread]>,
}

impl fmt::Debug for ChatStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatStore")
            .field("policy", &self.inner.policy)
            .field("threads", &self.inner.threads.read().len())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore {
    /// Create an empty store using one thread per counterpart.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(ThreadKeyPolicy::default())
    }

    /// Create an empty store with an explicit thread id policy.
    #[must_use]
    pub fn with_policy(policy: ThreadKeyPolicy) -> Self {
        Self {
            inner: Arc::new(ChatStoreInner {
                policy,
                threads: RwLock::new(Vec::new()),
                dispatch: ReentrantMutex::new(()),
                listeners: Listeners::new(),
            }),
        }
    }

    #[must_use]
    pub fn policy(&self) -> ThreadKeyPolicy {
        self.inner.policy
    }

    /// Snapshot of all threads in display order.
    #[must_use]
    pub fn threads(&self) -> Vec<ChatThread> {
        self.inner.threads.read().clone()
    }

    /// Look up a thread by id.
    #[must_use]
    pub fn thread(&self, id: &str) -> Option<ChatThread> {
        self.inner
            .threads
            .read()
            .iter()
            .find(|thread| thread.id == id)
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.threads.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find or create the thread for a counterpart.
    ///
    /// Threads are matched on the counterpart (and subject, per the policy),
    /// never on the id alone, so a mirrored server thread that happens to
    /// carry the derived id is not mistaken for this one.
    ///
    /// On a hit, a non-empty counterpart name refreshes the stored one and the
    /// subject fields are only filled where still empty. Empty values never
    /// overwrite. Either way the thread moves to the front.
    pub fn ensure_thread(&self, params: EnsureThread) -> ChatThread {
        let policy = self.inner.policy;
        let key = policy.thread_id(&params);

        self.update(|threads| {
            let hit = threads
                .iter()
                .position(|t| t.id == key && policy.matches(t, &params))
                .or_else(|| threads.iter().position(|t| policy.matches(t, &params)));

            if let Some(index) = hit {
                let thread = &mut threads[index];
                merge_params(thread, &params);
                let merged = thread.clone();
                promote(threads, index);
                debug!(name: "chat.thread.reused", thread_id = %merged.id, "Reused chat thread");
                merged
            } else {
                let id = unused_id(threads, &key);
                let created = ChatThread {
                    id,
                    counterpart_id: params.counterpart_id,
                    counterpart_name: params.counterpart_name,
                    subject_id: params.subject_id.filter(|v| !v.trim().is_empty()),
                    subject_name: params.subject_name.filter(|v| !v.trim().is_empty()),
                    messages: Vec::new(),
                    viewer_role: None,
                    adoption: None,
                };
                threads.insert(0, created.clone());
                debug!(name: "chat.thread.created", thread_id = %created.id, "Created chat thread");
                created
            }
        })
    }

    /// Append a locally authored message.
    ///
    /// Returns `None` without touching the store when `thread_id` is unknown.
    /// The timestamp never goes backwards within a thread.
    pub fn add_message(&self, thread_id: &str, message: NewMessage) -> Option<ChatMessage> {
        let _dispatch = self.inner.dispatch.lock();
        let index = position(&self.inner.threads.read(), thread_id)?;

        let appended = self.update(|threads| {
            let thread = &mut threads[index];
            let floor = thread.last_message().map_or(i64::MIN, |m| m.created_at);
            let full = ChatMessage {
                id: Uuid::new_v4().to_string(),
                sender: message.sender,
                text: message.text,
                created_at: Utc::now().timestamp_millis().max(floor),
            };
            thread.messages.push(full.clone());
            promote(threads, index);
            full
        });

        debug!(
            name: "chat.message.added",
            thread_id,
            message_id = %appended.id,
            "Appended local message"
        );
        Some(appended)
    }

    /// Append a message issued by the server, keeping its id and timestamp.
    ///
    /// A message whose id is already in the thread is not appended again, but
    /// the thread is still promoted. Returns `None` for an unknown thread.
    pub fn append_remote(&self, thread_id: &str, message: ChatMessage) -> Option<ChatMessage> {
        let _dispatch = self.inner.dispatch.lock();
        let index = position(&self.inner.threads.read(), thread_id)?;

        self.update(|threads| {
            let thread = &mut threads[index];
            if !thread.messages.iter().any(|m| m.id == message.id) {
                thread.messages.push(message.clone());
            }
            promote(threads, index);
        });
        Some(message)
    }

    /// Mirror a thread fetched from the server and move it to the front.
    ///
    /// The server copy wins for fields it fills in. Local messages it does not
    /// list are kept, so nothing already shown disappears.
    pub fn upsert_thread(&self, thread: ChatThread) -> ChatThread {
        self.update(|threads| {
            if let Some(index) = position(threads, &thread.id) {
                let merged = merge_remote(&threads[index], thread);
                threads[index] = merged.clone();
                promote(threads, index);
                merged
            } else {
                threads.insert(0, thread.clone());
                thread
            }
        })
    }

    /// Mirror a server listing.
    ///
    /// Listed threads come first in server order, each merged with its local
    /// copy; later duplicates of an id are dropped. Threads the server did not
    /// list follow in their previous order.
    pub fn replace_all(&self, incoming: Vec<ChatThread>) {
        self.update(|threads| {
            let mut seen = HashSet::new();
            let mut mirrored = Vec::with_capacity(incoming.len().max(threads.len()));
            for thread in incoming {
                if !seen.insert(thread.id.clone()) {
                    continue;
                }
                let thread = match position(threads, &thread.id) {
                    Some(index) => merge_remote(&threads[index], thread),
                    None => thread,
                };
                mirrored.push(thread);
            }
            mirrored.extend(threads.drain(..).filter(|t| !seen.contains(&t.id)));
            *threads = mirrored;
        });
    }

    /// Observe the ordered thread list. No replay of the current value.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[ChatThread]) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(callback)
    }

    /// Mutate under the dispatch guard, then notify with a snapshot.
    fn update<R>(&self, f: impl FnOnce(&mut Vec<ChatThread>) -> R) -> R {
        let _dispatch = self.inner.dispatch.lock();
        let (result, snapshot) = {
            let mut threads = self.inner.threads.write();
            let result = f(&mut threads);
            (result, threads.clone())
        };
        self.inner.listeners.notify(&snapshot);
        result
    }
}

fn position(threads: &[ChatThread], id: &str) -> Option<usize> {
    threads.iter().position(|thread| thread.id == id)
}

/// Move `threads[index]` to the front, keeping everyone else's order.
fn promote(threads: &mut [ChatThread], index: usize) {
    threads[..=index].rotate_right(1);
}

/// `key` if it is free, otherwise a `local:` id no thread uses yet.
fn unused_id(threads: &[ChatThread], key: &str) -> String {
    if position(threads, key).is_none() {
        return key.to_string();
    }
    let mut candidate = format!("local:{key}");
    let mut n = 2;
    while position(threads, &candidate).is_some() {
        candidate = format!("local:{key}:{n}");
        n += 1;
    }
    debug!(name: "chat.thread.id_taken", key, id = %candidate, "Derived id already in use");
    candidate
}

/// Overlay a server copy on the local one.
fn merge_remote(local: &ChatThread, mut remote: ChatThread) -> ChatThread {
    if non_empty(Some(remote.counterpart_name.as_str())).is_none() {
        remote.counterpart_name.clone_from(&local.counterpart_name);
    }
    if non_empty(remote.subject_id.as_deref()).is_none() {
        remote.subject_id.clone_from(&local.subject_id);
    }
    if non_empty(remote.subject_name.as_deref()).is_none() {
        remote.subject_name.clone_from(&local.subject_name);
    }
    remote.viewer_role = remote.viewer_role.or(local.viewer_role);
    if remote.adoption.is_none() {
        remote.adoption.clone_from(&local.adoption);
    }

    let local_only: Vec<ChatMessage> = local
        .messages
        .iter()
        .filter(|m| !remote.messages.iter().any(|r| r.id == m.id))
        .cloned()
        .collect();
    if !local_only.is_empty() {
        remote.messages.extend(local_only);
        remote.messages.sort_by_key(|m| m.created_at);
    }
    remote
}

fn merge_params(thread: &mut ChatThread, params: &EnsureThread) {
    if let Some(name) = non_empty(Some(params.counterpart_name.as_str())) {
        thread.counterpart_name = name.to_string();
    }
    if non_empty(thread.subject_id.as_deref()).is_none() {
        if let Some(subject_id) = non_empty(params.subject_id.as_deref()) {
            thread.subject_id = Some(subject_id.to_string());
        }
    }
    if non_empty(thread.subject_name.as_deref()).is_none() {
        if let Some(subject_name) = non_empty(params.subject_name.as_deref()) {
            thread.subject_name = Some(subject_name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Sender;
    use parking_lot::Mutex;

    fn ids(store: &ChatStore) -> Vec<String> {
        store.threads().into_iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_ensure_then_lookup() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(7, "Ana"));

        let thread = store.thread("7").unwrap();
        assert_eq!(thread.counterpart_id, 7);
        assert!(thread.messages.is_empty());
    }

    #[test]
    fn test_two_messages_scenario() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(7, "Ana"));
        store.add_message("7", NewMessage::from_user("hi")).unwrap();
        store.add_message("7", NewMessage::from_owner("hello")).unwrap();

        let threads = store.threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, "7");
        let texts: Vec<_> = threads[0]
            .messages
            .iter()
            .map(|m| (m.sender, m.text.as_str()))
            .collect();
        assert_eq!(texts, vec![(Sender::User, "hi"), (Sender::Owner, "hello")]);
    }

    #[test]
    fn test_ensure_is_idempotent_and_fills_empty_subject() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread {
            counterpart_id: 7,
            counterpart_name: "Ana".to_string(),
            subject_id: None,
            subject_name: Some(String::new()),
        });
        store.ensure_thread(EnsureThread::new(7, "").with_subject("12", "Milo"));
        let merged = store.ensure_thread(EnsureThread::new(7, "Ana B").with_subject("13", "Rex"));

        assert_eq!(store.len(), 1);
        assert_eq!(merged.counterpart_name, "Ana B");
        assert_eq!(merged.subject_id.as_deref(), Some("12"));
        assert_eq!(merged.subject_name.as_deref(), Some("Milo"));
    }

    #[test]
    fn test_empty_name_does_not_overwrite() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(3, "Bo"));
        let thread = store.ensure_thread(EnsureThread::new(3, "  "));
        assert_eq!(thread.counterpart_name, "Bo");
    }

    #[test]
    fn test_add_message_unknown_thread_is_noop() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(1, "A"));
        store.ensure_thread(EnsureThread::new(2, "B"));
        let before = store.threads();

        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let _sub = store.subscribe(move |_| *sink.lock() += 1);

        assert!(store.add_message("404", NewMessage::from_user("x")).is_none());
        assert_eq!(store.threads(), before);
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_add_message_promotes_and_orders_timestamps() {
        let store = ChatStore::new();
        for id in 1..=3 {
            store.ensure_thread(EnsureThread::new(id, format!("u{id}")));
        }
        assert_eq!(ids(&store), vec!["3", "2", "1"]);

        let first = store.add_message("1", NewMessage::from_user("a")).unwrap();
        let second = store.add_message("1", NewMessage::from_user("b")).unwrap();

        assert_eq!(ids(&store), vec!["1", "3", "2"]);
        let thread = store.thread("1").unwrap();
        assert_eq!(thread.last_message(), Some(&second));
        assert!(second.created_at >= first.created_at);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_ensure_existing_promotes() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(1, "A"));
        store.ensure_thread(EnsureThread::new(2, "B"));
        store.ensure_thread(EnsureThread::new(3, "C"));
        store.ensure_thread(EnsureThread::new(1, "A"));
        assert_eq!(ids(&store), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_subscribers_get_full_list() {
        let store = ChatStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |threads| {
            sink.lock().push(threads.iter().map(|t| t.id.clone()).collect::<Vec<_>>());
        });

        store.ensure_thread(EnsureThread::new(1, "A"));
        store.ensure_thread(EnsureThread::new(2, "B"));
        store.add_message("1", NewMessage::from_user("hi"));

        assert_eq!(
            *seen.lock(),
            vec![vec!["1"], vec!["2", "1"], vec!["1", "2"]]
        );
    }

    #[test]
    fn test_per_subject_policy_splits_threads() {
        let store = ChatStore::with_policy(ThreadKeyPolicy::PerSubject);
        store.ensure_thread(EnsureThread::new(7, "Ana").with_subject("1", "Milo"));
        store.ensure_thread(EnsureThread::new(7, "Ana").with_subject("2", "Rex"));
        assert_eq!(ids(&store), vec!["7:2", "7:1"]);
    }

    #[test]
    fn test_append_remote_dedupes() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(5, "E"));
        let message = ChatMessage {
            id: "srv-1".to_string(),
            sender: Sender::Owner,
            text: "hey".to_string(),
            created_at: 10,
        };
        store.append_remote("5", message.clone()).unwrap();
        store.append_remote("5", message).unwrap();
        assert_eq!(store.thread("5").unwrap().messages.len(), 1);
        let stray = ChatMessage {
            id: "x".to_string(),
            sender: Sender::User,
            text: String::new(),
            created_at: 0,
        };
        assert!(store.append_remote("6", stray).is_none());
    }

    #[test]
    fn test_replace_all_and_upsert() {
        let store = ChatStore::new();
        let mut a = store.ensure_thread(EnsureThread::new(1, "A"));
        let b = store.ensure_thread(EnsureThread::new(2, "B"));

        store.replace_all(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(ids(&store), vec!["1", "2"]);

        a.counterpart_name = "Renamed".to_string();
        store.upsert_thread(b);
        store.upsert_thread(a);
        assert_eq!(ids(&store), vec!["1", "2"]);
        assert_eq!(store.thread("1").unwrap().counterpart_name, "Renamed");
    }

    fn server_thread(id: &str, owner: i64, name: &str) -> ChatThread {
        ChatThread {
            id: id.to_string(),
            counterpart_id: owner,
            counterpart_name: name.to_string(),
            subject_id: None,
            subject_name: None,
            messages: Vec::new(),
            viewer_role: None,
            adoption: None,
        }
    }

    #[test]
    fn test_ensure_does_not_take_over_server_thread_with_same_id() {
        let store = ChatStore::new();
        store.replace_all(vec![server_thread("7", 3, "Bo")]);

        let ensured = store.ensure_thread(EnsureThread::new(7, "Ana"));

        assert_eq!(ensured.counterpart_id, 7);
        assert_eq!(ensured.counterpart_name, "Ana");
        assert_ne!(ensured.id, "7");
        assert_eq!(store.len(), 2);
        let server = store.thread("7").unwrap();
        assert_eq!(server.counterpart_id, 3);
        assert_eq!(server.counterpart_name, "Bo");

        // Asking again reuses the local thread.
        let again = store.ensure_thread(EnsureThread::new(7, ""));
        assert_eq!(again.id, ensured.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ensure_reuses_server_thread_for_same_counterpart() {
        let store = ChatStore::new();
        store.replace_all(vec![server_thread("42", 7, "Ana")]);

        let ensured = store.ensure_thread(EnsureThread::new(7, "Ana B"));
        assert_eq!(ensured.id, "42");
        assert_eq!(ensured.counterpart_name, "Ana B");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_keeps_local_messages() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(7, "Ana").with_subject("12", "Milo"));
        let local = store.add_message("7", NewMessage::from_user("hi")).unwrap();

        let mut remote = server_thread("7", 7, "");
        remote.messages.push(ChatMessage {
            id: "srv-1".to_string(),
            sender: Sender::Owner,
            text: "hello".to_string(),
            created_at: 1,
        });
        let merged = store.upsert_thread(remote);

        let ids: Vec<_> = merged.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["srv-1", local.id.as_str()]);
        assert_eq!(merged.counterpart_name, "Ana");
        assert_eq!(merged.subject_name.as_deref(), Some("Milo"));
        assert_eq!(store.thread("7").unwrap(), merged);
    }

    #[test]
    fn test_replace_all_keeps_unlisted_threads() {
        let store = ChatStore::new();
        store.ensure_thread(EnsureThread::new(5, "E"));
        store.add_message("5", NewMessage::from_user("kept"));

        store.replace_all(Vec::new());
        assert_eq!(ids(&store), vec!["5"]);
        assert_eq!(store.thread("5").unwrap().messages.len(), 1);

        store.replace_all(vec![server_thread("2", 2, "B"), server_thread("1", 1, "A")]);
        assert_eq!(ids(&store), vec!["2", "1", "5"]);
    }

    #[test]
    fn test_listener_may_mutate_store() {
        let store = ChatStore::new();
        let writer = store.clone();
        let _sub = store.subscribe(move |threads| {
            if threads.len() == 1 {
                writer.ensure_thread(EnsureThread::new(99, "echo"));
            }
        });

        store.ensure_thread(EnsureThread::new(1, "A"));
        assert_eq!(ids(&store), vec!["99", "1"]);
    }
}
