use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Params, and Actions)
// =============================================================================

/// Errors produced by the actor plumbing itself.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped the response")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Trait that any domain entity must implement to be managed by ResourceActor
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    fn id(&self) -> &Self::Id;

    /// Construct the full Entity from the ID and creation params
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Called before an existing item is overwritten by `Put`.
    fn on_replace(&self, _next: &Self) -> Result<(), String> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, String>;
}

/// Predicate shipped to the actor for `List` and `RemoveWhere`.
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Put {
        item: T,
        respond_to: Response<()>,
    },
    List {
        filter: Filter<T>,
        respond_to: Response<Vec<T>>,
    },
    RemoveWhere {
        filter: Filter<T>,
        respond_to: Response<usize>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<(T, T::ActionResult)>,
    },
}

impl<T: Entity> Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create { params, .. } => f.debug_struct("Create").field("params", params).finish(),
            Self::Get { id, .. } => f.debug_struct("Get").field("id", id).finish(),
            Self::Put { item, .. } => f.debug_struct("Put").field("id", item.id()).finish(),
            Self::List { .. } => f.write_str("List"),
            Self::RemoveWhere { .. } => f.write_str("RemoveWhere"),
            Self::Action { id, action, .. } => f
                .debug_struct("Action")
                .field("id", id)
                .field("action", action)
                .finish(),
        }
    }
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let id = (self.next_id_fn)();
                    let result = T::from_create_params(id.clone(), params).and_then(|mut item| {
                        item.on_create()?;
                        Ok(item)
                    });
                    match result {
                        Ok(item) => {
                            self.store.insert(id, item.clone());
                            let _ = respond_to.send(Ok(item));
                        }
                        Err(e) => {
                            let _ = respond_to.send(Err(FrameworkError::Rejected(e)));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Put { item, respond_to } => {
                    if let Some(existing) = self.store.get(item.id()) {
                        if let Err(e) = existing.on_replace(&item) {
                            let _ = respond_to.send(Err(FrameworkError::Rejected(e)));
                            continue;
                        }
                    }
                    self.store.insert(item.id().clone(), item);
                    let _ = respond_to.send(Ok(()));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items = self.store.values().filter(|item| filter(item)).cloned().collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::RemoveWhere { filter, respond_to } => {
                    let before = self.store.len();
                    self.store.retain(|_, item| !filter(item));
                    let _ = respond_to.send(Ok(before - self.store.len()));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    if let Some(item) = self.store.get_mut(&id) {
                        let result = item
                            .handle_action(action)
                            .map(|outcome| (item.clone(), outcome))
                            .map_err(FrameworkError::Rejected);
                        let _ = respond_to.send(result);
                    } else {
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
            }
        }
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn put(&self, item: T) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Put { item, respond_to }).await
    }

    pub async fn list(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, FrameworkError> {
        let filter: Filter<T> = Box::new(filter);
        self.request(|respond_to| ResourceRequest::List { filter, respond_to }).await
    }

    pub async fn remove_where(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<usize, FrameworkError> {
        let filter: Filter<T> = Box::new(filter);
        self.request(|respond_to| ResourceRequest::RemoveWhere { filter, respond_to }).await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<(T, T::ActionResult), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        id: String,
        owner: String,
        value: u32,
        frozen: bool,
    }

    #[derive(Debug)]
    struct CounterCreate {
        owner: String,
    }

    #[derive(Debug)]
    enum CounterAction {
        Bump,
        Freeze,
    }

    impl Entity for Counter {
        type Id = String;
        type CreateParams = CounterCreate;
        type Action = CounterAction;
        type ActionResult = bool;

        fn id(&self) -> &String {
            &self.id
        }

        fn from_create_params(id: String, params: CounterCreate) -> Result<Self, String> {
            if params.owner.is_empty() {
                return Err("owner required".to_string());
            }
            Ok(Self { id, owner: params.owner, value: 0, frozen: false })
        }

        fn on_replace(&self, next: &Self) -> Result<(), String> {
            if self.frozen {
                Err(format!("{} is frozen", self.id))
            } else if next.value < self.value {
                Err("value may not decrease".to_string())
            } else {
                Ok(())
            }
        }

        fn handle_action(&mut self, action: CounterAction) -> Result<bool, String> {
            match action {
                CounterAction::Bump if self.frozen => Ok(false),
                CounterAction::Bump => {
                    self.value += 1;
                    Ok(true)
                }
                CounterAction::Freeze => {
                    self.frozen = true;
                    Ok(true)
                }
            }
        }
    }

    fn spawn_counters() -> ResourceClient<Counter> {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("counter_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, client) = ResourceActor::new(10, next_id);
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn test_create_put_and_actions() {
        let client = spawn_counters();

        let created = client.create(CounterCreate { owner: "alice".into() }).await.unwrap();
        assert_eq!(created.id, "counter_1");

        let (after, changed) = client
            .perform_action(created.id.clone(), CounterAction::Bump)
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(after.value, 1);

        let mut next = after.clone();
        next.value = 5;
        client.put(next).await.unwrap();
        assert_eq!(client.get(created.id.clone()).await.unwrap().unwrap().value, 5);

        // The replace hook guards the stored value
        let mut lower = after;
        lower.value = 0;
        assert!(matches!(client.put(lower).await, Err(FrameworkError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_create_rejected_by_params() {
        let client = spawn_counters();
        let result = client.create(CounterCreate { owner: String::new() }).await;
        assert_eq!(result, Err(FrameworkError::Rejected("owner required".to_string())));
    }

    #[tokio::test]
    async fn test_list_and_remove_where() {
        let client = spawn_counters();
        for owner in ["alice", "bob", "alice"] {
            client.create(CounterCreate { owner: owner.into() }).await.unwrap();
        }

        let alice = client.list(|c: &Counter| c.owner == "alice").await.unwrap();
        assert_eq!(alice.len(), 2);

        let removed = client.remove_where(|c: &Counter| c.owner == "alice").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(client.list(|_: &Counter| true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_action_on_missing_item() {
        let client = spawn_counters();
        let result = client.perform_action("counter_9".to_string(), CounterAction::Freeze).await;
        assert_eq!(result, Err(FrameworkError::NotFound("counter_9".to_string())));
    }
}
