//! The node graph and its evaluation loop.
//!
//! Invariants:
//! - a node can only depend on nodes created before it, so ids are a
//!   topological order and the graph is acyclic by construction;
//! - a producer starts at most once per generation, and only when every
//!   upstream is settled (complete or error);
//! - invalidation aborts the node's outstanding producer call and bumps the
//!   generation, so a superseded call is never polled again and a result
//!   from an older generation is never applied.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{AbortHandle, Abortable, Aborted, LocalBoxFuture};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::{debug, info, warn};

use crate::node::{Input, Inputs, Node, NodeId, NodeStatus, Resolved, Value};

type Producer = Box<dyn Fn(Inputs) -> LocalBoxFuture<'static, anyhow::Result<Value>>>;

struct Completion {
    id: NodeId,
    generation: u64,
    outcome: anyhow::Result<Value>,
}

struct Slot {
    name: &'static str,
    upstream: Vec<NodeId>,
    downstream: Vec<NodeId>,
    /// `None` for input nodes.
    producer: Option<Producer>,
    default: Value,
    value: Value,
    status: NodeStatus,
    error: Option<String>,
    requested: bool,
    /// Set while a producer call for the current generation is outstanding.
    in_flight: Option<AbortHandle>,
    generation: u64,
    revision: u64,
}

/// One query context's graph of remote-data nodes.
pub struct DataStore {
    slots: Vec<Slot>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Result<Completion, Aborted>>>,
    stale_discards: u64,
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            in_flight: FuturesUnordered::new(),
            stale_discards: 0,
        }
    }

    // ── Declaration ──────────────────────────────────────────────────────────

    /// Declare an input node. Inputs are always complete.
    pub fn input<T>(&mut self, name: &'static str, value: T) -> Input<T>
    where
        T: Any + Send + Sync,
    {
        let value: Value = Arc::new(value);
        let id = self.push_slot(Slot {
            name,
            upstream: Vec::new(),
            downstream: Vec::new(),
            producer: None,
            default: Arc::clone(&value),
            value,
            status: NodeStatus::Complete,
            error: None,
            requested: false,
            in_flight: None,
            generation: 0,
            revision: 0,
        });
        Input::new(id)
    }

    /// Declare a node computed by `producer` once all of `upstream` have settled.
    /// `default` is exposed while pending and after a failure.
    pub fn node<T, F, Fut>(
        &mut self,
        name: &'static str,
        default: T,
        upstream: &[NodeId],
        producer: F,
    ) -> Node<T>
    where
        T: Any + Send + Sync,
        F: Fn(Inputs) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<T>> + 'static,
    {
        let producer: Producer = Box::new(move |inputs| {
            let fut = producer(inputs);
            async move { fut.await.map(|value| Arc::new(value) as Value) }.boxed_local()
        });
        let default: Value = Arc::new(default);

        let mut deps: Vec<NodeId> = upstream.to_vec();
        deps.sort_unstable();
        deps.dedup();
        debug_assert!(deps.iter().all(|dep| dep.0 < self.slots.len()));

        let id = self.push_slot(Slot {
            name,
            upstream: deps.clone(),
            downstream: Vec::new(),
            producer: Some(producer),
            default: Arc::clone(&default),
            value: default,
            status: NodeStatus::Pending,
            error: None,
            requested: false,
            in_flight: None,
            generation: 0,
            revision: 0,
        });
        for dep in deps {
            self.slots[dep.0].downstream.push(id);
        }
        Node::new(id)
    }

    fn push_slot(&mut self, slot: Slot) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(slot);
        id
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Current value and status. The first call starts evaluation of the node
    /// and, transitively, of everything it waits for.
    ///
    /// # Panics
    ///
    /// If `node` was declared on a different store.
    pub fn resolve<T>(&mut self, node: Node<T>) -> Resolved<T>
    where
        T: Any + Send + Sync,
    {
        let id = node.id();
        if !self.slots[id.0].requested {
            self.slots[id.0].requested = true;
            debug!(node = self.slots[id.0].name, "first resolve");
        }
        self.schedule(id);
        self.peek(node)
    }

    /// Like [`resolve`](Self::resolve) but never starts evaluation.
    ///
    /// # Panics
    ///
    /// If `node` was declared on a different store.
    pub fn peek<T>(&self, node: Node<T>) -> Resolved<T>
    where
        T: Any + Send + Sync,
    {
        let slot = &self.slots[node.id().0];
        let value = Arc::clone(&slot.value)
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("node `{}` read through a foreign handle", slot.name));
        Resolved::new(value, slot.status)
    }

    pub fn status(&self, id: impl Into<NodeId>) -> NodeStatus {
        self.slots[id.into().0].status
    }

    /// Message of the last producer failure, while the node is in `error`.
    pub fn error(&self, id: impl Into<NodeId>) -> Option<&str> {
        self.slots[id.into().0].error.as_deref()
    }

    /// Bumped every time the node's exposed value changes.
    pub fn revision(&self, id: impl Into<NodeId>) -> u64 {
        self.slots[id.into().0].revision
    }

    pub fn name(&self, id: impl Into<NodeId>) -> &'static str {
        self.slots[id.into().0].name
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Producer calls started for the current generation and not yet applied.
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|slot| slot.in_flight.is_some()).count()
    }

    /// Producer calls abandoned or results dropped because their node was
    /// invalidated first.
    pub fn stale_discards(&self) -> u64 {
        self.stale_discards
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    /// Replace an input's value and invalidate everything downstream of it.
    pub fn set_input<T>(&mut self, input: Input<T>, value: T)
    where
        T: Any + Send + Sync,
    {
        let slot = &mut self.slots[input.id().0];
        slot.value = Arc::new(value);
        slot.revision += 1;
        debug!(input = slot.name, "input changed");
        self.invalidate(input.id());
    }

    /// Send `id` and all of its transitive dependents back to pending, then
    /// re-schedule the ones that have been resolved before. Input nodes keep
    /// their value; only their dependents are reset.
    pub fn invalidate(&mut self, id: impl Into<NodeId>) {
        let root = id.into();
        let mut affected = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(next) = stack.pop() {
            if affected.insert(next) {
                stack.extend(self.slots[next.0].downstream.iter().copied());
            }
        }

        for &node in &affected {
            let slot = &mut self.slots[node.0];
            if slot.producer.is_none() {
                continue;
            }
            if let Some(handle) = slot.in_flight.take() {
                handle.abort();
                self.stale_discards += 1;
                debug!(node = slot.name, generation = slot.generation, "aborting in-flight producer");
            }
            slot.generation += 1;
            slot.status = NodeStatus::Pending;
            slot.value = Arc::clone(&slot.default);
            slot.error = None;
            slot.revision += 1;
        }

        // Ascending ids are a topological order.
        for node in affected {
            if self.slots[node.0].requested {
                self.schedule(node);
            }
        }
    }

    // ── Evaluation ───────────────────────────────────────────────────────────

    fn schedule(&mut self, id: NodeId) {
        let slot = &self.slots[id.0];
        if slot.producer.is_none() || slot.status.is_settled() || slot.in_flight.is_some() {
            return;
        }

        let upstream = slot.upstream.clone();
        let mut waiting = Vec::new();
        for dep in upstream {
            self.slots[dep.0].requested = true;
            self.schedule(dep);
            if !self.slots[dep.0].status.is_settled() {
                waiting.push(self.slots[dep.0].name);
            }
        }

        if !waiting.is_empty() {
            debug!(node = self.slots[id.0].name, ?waiting, "waiting on upstream");
            return;
        }
        self.start(id);
    }

    fn start(&mut self, id: NodeId) {
        let slot = &self.slots[id.0];
        let Some(producer) = slot.producer.as_ref() else {
            return;
        };

        let inputs = Inputs::new(
            slot.upstream
                .iter()
                .map(|dep| {
                    let up = &self.slots[dep.0];
                    (*dep, (up.name, Arc::clone(&up.value)))
                })
                .collect::<HashMap<_, _>>(),
        );
        let generation = slot.generation;
        let fut = producer(inputs);
        debug!(node = slot.name, generation, "starting producer");

        let (handle, registration) = AbortHandle::new_pair();
        let call = async move { Completion { id, generation, outcome: fut.await } };
        self.in_flight.push(Abortable::new(call, registration).boxed_local());
        self.slots[id.0].in_flight = Some(handle);
    }

    fn apply(&mut self, completion: Result<Completion, Aborted>) {
        // Already counted when the call was aborted.
        let Ok(Completion { id, generation, outcome }) = completion else {
            return;
        };
        let slot = &mut self.slots[id.0];

        if generation != slot.generation {
            self.stale_discards += 1;
            debug!(
                node = slot.name,
                stale = generation,
                current = slot.generation,
                "discarding stale result"
            );
            return;
        }

        slot.in_flight = None;
        slot.revision += 1;
        match outcome {
            Ok(value) => {
                slot.value = value;
                slot.status = NodeStatus::Complete;
                slot.error = None;
                info!(node = slot.name, "node complete");
            }
            Err(e) => {
                slot.value = Arc::clone(&slot.default);
                slot.status = NodeStatus::Error;
                slot.error = Some(format!("{e:#}"));
                warn!(node = slot.name, error = %e, "producer failed, keeping default");
            }
        }

        let downstream = slot.downstream.clone();
        for dep in downstream {
            if self.slots[dep.0].requested {
                self.schedule(dep);
            }
        }
    }

    /// Apply every completion that is ready right now, without waiting.
    /// Returns how many were processed (aborted calls included).
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Some(Some(completion)) = self.in_flight.next().now_or_never() {
            self.apply(completion);
            processed += 1;
        }
        processed
    }

    /// Wait for the next producer to finish and apply it.
    /// Returns `false` when nothing is left to poll.
    pub async fn step(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Drive producers until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<(&str, NodeStatus)> = self.slots.iter().map(|s| (s.name, s.status)).collect();
        f.debug_struct("DataStore")
            .field("nodes", &nodes)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use futures::channel::oneshot;

    /// Hands out one gate per call; a call with a gate waits until it is opened.
    #[derive(Clone, Default)]
    struct Gates(Arc<Mutex<Vec<oneshot::Receiver<()>>>>);

    impl Gates {
        fn hold(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.0.lock().unwrap().push(rx);
            tx
        }

        fn take(&self) -> Option<oneshot::Receiver<()>> {
            let mut gates = self.0.lock().unwrap();
            if gates.is_empty() { None } else { Some(gates.remove(0)) }
        }
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[tokio::test]
    async fn test_pending_default_until_settled() {
        let mut store = DataStore::new();
        let n = store.node("answer", 0u32, &[], |_| async { anyhow::Ok(42u32) });

        let first = store.resolve(n);
        assert!(first.is_pending());
        assert_eq!(*first.value, 0);

        store.settle().await;
        let done = store.resolve(n);
        assert!(done.is_complete());
        assert_eq!(*done.value, 42);
    }

    #[tokio::test]
    async fn test_unresolved_nodes_never_run() {
        let mut store = DataStore::new();
        let calls = counter();
        let c = Arc::clone(&calls);
        let _lazy = store.node("lazy", (), &[], move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            async { anyhow::Ok(()) }
        });

        store.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waits_for_all_upstreams() {
        let mut store = DataStore::new();
        let gates = Gates::default();
        let gate_a = gates.hold();
        let gate_b = gates.hold();

        let g = gates.clone();
        let a = store.node("a", 0u32, &[], move |_| {
            let gate = g.take();
            async move {
                if let Some(gate) = gate { let _ = gate.await; }
                anyhow::Ok(1u32)
            }
        });
        let g = gates.clone();
        let b = store.node("b", 0u32, &[], move |_| {
            let gate = g.take();
            async move {
                if let Some(gate) = gate { let _ = gate.await; }
                anyhow::Ok(2u32)
            }
        });

        let calls = counter();
        let c = Arc::clone(&calls);
        let sum = store.node("sum", 0u32, &[a.id(), b.id()], move |inputs| {
            c.fetch_add(1, Ordering::SeqCst);
            async move { anyhow::Ok(*inputs.get(a)? + *inputs.get(b)?) }
        });

        assert!(store.resolve(sum).is_pending());
        assert_eq!(store.in_flight(), 2);

        gate_a.send(()).unwrap();
        assert!(store.step().await);
        assert_eq!(store.status(a), NodeStatus::Complete);
        assert_eq!(store.status(sum), NodeStatus::Pending);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "must not fire on partial completion");

        gate_b.send(()).unwrap();
        store.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*store.resolve(sum).value, 3);
    }

    #[tokio::test]
    async fn test_input_change_invalidates_transitively() {
        let mut store = DataStore::new();
        let symbol = store.input("symbol", "BRAF".to_string());
        let gene = store.node("gene", String::new(), &[symbol.id()], move |inputs| async move {
            anyhow::Ok(format!("gene:{}", inputs.get(symbol.node())?))
        });
        let rows = store.node("rows", Vec::<String>::new(), &[gene.id()], move |inputs| async move {
            anyhow::Ok(vec![format!("{}/row", inputs.get(gene)?)])
        });

        store.resolve(rows);
        store.settle().await;
        assert_eq!(*store.resolve(rows).value, vec!["gene:BRAF/row".to_string()]);
        let rev = store.revision(rows);

        store.set_input(symbol, "KRAS".to_string());
        assert_eq!(store.status(gene), NodeStatus::Pending);
        let reset = store.peek(rows);
        assert!(reset.is_pending());
        assert!(reset.value.is_empty(), "invalidated node exposes its default");
        assert!(store.revision(rows) > rev);

        store.settle().await;
        assert_eq!(*store.resolve(rows).value, vec!["gene:KRAS/row".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let mut store = DataStore::new();
        let broken = store.node("broken", vec![7u32], &[], |_| async {
            Err::<Vec<u32>, _>(anyhow::anyhow!("service unavailable"))
        });
        let sibling = store.node("sibling", 0u32, &[], |_| async { anyhow::Ok(5u32) });
        let child = store.node("child", 0usize, &[broken.id()], move |inputs| async move {
            anyhow::Ok(inputs.get(broken)?.len())
        });

        store.resolve(sibling);
        store.resolve(child);
        store.settle().await;

        let b = store.resolve(broken);
        assert!(b.is_error());
        assert_eq!(*b.value, vec![7]);
        assert!(store.error(broken).unwrap().contains("service unavailable"));
        assert_eq!(*store.resolve(sibling).value, 5);
        let c = store.resolve(child);
        assert!(c.is_complete());
        assert_eq!(*c.value, 1, "child ran on the failed node's default");
    }

    #[tokio::test]
    async fn test_stale_call_is_aborted() {
        let mut store = DataStore::new();
        let gates = Gates::default();
        let release_first = gates.hold();

        let symbol = store.input("symbol", "BRAF".to_string());
        let g = gates.clone();
        let rows = store.node("rows", String::new(), &[symbol.id()], move |inputs| {
            let gate = g.take();
            async move {
                let symbol = inputs.get(symbol.node())?;
                if let Some(gate) = gate { let _ = gate.await; }
                anyhow::Ok(format!("rows for {symbol}"))
            }
        });

        store.resolve(rows);
        assert_eq!(store.pump(), 0, "first call is held");
        assert_eq!(store.in_flight(), 1);

        store.set_input(symbol, "KRAS".to_string());
        assert_eq!(store.stale_discards(), 1);
        assert_eq!(store.in_flight(), 1, "only the KRAS call is outstanding");
        assert_eq!(store.pump(), 2, "aborted call and KRAS call both drain");
        assert_eq!(store.resolve(rows).value.as_str(), "rows for KRAS");

        assert!(release_first.send(()).is_err(), "aborted call was dropped");
        store.settle().await;
        assert_eq!(store.stale_discards(), 1);
        let current = store.resolve(rows);
        assert!(current.is_complete());
        assert_eq!(current.value.as_str(), "rows for KRAS");
    }

    #[tokio::test]
    async fn test_settle_does_not_wait_for_abandoned_call() {
        let mut store = DataStore::new();
        let gates = Gates::default();
        let _never_released = gates.hold();

        let symbol = store.input("symbol", "BRAF".to_string());
        let g = gates.clone();
        let rows = store.node("rows", String::new(), &[symbol.id()], move |inputs| {
            let gate = g.take();
            async move {
                let symbol = inputs.get(symbol.node())?;
                if let Some(gate) = gate { let _ = gate.await; }
                anyhow::Ok(format!("rows for {symbol}"))
            }
        });

        store.resolve(rows);
        store.set_input(symbol, "KRAS".to_string());

        let settled = tokio::time::timeout(std::time::Duration::from_secs(5), store.settle()).await;
        assert!(settled.is_ok(), "settle hung on the abandoned BRAF call");
        assert_eq!(store.in_flight(), 0);
        assert_eq!(store.resolve(rows).value.as_str(), "rows for KRAS");
    }

    #[tokio::test]
    async fn test_invalidate_refetches_completed_node() {
        let mut store = DataStore::new();
        let calls = counter();
        let c = Arc::clone(&calls);
        let n = store.node("counted", 0usize, &[], move |_| {
            let call = c.fetch_add(1, Ordering::SeqCst) + 1;
            async move { anyhow::Ok(call) }
        });
        let child = store.node("child", 0usize, &[n.id()], move |inputs| async move {
            anyhow::Ok(*inputs.get(n)? * 10)
        });

        store.resolve(child);
        store.settle().await;
        assert_eq!(*store.resolve(child).value, 10);

        store.invalidate(n);
        assert_eq!(store.status(n), NodeStatus::Pending);
        assert_eq!(store.status(child), NodeStatus::Pending);
        assert_eq!(*store.peek(n).value, 0);

        store.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*store.resolve(n).value, 2);
        assert_eq!(*store.resolve(child).value, 20);
        assert_eq!(store.stale_discards(), 0);
    }

    #[tokio::test]
    async fn test_peek_does_not_start() {
        let mut store = DataStore::new();
        let n = store.node("n", 1u8, &[], |_| async { anyhow::Ok(2u8) });
        assert_eq!(*store.peek(n).value, 1);
        assert_eq!(store.in_flight(), 0);
    }
}
