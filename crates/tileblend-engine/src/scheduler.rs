//! Per-resource operation scheduling.
//!
//! Each image owns one FIFO queue of pending operations and one `locked`
//! flag. The `drain` loop dispatches the head operation only when the
//! resource is unlocked and the head's precondition holds; an unmet
//! precondition parks the whole queue (head-of-line blocking) until a
//! completion or a cross-resource readiness change re-drives it. At most
//! one operation per resource is ever in flight.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tileblend_core::{codec, composite_over, Raster};
use tokio::sync::{oneshot, watch};

use crate::error::EngineError;
use crate::image::{EncodeOptions, Image, Lifecycle};

/// Count of submitted-but-not-completed operations across the engine.
///
/// The host integration layer can use this to keep its event loop alive
/// while work is outstanding.
static PENDING: AtomicUsize = AtomicUsize::new(0);

/// Number of operations that have been submitted but have not yet
/// resolved their completion.
pub fn pending_operations() -> usize {
    PENDING.load(Ordering::Relaxed)
}

pub(crate) fn work_started() {
    PENDING.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn work_finished() {
    PENDING.fetch_sub(1, Ordering::Relaxed);
}

/// State shared between an image handle and its in-flight operations.
pub(crate) struct Shared {
    pub(crate) id: u64,
    state: Mutex<State>,
    /// Tracks whether the raster is present; overlay gating subscribes to
    /// this instead of locking the secondary's state.
    ready: watch::Sender<bool>,
}

pub(crate) struct State {
    pub(crate) lifecycle: Lifecycle,
    locked: bool,
    queue: VecDeque<Op>,
    pub(crate) raster: Option<Arc<Raster>>,
}

impl Shared {
    pub(crate) fn new(id: u64) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            id,
            state: Mutex::new(State {
                lifecycle: Lifecycle::Empty,
                locked: false,
                queue: VecDeque::new(),
                raster: None,
            }),
            ready,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("image state poisoned")
    }

    pub(crate) fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub(crate) fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }
}

/// A pending operation: one variant per kind, each carrying only the
/// payload it needs. The precondition is a per-variant check evaluated
/// against the owning resource's state at dispatch time.
pub(crate) enum Op {
    Load {
        bytes: Vec<u8>,
        done: oneshot::Sender<Result<(), EngineError>>,
    },
    Encode {
        options: EncodeOptions,
        done: oneshot::Sender<Result<Vec<u8>, EngineError>>,
    },
    Overlay {
        source: Image,
        done: oneshot::Sender<Result<(), EngineError>>,
    },
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Op::Load { .. } => "load",
            Op::Encode { .. } => "encode",
            Op::Overlay { .. } => "overlay",
        }
    }

    /// Whether this operation may be dispatched right now.
    fn precondition(&self, state: &State) -> bool {
        match self {
            // Attempting a load is always legal.
            Op::Load { .. } => true,
            Op::Encode { .. } => state.raster.is_some(),
            // Overlay additionally needs the secondary's raster.
            Op::Overlay { source, .. } => state.raster.is_some() && source.is_loaded(),
        }
    }
}

/// Enqueue an operation and drive the queue.
pub(crate) fn submit(shared: &Arc<Shared>, op: Op) {
    work_started();
    tracing::debug!(image = shared.id, op = op.name(), "operation submitted");

    // An overlay gated on a not-yet-loaded secondary parks the queue;
    // arrange a re-drive for when the secondary becomes ready.
    if let Op::Overlay { source, .. } = &op {
        if !source.is_loaded() {
            let mut ready = source.shared().subscribe_ready();
            let target = Arc::clone(shared);
            tokio::spawn(async move {
                loop {
                    if *ready.borrow_and_update() {
                        break;
                    }
                    if ready.changed().await.is_err() {
                        // Secondary dropped without ever loading; the
                        // queue stays parked, as designed.
                        return;
                    }
                }
                drain(&target);
            });
        }
    }

    shared.lock().queue.push_back(op);
    drain(shared);
}

/// Dispatch loop: runs after every enqueue and after every completion.
pub(crate) fn drain(shared: &Arc<Shared>) {
    loop {
        let (op, snapshot) = {
            let mut state = shared.lock();
            if state.locked {
                return;
            }
            let Some(head) = state.queue.front() else {
                return;
            };
            if !head.precondition(&state) {
                // Head-of-line blocking: the queue does not advance.
                return;
            }
            let Some(op) = state.queue.pop_front() else {
                return;
            };
            state.locked = true;
            state.lifecycle = match &op {
                Op::Load { .. } if state.raster.is_none() => Lifecycle::Loading,
                _ => Lifecycle::Processing,
            };
            let snapshot = state.raster.clone();
            (op, snapshot)
        };
        tracing::debug!(image = shared.id, op = op.name(), "operation dispatched");
        dispatch(Arc::clone(shared), op, snapshot);
    }
}

/// Run one dispatched operation on the worker pool.
///
/// `snapshot` is the resource's raster as of dispatch; preconditions
/// guarantee it is present for encode and overlay.
fn dispatch(shared: Arc<Shared>, op: Op, snapshot: Option<Arc<Raster>>) {
    tokio::spawn(async move {
        match op {
            Op::Load { bytes, done } => {
                let result = tokio::task::spawn_blocking(move || codec::decode(&bytes)).await;
                let outcome = match result {
                    Ok(Ok(raster)) => {
                        shared.lock().raster = Some(Arc::new(raster));
                        Ok(())
                    }
                    Ok(Err(e)) => Err(EngineError::Decode(e)),
                    Err(e) => Err(EngineError::Worker(e.to_string())),
                };
                let _ = done.send(outcome);
                finish(&shared, "load");
            }
            Op::Encode { options, done } => {
                let outcome = match snapshot {
                    Some(raster) => {
                        let include_alpha = options.include_alpha;
                        let result = tokio::task::spawn_blocking(move || {
                            codec::encode(&raster, include_alpha)
                        })
                        .await;
                        match result {
                            Ok(Ok(bytes)) => Ok(bytes),
                            Ok(Err(e)) => Err(EngineError::Encode(e)),
                            Err(e) => Err(EngineError::Worker(e.to_string())),
                        }
                    }
                    None => Err(EngineError::Argument("image is not loaded".to_string())),
                };
                let _ = done.send(outcome);
                finish(&shared, "encode");
            }
            Op::Overlay { source, done } => {
                // Snapshot the secondary under its own short lock; the
                // composite then reads immutable data with no lock held.
                let src = source.shared().lock().raster.clone();
                let outcome = match (snapshot, src) {
                    (Some(dst), Some(src)) => {
                        let result = tokio::task::spawn_blocking(move || {
                            let mut out = (*dst).clone();
                            composite_over(&mut out, &src).map(|()| out)
                        })
                        .await;
                        match result {
                            Ok(Ok(out)) => {
                                shared.lock().raster = Some(Arc::new(out));
                                Ok(())
                            }
                            // The target keeps its prior contents.
                            Ok(Err(e)) => Err(EngineError::Composite(e)),
                            Err(e) => Err(EngineError::Worker(e.to_string())),
                        }
                    }
                    _ => Err(EngineError::Argument("image is not loaded".to_string())),
                };
                let _ = done.send(outcome);
                finish(&shared, "overlay");
            }
        }
    });
}

/// Unlock the resource after a completion and re-drive its queue.
fn finish(shared: &Arc<Shared>, op: &'static str) {
    let ready = {
        let mut state = shared.lock();
        state.locked = false;
        state.lifecycle = if state.raster.is_some() {
            Lifecycle::Ready
        } else {
            Lifecycle::Empty
        };
        state.raster.is_some()
    };
    shared.ready.send_replace(ready);
    work_finished();
    tracing::debug!(image = shared.id, op, "operation completed");
    drain(shared);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tileblend_core::codec::encode as encode_png;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        encode_png(&Raster::filled(width, height, rgba), true).unwrap()
    }

    #[tokio::test]
    async fn test_strict_fifo_with_head_of_line_blocking() {
        let a = Image::new();
        a.load(png_bytes(4, 4, [255, 0, 0, 255])).wait().await.unwrap();
        let b = Image::new();

        let order = Arc::new(Mutex::new(Vec::new()));

        // Overlay against the not-yet-loaded B, then an encode whose own
        // precondition (A ready) is already satisfied.
        let overlay = a.overlay(&b);
        let encode = a.encode(EncodeOptions::default());

        let overlay_order = Arc::clone(&order);
        let overlay_task = tokio::spawn(async move {
            overlay.wait().await.unwrap();
            overlay_order.lock().unwrap().push("overlay");
        });
        let encode_order = Arc::clone(&order);
        let encode_task = tokio::spawn(async move {
            encode.wait().await.unwrap();
            encode_order.lock().unwrap().push("encode");
        });

        // Neither may run while the head's precondition is unmet.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(order.lock().unwrap().is_empty());

        b.load(png_bytes(4, 4, [0, 0, 255, 128])).wait().await.unwrap();
        overlay_task.await.unwrap();
        encode_task.await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["overlay", "encode"]);
    }

    #[tokio::test]
    async fn test_single_flight_completions_in_order() {
        let image = Image::new();
        image
            .load(png_bytes(32, 32, [1, 2, 3, 255]))
            .wait()
            .await
            .unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let first = image.encode(EncodeOptions::default());
        let second = image.encode(EncodeOptions::default());

        let first_order = Arc::clone(&order);
        let first_task = tokio::spawn(async move {
            first.wait().await.unwrap();
            first_order.lock().unwrap().push(1);
        });
        let second_order = Arc::clone(&order);
        let second_task = tokio::spawn(async move {
            second.wait().await.unwrap();
            second_order.lock().unwrap().push(2);
        });

        first_task.await.unwrap();
        second_task.await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_encode_queued_behind_load() {
        let image = Image::new();

        // Submit both before the load completes; the encode's precondition
        // is unmet until the decode finishes.
        let load = image.load(png_bytes(4, 4, [9, 8, 7, 255]));
        let encode = image.encode(EncodeOptions::default());

        load.wait().await.unwrap();
        let bytes = encode.wait().await.unwrap();
        let decoded = tileblend_core::decode(&bytes).unwrap();
        assert_eq!(decoded.pixel(0, 0), Some([9, 8, 7, 255]));
    }

    #[tokio::test]
    async fn test_gated_overlay_keeps_pending_work() {
        let target = Image::new();
        target
            .load(png_bytes(4, 4, [0, 0, 0, 255]))
            .wait()
            .await
            .unwrap();
        let source = Image::new();

        let overlay = target.overlay(&source);
        tokio::time::sleep(Duration::from_millis(50)).await;
        // The parked overlay is still outstanding work.
        assert!(pending_operations() >= 1);

        source
            .load(png_bytes(4, 4, [255, 255, 255, 128]))
            .wait()
            .await
            .unwrap();
        overlay.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_mixed_operations_complete_in_submission_order() {
        let image = Image::new();
        let other = Image::new();
        other
            .load(png_bytes(4, 4, [0, 255, 0, 200]))
            .wait()
            .await
            .unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let load = image.load(png_bytes(4, 4, [255, 0, 0, 255]));
        let overlay = image.overlay(&other);
        let encode = image.encode(EncodeOptions::default());

        for (completion, label) in [(load, "load"), (overlay, "overlay")] {
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                completion.wait().await.unwrap();
                order.lock().unwrap().push(label);
            })
            .await
            .unwrap();
        }
        encode.wait().await.unwrap();
        order.lock().unwrap().push("encode");

        assert_eq!(*order.lock().unwrap(), vec!["load", "overlay", "encode"]);
    }
}
