use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use super::app::AppControl;

/// Logic run repeatedly on the fast-update thread.
///
/// It shares nothing with the main thread; results go out through the
/// [`FastSender`] and are applied by `App::on_message` between resolve and frame.
pub trait FastUpdate: Send + 'static {
    type Message: Send + 'static;

    /// `dt` is the time since the previous call. Returning `Exit` stops the thread.
    fn fast_update(&mut self, dt: Duration, tx: &FastSender<Self::Message>) -> AppControl;
}

/// Sending half of the bounded fast-update channel.
pub struct FastSender<M> {
    tx: Sender<M>,
    quit: Arc<AtomicBool>,
}

impl<M> FastSender<M> {
    /// Blocks while the channel is full. Returns `false` once the main thread
    /// has dropped its side.
    pub fn send(&self, msg: M) -> bool {
        if self.tx.send(msg).is_err() {
            log::debug!("fast update channel disconnected");
            return false;
        }
        true
    }

    /// Non-blocking send; hands the message back when the channel is full or closed.
    pub fn try_send(&self, msg: M) -> Result<(), M> {
        self.tx.try_send(msg).map_err(|err| match err {
            TrySendError::Full(m) => m,
            TrySendError::Disconnected(m) => {
                log::debug!("fast update channel disconnected");
                m
            }
        })
    }

    pub fn is_shutting_down(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }
}

/// Owner of the fast-update thread and the receiving half of its channel.
///
/// Dropping it shuts the thread down.
pub struct FastLoop<M> {
    rx: Option<Receiver<M>>,
    capacity: usize,
    quit: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<M: Send + 'static> FastLoop<M> {
    /// Spawns the thread with a channel holding at most `capacity` messages.
    pub fn spawn<F>(mut update: F, capacity: usize) -> std::io::Result<Self>
    where
        F: FastUpdate<Message = M>,
    {
        let capacity = capacity.max(1);
        let (tx, rx) = channel::bounded(capacity);
        let quit = Arc::new(AtomicBool::new(false));
        let sender = FastSender {
            tx,
            quit: Arc::clone(&quit),
        };

        let handle = std::thread::Builder::new()
            .name("eudora-fast-update".into())
            .spawn(move || {
                let mut last = Instant::now();
                while !sender.is_shutting_down() {
                    let now = Instant::now();
                    let dt = now - last;
                    last = now;
                    if update.fast_update(dt, &sender) == AppControl::Exit {
                        break;
                    }
                    std::thread::yield_now();
                }
                log::debug!("fast update thread stopped");
            })?;

        Ok(Self {
            rx: Some(rx),
            capacity,
            quit,
            handle: Some(handle),
        })
    }
}

impl<M> FastLoop<M> {
    /// Messages waiting right now, at most one channel's worth per call.
    pub fn drain(&self) -> impl Iterator<Item = M> + '_ {
        self.rx
            .iter()
            .flat_map(|rx| rx.try_iter())
            .take(self.capacity)
    }

    /// Whether the thread has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Raises the quit flag, drops the receiver and joins the thread.
    ///
    /// Messages still queued are discarded.
    pub fn shutdown(&mut self) {
        self.quit.store(true, Ordering::Release);
        self.rx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("fast update thread panicked");
            }
        }
    }
}

impl<M> Drop for FastLoop<M> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sends 0, 1, 2, ... up to `limit`, then exits.
    struct Counter {
        next: u32,
        limit: u32,
    }

    impl FastUpdate for Counter {
        type Message = u32;

        fn fast_update(&mut self, _dt: Duration, tx: &FastSender<u32>) -> AppControl {
            if self.next == self.limit || !tx.send(self.next) {
                return AppControl::Exit;
            }
            self.next += 1;
            AppControl::Continue
        }
    }

    /// Never exits on its own.
    struct Ticker;

    impl FastUpdate for Ticker {
        type Message = ();

        fn fast_update(&mut self, _dt: Duration, tx: &FastSender<()>) -> AppControl {
            let _ = tx.try_send(());
            AppControl::Continue
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn messages_arrive_in_order_through_bounded_channel() {
        let fast = FastLoop::spawn(Counter { next: 0, limit: 20 }, 4).unwrap();
        let mut got = Vec::new();
        wait_until(|| {
            got.extend(fast.drain());
            got.len() == 20
        });
        assert_eq!(got, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn drain_takes_at_most_capacity() {
        let fast = FastLoop::spawn(Ticker, 3).unwrap();
        wait_until(|| fast.rx.as_ref().is_some_and(|rx| rx.is_full()));
        assert_eq!(fast.drain().count(), 3);
    }

    #[test]
    fn shutdown_joins_a_blocked_sender() {
        // Capacity 1 and no draining: the sender blocks on its second message.
        let mut fast = FastLoop::spawn(Counter { next: 0, limit: u32::MAX }, 1).unwrap();
        wait_until(|| fast.rx.as_ref().is_some_and(|rx| rx.is_full()));
        fast.shutdown();
        assert!(fast.is_finished());
        assert_eq!(fast.drain().count(), 0);
    }

    #[test]
    fn thread_exit_is_observable() {
        let fast = FastLoop::spawn(Counter { next: 0, limit: 0 }, 1).unwrap();
        wait_until(|| fast.is_finished());
    }

    #[test]
    fn drop_stops_a_running_loop() {
        let fast = FastLoop::spawn(Ticker, 2).unwrap();
        drop(fast);
    }
}
