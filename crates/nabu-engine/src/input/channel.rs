use std::sync::mpsc;

use super::UiEvent;

/// Creates the UI → render thread event queue.
pub fn channel() -> (UiSender, UiReceiver) {
    let (tx, rx) = mpsc::channel();
    (UiSender { tx }, UiReceiver { rx })
}

/// UI-thread end. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UiSender {
    tx: mpsc::Sender<UiEvent>,
}

impl UiSender {
    /// Queues `event`. Returns `false` once the render side is gone.
    pub fn send(&self, event: impl Into<UiEvent>) -> bool {
        let event = event.into();
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("render side gone; dropping {event:?}");
                false
            }
        }
    }
}

/// Render-thread end, drained once per tick.
#[derive(Debug)]
pub struct UiReceiver {
    rx: mpsc::Receiver<UiEvent>,
}

impl UiReceiver {
    /// Everything queued since the last drain, in send order. Never blocks.
    pub fn drain(&self) -> impl Iterator<Item = UiEvent> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, Key};

    #[test]
    fn drain_yields_in_order_then_empties() {
        let (tx, rx) = channel();
        tx.send(InputEvent::KeyDown(Key::W));
        tx.send(UiEvent::Resized { width: 800, height: 600 });

        let events: Vec<_> = rx.drain().collect();
        assert_eq!(
            events,
            vec![
                UiEvent::Input(InputEvent::KeyDown(Key::W)),
                UiEvent::Resized { width: 800, height: 600 },
            ]
        );
        assert_eq!(rx.drain().count(), 0);
    }

    #[test]
    fn send_after_receiver_dropped_is_reported() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(!tx.send(InputEvent::KeyUp(Key::S)));
    }

    #[test]
    fn senders_work_across_threads() {
        let (tx, rx) = channel();
        let worker = {
            let tx = tx.clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    tx.send(InputEvent::MouseDrag { dx: 1.0, dy: 0.0 });
                }
            })
        };
        worker.join().unwrap();
        assert_eq!(rx.drain().count(), 10);
    }
}
