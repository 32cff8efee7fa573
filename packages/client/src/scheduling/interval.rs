//! Periodic tick sequences
//!
//! An [`Interval`] is a description, not a running timer. Each call to
//! [`Interval::subscribe`] starts a fresh producer task that pushes tick
//! counters `0, 1, 2, ..` into a rendezvous channel. The producer blocks
//! while the consumer is not pulling, so an idle subscription accumulates no
//! backlog. Aborting the signal or dropping the [`Ticks`] stops the producer.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::mpsc;
use futures::future::{select, Either};
use futures::{SinkExt, Stream};

use super::abort::AbortSignal;
use super::delay::delay;
use crate::runtime::spawn;

/// Restartable periodic tick source.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    signal: Option<AbortSignal>,
}

/// Build an interval emitting one tick per `period` until `signal` fires.
#[must_use]
pub fn interval(period: Duration, signal: Option<AbortSignal>) -> Interval {
    Interval { period, signal }
}

impl Interval {
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start a new tick sequence. The first tick, `0`, arrives one period
    /// after subscribing.
    #[must_use]
    pub fn subscribe(&self) -> Ticks {
        let (mut tx, rx) = mpsc::channel(0);
        let period = self.period;
        let signal = self.signal.clone();

        spawn(async move {
            let mut tick: u64 = 0;
            loop {
                if delay(period, signal.as_ref()).await.is_err() {
                    break;
                }

                let sent = match &signal {
                    Some(signal) => {
                        let send = std::pin::pin!(tx.send(tick));
                        let aborted = std::pin::pin!(signal.aborted());
                        match select(send, aborted).await {
                            Either::Left((sent, _)) => sent.is_ok(),
                            Either::Right(_) => false,
                        }
                    }
                    None => tx.send(tick).await.is_ok(),
                };
                if !sent {
                    break;
                }
                tick += 1;
            }
            tracing::trace!(target: "wireline::runtime", ticks = tick, "interval producer stopped");
        });

        Ticks { rx }
    }
}

/// Stream of tick counters produced by one [`Interval::subscribe`] call.
#[derive(Debug)]
pub struct Ticks {
    rx: mpsc::Receiver<u64>,
}

impl Stream for Ticks {
    type Item = u64;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<u64>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}
