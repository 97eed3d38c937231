//! Shutdown signal propagation.

use futures_util::{
    future::{FusedFuture, Shared},
    FutureExt,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::oneshot;

/// A future that resolves once the paired [`Signal`] has fired or was
/// dropped.
///
/// Cloneable so that any number of tasks can await the same event.
#[derive(Debug, Clone)]
pub struct Shutdown(Shared<oneshot::Receiver<()>>);

impl Future for Shutdown {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let pin = self.get_mut();
        if pin.0.is_terminated() || pin.0.poll_unpin(cx).is_ready() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// The sending half of a shutdown channel: fires either explicitly via
/// [`Signal::fire`] or implicitly on drop.
#[derive(Debug)]
pub struct Signal(oneshot::Sender<()>);

impl Signal {
    /// Fires the shutdown event.
    pub fn fire(self) {
        let _ = self.0.send(());
    }
}

/// Creates a connected [`Signal`]/[`Shutdown`] pair.
pub fn signal() -> (Signal, Shutdown) {
    let (sender, receiver) = oneshot::channel();
    (Signal(sender), Shutdown(receiver.shared()))
}
