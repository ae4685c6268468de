use crossbeam_channel::{Sender, TrySendError};
use log::{debug, error};
use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
    thread::{self, JoinHandle},
    time::Duration,
};

const FLAG_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Messages the receiver checks for at the top of each loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMessage {
    /// Stop the receiver once the current iteration completes.
    Stop,
    /// Flush the live generation now, regardless of the deadline.
    Flush,
}

/// Handle for controlling a running `Receiver` from another thread.
#[derive(Clone)]
pub struct Controller {
    control_tx: Sender<ControlMessage>,
}

impl Controller {
    pub(crate) fn new(control_tx: Sender<ControlMessage>) -> Controller { Controller { control_tx } }

    /// Asks the receiver to stop.
    ///
    /// Data accumulated since the last flush is not published.
    pub fn stop(&self) -> Result<(), io::Error> { self.send(ControlMessage::Stop) }

    /// Asks the receiver to flush on its next iteration.
    pub fn flush(&self) -> Result<(), io::Error> { self.send(ControlMessage::Flush) }

    /// Stops the receiver once `flag` is raised.
    ///
    /// The flag is checked from a dedicated thread, so it can be set from a context that must not
    /// touch the channel itself, such as a signal handler.  The thread exits after delivering the
    /// stop request.
    pub fn stop_when(&self, flag: &'static AtomicBool) -> io::Result<JoinHandle<()>> {
        let controller = self.clone();
        thread::Builder::new().name("hotstatsd-shutdown".to_owned()).spawn(move || {
            while !flag.load(Ordering::SeqCst) {
                thread::sleep(FLAG_POLL_INTERVAL);
            }

            debug!("stop requested");
            if let Err(e) = controller.stop() {
                error!("failed to stop receiver: {}", e);
            }
        })
    }

    fn send(&self, msg: ControlMessage) -> Result<(), io::Error> {
        self.control_tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => io::Error::new(io::ErrorKind::WouldBlock, "control channel is full"),
            TrySendError::Disconnected(_) => io::Error::new(io::ErrorKind::NotConnected, "receiver is gone"),
        })
    }
}
