use crate::{
    clock::{Clock, SystemClock},
    configuration::Configuration,
    control::{ControlMessage, Controller},
    registry::Registry,
    scheduler::{FlushScheduler, FlushSummary},
    sink::Sink,
};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, TryRecvError};
use log::{debug, error, info};
use std::{
    io,
    net::{SocketAddr, UdpSocket},
};

/// Statsd receiver which aggregates datagrams and flushes them to a sink.
///
/// The receiver is single-threaded: one loop owns the socket, the live generation, and the sink.
/// It waits at most the configured poll delay for a datagram, then checks the flush deadline.
pub struct Receiver<S: Sink, C: Clock = SystemClock> {
    socket: UdpSocket,
    buffer: Vec<u8>,

    // Control machinery.
    control_tx: crossbeam_channel::Sender<ControlMessage>,
    control_rx: crossbeam_channel::Receiver<ControlMessage>,

    // Aggregation machinery.
    registry: Registry,
    scheduler: FlushScheduler,
    sink: S,
    clock: C,
}

impl<S: Sink, C: Clock> Receiver<S, C> {
    pub(crate) fn from_config(conf: Configuration, sink: S, clock: C) -> io::Result<Receiver<S, C>> {
        let interval = chrono::Duration::from_std(conf.flush_interval)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        if clock.now().checked_add_signed(interval).is_none() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "flush interval is out of range"));
        }

        let socket = UdpSocket::bind(conf.listen)?;
        socket.set_read_timeout(Some(conf.poll_delay))?;
        info!("listening on {}", socket.local_addr()?);

        let (control_tx, control_rx) = bounded(1024);
        let scheduler = FlushScheduler::new(interval, clock.now());

        Ok(Receiver {
            socket,
            buffer: vec![0; conf.buffer_size],
            control_tx,
            control_rx,
            registry: Registry::new(&conf.namespace),
            scheduler,
            sink,
            clock,
        })
    }

    /// Creates a `Controller` bound to this receiver.
    pub fn get_controller(&self) -> Controller { Controller::new(self.control_tx.clone()) }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// The live generation.
    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn sink(&self) -> &S { &self.sink }

    /// Applies one datagram's payload to the live generation.
    ///
    /// Returns the number of updates that were applied.
    pub fn process_datagram(&mut self, data: &[u8]) -> usize {
        let timestamp = self.clock.now();
        ingest(&mut self.registry, data, timestamp)
    }

    /// Flushes the live generation if its deadline has passed.
    pub fn tick(&mut self) -> Option<FlushSummary> {
        let now = self.clock.now();
        if self.scheduler.is_due(now) {
            Some(self.flush(now))
        } else {
            None
        }
    }

    /// Detaches the live generation, installs an empty one, and publishes the detached one.
    fn flush(&mut self, now: DateTime<Utc>) -> FlushSummary {
        let next = self.registry.next_generation();
        let generation = std::mem::replace(&mut self.registry, next);
        self.scheduler.flush(generation, &mut self.sink, now)
    }

    /// Waits up to the poll delay for a single datagram and ingests it.
    fn poll_socket(&mut self) {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((len, addr)) => {
                let timestamp = self.clock.now();
                let applied = ingest(&mut self.registry, &self.buffer[..len], timestamp);
                debug!("applied {} updates from {} ({} bytes)", applied, addr, len);
            },
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {},
            Err(e) => error!("unable to receive datagram: {}", e),
        }
    }

    /// Run the receiver until it is told to stop.
    ///
    /// Stop requests are only observed between iterations, so a datagram or flush already in
    /// progress always completes.  Anything not yet flushed is dropped.  The socket is closed and
    /// the sink handed back on return.
    pub fn run(mut self) -> S {
        loop {
            let mut force_flush = false;
            let mut running = true;
            loop {
                match self.control_rx.try_recv() {
                    Ok(ControlMessage::Stop) => running = false,
                    Ok(ControlMessage::Flush) => force_flush = true,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        running = false;
                        break;
                    },
                }
            }

            if !running {
                break;
            }

            self.poll_socket();

            let now = self.clock.now();
            if force_flush || self.scheduler.is_due(now) {
                self.flush(now);
            }
        }

        info!("receiver stopped, {} unflushed metrics dropped", self.registry.len());
        self.sink
    }
}

fn ingest(registry: &mut Registry, data: &[u8], timestamp: DateTime<Utc>) -> usize {
    let payload = String::from_utf8_lossy(data);
    registry.ingest(&payload, timestamp)
}
