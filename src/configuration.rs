use crate::{
    clock::{Clock, SystemClock},
    receiver::Receiver,
    sink::Sink,
};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

/// A configuration builder for `Receiver`.
#[derive(Clone, Debug)]
pub struct Configuration {
    pub(crate) listen: SocketAddr,
    pub(crate) flush_interval: Duration,
    pub(crate) namespace: String,
    pub(crate) poll_delay: Duration,
    pub(crate) buffer_size: usize,
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 8125)),
            flush_interval: Duration::from_secs(60),
            namespace: "Statsd".to_owned(),
            poll_delay: Duration::from_secs(1),
            buffer_size: 8192,
        }
    }
}

impl Configuration {
    /// Creates a new `Configuration` with default values.
    pub fn new() -> Configuration { Default::default() }

    /// Sets the address to listen on.
    ///
    /// Defaults to `127.0.0.1:8125`.
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.listen = addr;
        self
    }

    /// Sets the flush interval.
    ///
    /// Defaults to `60s`.
    ///
    /// Everything aggregated within one interval is published at its end and then forgotten.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Sets the root namespace that every metric namespace is nested under.
    ///
    /// Defaults to `Statsd`.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_owned();
        self
    }

    /// Sets the poll delay.
    ///
    /// Defaults to `1s`.
    ///
    /// This is the longest the receiver waits on the socket before checking for control messages
    /// and the flush deadline, so it bounds how late a flush or a stop can be observed.
    pub fn poll_delay(mut self, poll_delay: Duration) -> Self {
        self.poll_delay = poll_delay;
        self
    }

    /// Sets the receive buffer size.
    ///
    /// Defaults to `8192` bytes.  Anything past this in a single datagram is truncated.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Binds the socket and creates a `Receiver` publishing into `sink`.
    pub fn build<S: Sink>(self, sink: S) -> io::Result<Receiver<S, SystemClock>> {
        self.build_with_clock(sink, SystemClock::new())
    }

    /// Like [`Configuration::build`], but with a caller-supplied clock.
    pub fn build_with_clock<S: Sink, C: Clock>(self, sink: S, clock: C) -> io::Result<Receiver<S, C>> {
        Receiver::from_config(self, sink, clock)
    }
}
