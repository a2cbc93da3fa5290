//! Connection attempts and time keeping for the dependency waiter.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use prelaunch_common::types::Endpoint;

/// Performs a single reachability attempt against an endpoint.
pub trait Connector {
    /// Connects to `endpoint` within `timeout` and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns the resolution or connection error of the attempt.
    fn connect(&mut self, endpoint: &Endpoint, timeout: Duration) -> io::Result<()>;
}

/// Plain TCP connector.
///
/// Resolves `host:port` and tries each resolved address until one accepts,
/// sharing `timeout` across all of them. Name resolution counts against the
/// same slice, but the blocking resolver call itself cannot be cut short: a
/// slow resolver can overrun `timeout`, after which no connection is tried.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&mut self, endpoint: &Endpoint, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        let addrs = endpoint.as_str().to_socket_addrs()?;
        let mut last_error = None;
        for addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => {
                    drop(stream);
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("attempt on {endpoint} ran out of time before connecting"),
            )
        }))
    }
}

/// Source of monotonic time and blocking sleeps.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The system monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn connects_to_listening_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let endpoint = Endpoint::new(addr.to_string());
        TcpConnector
            .connect(&endpoint, Duration::from_secs(1))
            .expect("should connect");
    }

    #[test]
    fn refused_connection_is_an_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr")
        };
        let endpoint = Endpoint::new(addr.to_string());
        assert!(TcpConnector.connect(&endpoint, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn unparseable_address_is_an_error() {
        let endpoint = Endpoint::new("missing-port");
        assert!(TcpConnector.connect(&endpoint, Duration::from_millis(100)).is_err());
    }

    #[test]
    fn exhausted_slice_times_out_without_connecting() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.set_nonblocking(true).expect("nonblocking");
        let endpoint = Endpoint::new(listener.local_addr().expect("local addr").to_string());

        let err = TcpConnector
            .connect(&endpoint, Duration::ZERO)
            .expect_err("no time left to connect");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        let pending = listener.accept().map(|_| ()).map_err(|e| e.kind());
        assert_eq!(pending, Err(io::ErrorKind::WouldBlock));
    }

    #[test]
    fn system_clock_sleeps() {
        let clock = SystemClock;
        let start = clock.now();
        clock.sleep(Duration::from_millis(20));
        assert!(clock.now().duration_since(start) >= Duration::from_millis(20));
    }
}
