//! The top-level control loop: read, frame, dispatch, reply.
//!
//! One connection, one thread. The loop blocks in the link's receive (bounded
//! by its deadline), feeds each chunk through the frame reader, dispatches
//! every completed line, and writes any reply back terminated with `\r\n`.
//! It unwinds when the connection closes or shutdown is requested, and always
//! closes the link on the way out.

use crate::dispatch::Dispatcher;
use crate::framing::FrameReader;
use crate::link::{DeviceLink, ReadEvent};
use crate::shutdown::ShutdownToken;
use tracing::trace;

pub struct Simulator {
    link: DeviceLink,
    frames: FrameReader,
    dispatcher: Dispatcher,
    shutdown: ShutdownToken,
}

impl Simulator {
    pub fn new(link: DeviceLink, dispatcher: Dispatcher, shutdown: ShutdownToken) -> Self {
        Simulator {
            link,
            frames: FrameReader::new(),
            dispatcher,
            shutdown,
        }
    }

    /// Run until the connection closes or shutdown is requested.
    pub fn run(&mut self) {
        loop {
            if self.shutdown.is_requested() {
                break;
            }

            let chunk = match self.link.read() {
                ReadEvent::Data(chunk) => chunk,
                ReadEvent::Idle => continue,
                ReadEvent::Closed => break,
            };

            for line in self.frames.push(&chunk) {
                trace!(line = %line, "device recv");
                let Some(reply) = self.dispatcher.dispatch(&line) else {
                    continue;
                };

                trace!(reply = %reply, "device send");
                if !self.link.write(&format!("{reply}\r\n")) {
                    // remaining lines of this chunk are abandoned
                    break;
                }
            }
        }

        self.link.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceInfo;
    use crate::handlers::Registry;
    use crate::link::SocketAddress;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn temp_socket_path(tag: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("rcp-sim-loop-{tag}-{}-{n}.sock", std::process::id()))
    }

    fn device_simulator(addr: SocketAddress, shutdown: ShutdownToken) -> Simulator {
        let registry = Registry::with_device_handlers(Arc::new(DeviceInfo::new())).unwrap();
        Simulator::new(DeviceLink::new(addr), Dispatcher::new(registry), shutdown)
    }

    #[test]
    fn test_request_reply_over_socket() {
        let path = temp_socket_path("reply");
        let listener = UnixListener::bind(&path).unwrap();
        let mut sim = device_simulator(SocketAddress::Path(path.clone()), ShutdownToken::new());
        let worker = thread::spawn(move || sim.run());

        let (peer, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(peer.try_clone().unwrap());
        let mut peer = peer;

        // one request split across two chunks
        peer.write_all(b"{\"getVer\"").unwrap();
        thread::sleep(Duration::from_millis(50));
        peer.write_all(b":null}\n").unwrap();

        let mut reply = String::new();
        reader.read_line(&mut reply).unwrap();
        assert!(reply.starts_with("{\"ver\":"), "got: {reply}");
        assert!(reply.ends_with("\r\n"));

        // an unknown command gets no reply; the next message still answers
        peer.write_all(b"{\"bogusCmd\":null}\n{\"getCapabilities\":null}\n")
            .unwrap();
        let mut reply = String::new();
        reader.read_line(&mut reply).unwrap();
        assert!(reply.starts_with("{\"capabilities\":"), "got: {reply}");

        drop(peer);
        drop(reader);
        worker.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_set_telemetry_sends_nothing() {
        let path = temp_socket_path("telemetry");
        let listener = UnixListener::bind(&path).unwrap();
        let mut sim = device_simulator(SocketAddress::Path(path.clone()), ShutdownToken::new());
        let worker = thread::spawn(move || sim.run());

        let (peer, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(peer.try_clone().unwrap());
        let mut peer = peer;

        // the empty telemetry acknowledgement must not produce a line, so the
        // first reply on the wire belongs to the status request
        peer.write_all(b"{\"setTelemetry\":{\"rate\":5}}\n{\"getStatus\":null}\n")
            .unwrap();

        let mut reply = String::new();
        reader.read_line(&mut reply).unwrap();
        assert!(reply.starts_with("{\"status\":"), "got: {reply}");

        drop(peer);
        drop(reader);
        worker.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_line_does_not_kill_loop() {
        let path = temp_socket_path("malformed");
        let listener = UnixListener::bind(&path).unwrap();
        let mut sim = device_simulator(SocketAddress::Path(path.clone()), ShutdownToken::new());
        let worker = thread::spawn(move || sim.run());

        let (peer, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(peer.try_clone().unwrap());
        let mut peer = peer;

        peer.write_all(b"this is not json\n{\"getVer\":null}\n").unwrap();

        let mut reply = String::new();
        reader.read_line(&mut reply).unwrap();
        assert!(reply.starts_with("{\"ver\":"), "got: {reply}");

        drop(peer);
        drop(reader);
        worker.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_shutdown_request_stops_loop() {
        let path = temp_socket_path("shutdown");
        let listener = UnixListener::bind(&path).unwrap();
        let shutdown = ShutdownToken::new();
        let mut sim = device_simulator(SocketAddress::Path(path.clone()), shutdown.clone());
        let worker = thread::spawn(move || sim.run());

        let (_peer, _) = listener.accept().unwrap();
        shutdown.request();

        // the loop notices within one receive deadline
        worker.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_exits_when_connect_fails() {
        let mut sim = device_simulator(
            SocketAddress::Path(temp_socket_path("absent")),
            ShutdownToken::new(),
        );
        // no listener: the failed connect ends the loop immediately
        sim.run();
    }
}
