//! End-to-end flow over real sockets: bind, accept, dispatch, decode with the
//! stub backend, and stream result lines back.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use oratio_core::recognizer::StubRecognizerFactory;
use oratio_core::{Server, SessionConfig};

fn start_server(workers: usize) -> (Arc<Server>, SocketAddr) {
    let config = SessionConfig {
        sample_rate: 16_000,
        chunk_secs: 0.18,
        packet_bytes: 512,
        seconds_per_frame: 0.01,
    };
    let server = Arc::new(
        Server::start(
            "127.0.0.1",
            0,
            workers,
            Arc::new(StubRecognizerFactory),
            config,
        )
        .expect("server starts"),
    );
    let addr = server.local_addr().expect("local addr");

    let accept = Arc::clone(&server);
    thread::spawn(move || accept.run());

    (server, addr)
}

fn pcm_bytes(samples: usize) -> Vec<u8> {
    std::iter::repeat(100i16.to_le_bytes())
        .take(samples)
        .flatten()
        .collect()
}

#[test]
fn short_utterance_gets_a_final_result_and_done() {
    let (_server, addr) = start_server(1);

    let mut client = TcpStream::connect(addr).expect("connect");
    client.write_all(&pcm_bytes(3_000)).expect("send audio");
    client.shutdown(Shutdown::Write).expect("end of stream");

    let mut response = String::new();
    client.read_to_string(&mut response).expect("read response");

    let lines: Vec<&str> = response.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected response: {response:?}");
    assert!(lines[0].starts_with("RESULT:NUM=0,FORMAT=WSE,"));
    assert!(lines[0].ends_with("INPUT-DUR=0.1875"));
    assert_eq!(lines[1], "RESULT:DONE");
}

#[test]
fn second_client_is_closed_while_the_only_worker_is_busy() {
    let (server, addr) = start_server(1);

    // First client occupies the single worker by keeping its stream open.
    let mut first = TcpStream::connect(addr).expect("connect first");
    first.write_all(&pcm_bytes(1_000)).expect("send audio");

    let mut second = TcpStream::connect(addr).expect("connect second");
    second
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set timeout");
    let mut buf = [0u8; 16];
    let n = second.read(&mut buf).expect("read after rejection");
    assert_eq!(n, 0, "rejected client should see a clean close");

    // Once the first client disconnects, the worker frees up and a new
    // session runs to completion.
    drop(first);
    server.pool().drain(Duration::from_millis(20));

    let mut third = TcpStream::connect(addr).expect("connect third");
    third.write_all(&pcm_bytes(16_000)).expect("send audio");
    third.shutdown(Shutdown::Write).expect("end of stream");

    let mut response = String::new();
    third.read_to_string(&mut response).expect("read response");

    let lines: Vec<&str> = response.lines().collect();
    assert!(lines[0].starts_with("RESULT:NUM=1,FORMAT=WSE,"));
    assert!(lines[1].starts_with("RESULT:WORD=stub1,0,1"));
    assert_eq!(lines.last().copied(), Some("RESULT:DONE"));
}
