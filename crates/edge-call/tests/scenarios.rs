//! End-to-end call scenarios through the standard handler set.

use edge_call::{
    Attestor, CallStatus, Console, DispatchTable, EdgeCaller, EdgeChannel, EdgeError,
    EdgeResult, EnclaveIdentity, HostServices, SharedBuffer, SharedPackagedStr, StringProvider,
    COPY_REPORT, ENVELOPE_SIZE, GET_HOST_STRING, PACKAGED_HEADER_SIZE, PAYLOAD_OFFSET,
    MAX_NONCE_LEN, NONCE_LEN_PREFIX, PRINT_BUFFER, PRINT_VALUE, REPORT_REGION_LEN,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct RecordingConsole {
    values: Mutex<Vec<u64>>,
    texts: Mutex<Vec<Vec<u8>>>,
}

impl Console for RecordingConsole {
    fn render_bytes(&self, bytes: &[u8]) -> u64 {
        self.texts.lock().push(bytes.to_vec());
        bytes.len() as u64
    }

    fn render_value(&self, value: u64) {
        self.values.lock().push(value);
    }
}

struct QueuedStrings(Mutex<VecDeque<Vec<u8>>>);

impl QueuedStrings {
    fn new(strings: Vec<Vec<u8>>) -> Self {
        Self(Mutex::new(strings.into()))
    }
}

impl StringProvider for QueuedStrings {
    fn next_string(&self) -> EdgeResult<Vec<u8>> {
        self.0
            .lock()
            .pop_front()
            .ok_or_else(|| EdgeError::Collaborator("no strings left".into()))
    }
}

/// Writes `0x5e` followed by the measurement XOR-folded with the nonce.
#[derive(Default)]
struct FoldingAttestor {
    nonces: Mutex<Vec<Vec<u8>>>,
}

impl Attestor for FoldingAttestor {
    fn sign(&self, identity: &EnclaveIdentity, nonce: &[u8], out: &mut [u8]) -> EdgeResult<()> {
        self.nonces.lock().push(nonce.to_vec());
        let padded = nonce.iter().copied().chain(std::iter::repeat(0));
        out[0] = 0x5e;
        for ((i, byte), n) in out.iter_mut().enumerate().skip(1).zip(padded) {
            *byte = identity.measurement[i % 32] ^ n ^ 0x11;
        }
        Ok(())
    }
}

struct Session {
    channel: EdgeChannel,
    table: DispatchTable,
    console: Arc<RecordingConsole>,
    attestor: Arc<FoldingAttestor>,
}

fn session(len: usize, strings: Vec<Vec<u8>>) -> Session {
    let console = Arc::new(RecordingConsole::default());
    let attestor = Arc::new(FoldingAttestor::default());
    let services = HostServices {
        console: console.clone(),
        strings: Arc::new(QueuedStrings::new(strings)),
        attestor: attestor.clone(),
        identity: EnclaveIdentity::new([7u8; 32]),
    };
    Session {
        channel: EdgeChannel::new(SharedBuffer::new(len).unwrap()),
        table: services.dispatch_table().unwrap(),
        console,
        attestor,
    }
}

fn payload(channel: &EdgeChannel) -> Vec<u8> {
    let len = channel.buffer().len() - ENVELOPE_SIZE;
    channel.buffer().region(PAYLOAD_OFFSET, len).unwrap().to_vec()
}

#[test]
fn scenario_a_print_value() {
    let mut s = session(4096, vec![]);
    s.channel
        .buffer_mut()
        .unwrap()
        .region_mut(PAYLOAD_OFFSET, 4096 - ENVELOPE_SIZE)
        .unwrap()
        .fill(0xc3);
    s.channel
        .buffer_mut()
        .unwrap()
        .region_mut(64, 8)
        .unwrap()
        .copy_from_slice(&42u64.to_le_bytes());
    let before = payload(&s.channel);

    s.channel.place_args(PRINT_VALUE, 64).unwrap();
    assert_eq!(s.channel.dispatch(&s.table).unwrap(), CallStatus::Ok);
    assert_eq!(s.channel.take_result().unwrap().status, CallStatus::Ok);

    assert_eq!(*s.console.values.lock(), vec![42]);
    let after = payload(&s.channel);
    // Payload index i corresponds to buffer offset i + 32.
    for (i, (a, b)) in before.iter().zip(after.iter()).enumerate() {
        let offset = i + ENVELOPE_SIZE;
        if !(64..72).contains(&offset) {
            assert_eq!(a, b, "byte at offset {offset} changed");
        }
    }
}

#[test]
fn scenario_b_copy_report() {
    let mut s = session(4096, vec![]);
    {
        let region = s
            .channel
            .buffer_mut()
            .unwrap()
            .region_mut(PAYLOAD_OFFSET, REPORT_REGION_LEN)
            .unwrap();
        region.fill(0xaa);
        region[..NONCE_LEN_PREFIX].copy_from_slice(&16u32.to_le_bytes());
    }

    s.channel.place_args(COPY_REPORT, PAYLOAD_OFFSET).unwrap();
    assert_eq!(s.channel.dispatch(&s.table).unwrap(), CallStatus::Ok);
    let outcome = s.channel.take_result().unwrap();
    assert_eq!(outcome.return_offset(), Some(PAYLOAD_OFFSET));

    let region = s
        .channel
        .buffer()
        .region(PAYLOAD_OFFSET, REPORT_REGION_LEN)
        .unwrap();
    assert_eq!(region[0], 0x5e);
    assert_ne!(region, &[0xaa; REPORT_REGION_LEN][..]);
    assert_eq!(*s.attestor.nonces.lock(), vec![vec![0xaa; 16]]);
}

#[test]
fn copy_report_rejects_overlong_length_prefix() {
    let mut s = session(4096, vec![]);
    let claimed = (MAX_NONCE_LEN + 1) as u32;
    s.channel
        .buffer_mut()
        .unwrap()
        .region_mut(PAYLOAD_OFFSET, NONCE_LEN_PREFIX)
        .unwrap()
        .copy_from_slice(&claimed.to_le_bytes());
    let before = payload(&s.channel);

    s.channel.place_args(COPY_REPORT, PAYLOAD_OFFSET).unwrap();
    assert_eq!(s.channel.dispatch(&s.table).unwrap(), CallStatus::HandlerError);
    s.channel.take_result().unwrap();
    assert_eq!(payload(&s.channel), before);
    assert!(s.attestor.nonces.lock().is_empty());
}

#[test]
fn copy_report_hands_over_exact_nonce() {
    let mut s = session(4096, vec![]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);

    caller.copy_report(b"abc\0\0").unwrap();
    caller.copy_report(b"abc").unwrap();
    assert_eq!(
        *s.attestor.nonces.lock(),
        vec![b"abc\0\0".to_vec(), b"abc".to_vec()]
    );
}

#[test]
fn scenario_c_get_host_string() {
    let mut s = session(4096, vec![b"hello".to_vec()]);
    s.channel
        .buffer_mut()
        .unwrap()
        .region_mut(PAYLOAD_OFFSET, 4096 - ENVELOPE_SIZE)
        .unwrap()
        .fill(0x5a);

    s.channel.place_args(GET_HOST_STRING, 0).unwrap();
    assert_eq!(s.channel.dispatch(&s.table).unwrap(), CallStatus::Ok);
    let header_offset = s.channel.take_result().unwrap().return_offset().unwrap();
    assert_eq!(header_offset, PAYLOAD_OFFSET);

    let mut raw = [0u8; PACKAGED_HEADER_SIZE];
    raw.copy_from_slice(
        s.channel
            .buffer()
            .region(header_offset, PACKAGED_HEADER_SIZE)
            .unwrap(),
    );
    let header = SharedPackagedStr::from_le_bytes(raw);
    assert_eq!(header.len, 5);
    assert_eq!(
        s.channel.buffer().region(header.str_offset, 5).unwrap(),
        b"hello"
    );

    // Nothing past the packaged string is written.
    let end = header.str_offset as usize + 5;
    let rest = s.channel.buffer().region(end as u64, 4096 - end).unwrap();
    assert!(rest.iter().all(|&b| b == 0x5a));
}

#[test]
fn scenario_d_host_string_too_large() {
    let len = 256;
    let oversized = vec![b'z'; len - ENVELOPE_SIZE - PACKAGED_HEADER_SIZE + 1];
    let mut s = session(len, vec![oversized]);
    let before = payload(&s.channel);

    s.channel.place_args(GET_HOST_STRING, 0).unwrap();
    assert_eq!(s.channel.dispatch(&s.table).unwrap(), CallStatus::BadPointer);
    let outcome = s.channel.take_result().unwrap();
    assert_eq!(outcome.status, CallStatus::BadPointer);
    assert_eq!(outcome.return_offset(), None);
    assert_eq!(payload(&s.channel), before);
}

#[test]
fn host_string_exactly_fills_buffer() {
    let len = 256;
    let exact = vec![b'q'; len - ENVELOPE_SIZE - PACKAGED_HEADER_SIZE];
    let mut s = session(len, vec![exact.clone()]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);
    assert_eq!(caller.host_string().unwrap(), exact);
}

#[test]
fn print_buffer_acknowledges_in_place() {
    let mut s = session(4096, vec![]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);

    let ack = caller.print_buffer("matrix product ready").unwrap();
    assert_eq!(ack, 20);
    assert_eq!(*s.console.texts.lock(), vec![b"matrix product ready".to_vec()]);
}

#[test]
fn print_buffer_rejects_overlong_text() {
    let mut s = session(4096, vec![]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);
    let text = "x".repeat(64);
    assert!(matches!(
        caller.print_buffer(&text),
        Err(EdgeError::PayloadTooLarge { len: 64, max: 63 })
    ));
    assert!(s.console.texts.lock().is_empty());
}

#[test]
fn print_buffer_with_bad_offset() {
    let mut s = session(128, vec![]);
    // 64-byte region at 100 runs past the end.
    s.channel.place_args(PRINT_BUFFER, 100).unwrap();
    assert_eq!(s.channel.dispatch(&s.table).unwrap(), CallStatus::BadOffset);
    assert!(s.console.texts.lock().is_empty());
}

#[test]
fn caller_round_trip_sequence() {
    let mut s = session(4096, vec![b"nonce-1234".to_vec()]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);

    let nonce = caller.host_string().unwrap();
    assert_eq!(nonce, b"nonce-1234");

    caller.print_value(6).unwrap();

    let report = caller.copy_report(&nonce).unwrap();
    assert_eq!(report.len(), REPORT_REGION_LEN);
    assert_eq!(report[0], 0x5e);

    assert_eq!(*s.console.values.lock(), vec![6]);
}

#[test]
fn caller_surfaces_failed_status() {
    let mut s = session(4096, vec![]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);

    // Provider is empty, so the collaborator fails.
    assert!(matches!(
        caller.host_string(),
        Err(EdgeError::CallFailed {
            call_id: GET_HOST_STRING,
            status: CallStatus::HandlerError,
        })
    ));
    assert!(matches!(
        caller.ocall(77, &[1, 2, 3], &mut []),
        Err(EdgeError::CallFailed {
            call_id: 77,
            status: CallStatus::UnknownCall,
        })
    ));
    // The channel is reusable after a failed call.
    caller.print_value(1).unwrap();
}

#[test]
fn caller_rejects_oversized_nonce() {
    let mut s = session(4096, vec![]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);
    let nonce = vec![1u8; MAX_NONCE_LEN + 1];
    assert!(matches!(
        caller.copy_report(&nonce),
        Err(EdgeError::NonceTooLarge { len, max: MAX_NONCE_LEN }) if len == MAX_NONCE_LEN + 1
    ));
    caller.copy_report(&nonce[..MAX_NONCE_LEN]).unwrap();
}

#[test]
fn caller_args_must_fit_buffer() {
    let mut s = session(64, vec![]);
    let mut caller = EdgeCaller::new(&mut s.channel, &s.table);
    assert!(matches!(
        caller.copy_report(b"nonce"),
        Err(EdgeError::BadPointer { .. })
    ));
}
