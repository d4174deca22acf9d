#![no_main]
use bitwire::{BitReader, BitWriter, PrimitiveRead, PrimitiveWrite, StreamWriter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks the leading bit offset and initial capacity.
    let flags = data[0];
    let lead = flags % 8;
    let capacity = 1 + (flags as usize >> 3);
    let payload = &data[1..];

    let mut buffered = BitWriter::new(capacity).unwrap();
    let mut streamed = StreamWriter::new(Vec::new());
    for _ in 0..lead {
        buffered.write_bool(true).unwrap();
        streamed.write_bool(true).unwrap();
    }
    for chunk in payload.chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        let v = u64::from_le_bytes(word);
        buffered.write_u64(v).unwrap();
        buffered.write_i32(v as i32).unwrap();
        streamed.write_u64(v).unwrap();
        streamed.write_i32(v as i32).unwrap();
    }
    buffered.write_bytes(payload).unwrap();
    streamed.write_bytes(payload).unwrap();

    let streamed = streamed.finish().unwrap();
    assert_eq!(buffered.as_slice(), streamed.as_slice());

    let mut r = BitReader::new(buffered.as_slice()).unwrap();
    for _ in 0..lead {
        assert!(r.read_bool().unwrap());
    }
    for chunk in payload.chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        let v = u64::from_le_bytes(word);
        assert_eq!(r.read_u64().unwrap(), v);
        assert_eq!(r.read_i32().unwrap(), v as i32);
    }
    assert_eq!(r.read_bytes().unwrap(), payload);
});
