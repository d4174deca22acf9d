#![no_main]
use bitwire::{BitReader, PrimitiveRead, StreamReader};
use libfuzzer_sys::fuzz_target;

fn drain<R: PrimitiveRead>(r: &mut R, script: u8) {
    // Every read must return a value or an error, never panic.
    for step in 0..64u32 {
        let op = script.rotate_left(step) % 8;
        let ok = match op {
            0 => r.read_bool().is_ok(),
            1 => r.read_u32().is_ok(),
            2 => r.read_i64().is_ok(),
            3 => r.read_string().is_ok(),
            4 => r.read_bytes().is_ok(),
            5 => r.read_char().is_ok(),
            6 => r.read_f32().is_ok(),
            _ => {
                let mut dst = [0u8; 3];
                r.read_bytes_into(&mut dst).is_ok()
            }
        };
        if !ok {
            break;
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&script, payload)) = data.split_first() else {
        return;
    };
    if let Ok(mut r) = BitReader::new(payload) {
        drain(&mut r, script);
    }
    drain(&mut StreamReader::new(payload), script);
});
