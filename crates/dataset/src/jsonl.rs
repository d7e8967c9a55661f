use crate::schema::Sample;

/// One compact `{"input_text": ..., "target_text": ...}` object per line.
pub fn to_jsonl(samples: &[Sample]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 64);
    for s in samples {
        serde_json::to_writer(&mut out, s).expect("Sample serialization must work");
        out.push(b'\n');
    }
    out
}
