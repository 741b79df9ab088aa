use inlink::{Alphabet, CodecConfig, RadixCodec, DEFAULT_ALPHABET};

fn codec(alphabet: &str) -> RadixCodec {
    RadixCodec::new(Alphabet::new(alphabet).unwrap(), CodecConfig::default()).unwrap()
}

fn marker(alphabet: &str) -> char {
    alphabet.chars().last().unwrap()
}

#[test]
fn small_payload_uses_marker_layout() {
    let mut codec = codec(DEFAULT_ALPHABET);
    let encoded = codec.encode(&[7u8; 10]);
    assert_eq!(encoded.chars().next(), Some(marker(DEFAULT_ALPHABET)));
}

#[test]
fn large_payload_uses_standard_layout() {
    let mut codec = codec(DEFAULT_ALPHABET);
    let input: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
    let encoded = codec.encode(&input);
    assert_ne!(encoded.chars().next(), Some(marker(DEFAULT_ALPHABET)));
}

#[test]
fn threshold_is_exclusive() {
    // 63 bytes is below the default threshold of 64, 64 is not.
    let mut codec = codec(DEFAULT_ALPHABET);
    let below = codec.encode(&vec![1u8; 63]);
    let at = codec.encode(&vec![1u8; 64]);
    assert_eq!(below.chars().next(), Some(marker(DEFAULT_ALPHABET)));
    assert_ne!(at.chars().next(), Some(marker(DEFAULT_ALPHABET)));
}

#[test]
fn tiny_radix_never_uses_marker_layout() {
    // 10 * 10 < 256: two digits cannot hold a byte, so even tiny
    // payloads take the standard layout.
    let mut codec = codec("0123456789");
    let encoded = codec.encode(&[1u8, 2, 3]);
    assert_ne!(encoded.chars().next(), Some('9'));
    assert_eq!(codec.decode(&encoded).unwrap().bytes, vec![1, 2, 3]);
}

#[test]
fn small_layout_is_denser_for_tiny_payloads() {
    let mut codec = codec(DEFAULT_ALPHABET);
    // 2 symbols per byte plus a 3-symbol header.
    let encoded = codec.encode(&[0xAB; 10]);
    assert_eq!(encoded.chars().count(), 1 + 1 + 1 + 20);
}
