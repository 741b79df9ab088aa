use inlink::{Alphabet, CodecConfig, RadixCodec, DEFAULT_ALPHABET};

fn codec(alphabet: &str) -> RadixCodec {
    RadixCodec::new(Alphabet::new(alphabet).unwrap(), CodecConfig::default()).unwrap()
}

#[test]
fn decimal_alphabet_identity() {
    let mut codec = codec("ABCDEFGHIJ");
    let input = vec![1u8, 2, 3, 4];
    let encoded = codec.encode(&input);
    let decoded = codec.decode(&encoded).unwrap();
    assert_eq!(decoded.bytes, input);
    assert!(decoded.checksum_ok);
}

#[test]
fn roundtrip_assorted_sizes() {
    let mut codec = codec(DEFAULT_ALPHABET);
    for len in [0usize, 1, 2, 63, 64, 65, 100, 1000, 4096] {
        let input: Vec<u8> = (0..len).map(|i| (i * 131 % 251) as u8).collect();
        let encoded = codec.encode(&input);
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.bytes, input, "length {len}");
        assert!(decoded.checksum_ok, "length {len}");
    }
}

#[test]
fn roundtrip_empty_small_radix() {
    // N = 10 cannot use the small layout, so empty input exercises the
    // standard layout's zero-length path.
    let mut codec = codec("0123456789");
    let encoded = codec.encode(&[]);
    assert_eq!(codec.decode(&encoded).unwrap().bytes, Vec::<u8>::new());
}

#[test]
fn roundtrip_large_payload_minimum_radix() {
    // Enough bytes that the length field alone spans 8 digits; the
    // header grows past the top digit value without tripping anything.
    let mut codec = codec("0123456789");
    let input = vec![0x5Au8; 10_000_000];
    let encoded = codec.encode(&input);
    let decoded = codec.decode(&encoded).unwrap();
    assert!(decoded.checksum_ok);
    assert_eq!(decoded.bytes, input);
}

#[test]
fn roundtrip_crosses_parallel_threshold() {
    let mut codec = codec(DEFAULT_ALPHABET);
    let input: Vec<u8> = (0..100_000usize).map(|i| (i * 2654435761 >> 7) as u8).collect();
    let encoded = codec.encode(&input);
    assert_eq!(codec.decode(&encoded).unwrap().bytes, input);
}

#[test]
fn roundtrip_quickcheck() {
    fn prop(data: Vec<u8>) -> bool {
        let mut codec = RadixCodec::new(
            Alphabet::new(DEFAULT_ALPHABET).unwrap(),
            CodecConfig::default(),
        )
        .unwrap();
        let encoded = codec.encode(&data);
        match codec.decode(&encoded) {
            Ok(d) => d.bytes == data && d.checksum_ok,
            Err(_) => false,
        }
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>) -> bool);
}
