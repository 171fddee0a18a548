use ntp_probe::protocol::{
    ConstPackedSizeBytes, LiVnMode, Mode, Packet, ReadBytes, ShortFormat, TimestampFormat,
    Version, WriteBytes,
};

/// A stratum-2 server reply captured field by field. Byte 0 is 0x24: LI=0, VN=4, Mode=4.
const REPLY_BYTES: [u8; 48] = [
    36, 2, 3, 236, 0, 0, 0, 10, 0, 0, 0, 24, 192, 168, 0, 1, 234, 4, 227, 0, 0, 0, 0, 0, 234, 4,
    227, 10, 159, 47, 120, 0, 234, 4, 227, 11, 45, 236, 230, 45, 234, 4, 227, 11, 46, 35, 158,
    108,
];

fn reply_packet() -> Packet {
    let mut li_vn_mode = LiVnMode::default();
    li_vn_mode.set_version(Version::V4);
    li_vn_mode.set_mode(Mode::Server);
    Packet {
        li_vn_mode,
        stratum: 2,
        poll: 3,
        precision: 0xec, // -20 as the raw wire byte
        root_delay: ShortFormat {
            seconds: 0,
            fraction: 10,
        },
        root_dispersion: ShortFormat {
            seconds: 0,
            fraction: 24,
        },
        reference_id: 0xc0a80001, // 192.168.0.1
        reference_timestamp: TimestampFormat {
            seconds: 3926188800,
            fraction: 0,
        },
        origin_timestamp: TimestampFormat {
            seconds: 3926188810,
            fraction: 2670688256,
        },
        receive_timestamp: TimestampFormat {
            seconds: 3926188811,
            fraction: 770500141,
        },
        transmit_timestamp: TimestampFormat {
            seconds: 3926188811,
            fraction: 774086252,
        },
    }
}

#[test]
fn packet_from_bytes() {
    let packet = (&REPLY_BYTES[..]).read_bytes::<Packet>().unwrap();
    assert_eq!(reply_packet(), packet);
    assert_eq!(packet.li_vn_mode.leap_indicator(), 0);
    assert_eq!(packet.li_vn_mode.version(), 4);
    assert_eq!(packet.li_vn_mode.mode(), Mode::Server as u8);
    assert_eq!(Mode::try_from(packet.li_vn_mode.mode()), Ok(Mode::Server));
}

#[test]
fn packet_to_bytes() {
    let mut bytes = [0u8; Packet::PACKED_SIZE_BYTES];
    (&mut bytes[..]).write_bytes(reply_packet()).unwrap();
    assert_eq!(&bytes[..], &REPLY_BYTES[..]);
}

#[test]
fn packet_conversion_roundtrip() {
    let packet = (&REPLY_BYTES[..]).read_bytes::<Packet>().unwrap();
    let mut output = [0u8; Packet::PACKED_SIZE_BYTES];
    (&mut output[..]).write_bytes(packet).unwrap();
    assert_eq!(&REPLY_BYTES[..], &output[..]);
}

#[test]
fn packed_size_is_48() {
    assert_eq!(Packet::PACKED_SIZE_BYTES, 48);
}

#[test]
fn default_packet_is_all_zero() {
    let mut bytes = [0xffu8; Packet::PACKED_SIZE_BYTES];
    (&mut bytes[..]).write_bytes(Packet::default()).unwrap();
    assert_eq!(&bytes[..], &[0u8; 48][..]);
}

#[test]
fn short_input_is_a_framing_error() {
    let err = (&REPLY_BYTES[..47]).read_bytes::<Packet>().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
}

#[test]
fn version_then_mode_packs_to_0x23() {
    let mut byte = LiVnMode::default();
    byte.set_version(Version::V4);
    byte.set_mode(Mode::Client);
    assert_eq!(byte.raw(), 0x23);
}

#[test]
fn mode_then_version_packs_to_0x23() {
    let mut byte = LiVnMode::default();
    byte.set_mode(Mode::Client);
    byte.set_version(Version::V4);
    assert_eq!(byte.raw(), 0x23);
}

#[test]
fn setters_preserve_leap_indicator_bits() {
    // Start from a byte with both leap indicator bits set (LI=3, VN=7, Mode=7).
    let mut byte = (&[0xffu8][..]).read_bytes::<LiVnMode>().unwrap();
    byte.set_version(Version::V4);
    assert_eq!(byte.leap_indicator(), 3);
    assert_eq!(byte.version(), 4);
    assert_eq!(byte.mode(), 7);
    byte.set_mode(Mode::Client);
    assert_eq!(byte.leap_indicator(), 3);
    assert_eq!(byte.version(), 4);
    assert_eq!(byte.mode(), 3);
    assert_eq!(byte.raw(), 0b11_100_011);
}

#[test]
fn timestamp_equality_is_bit_for_bit() {
    let a = TimestampFormat {
        seconds: 3926188800,
        fraction: 0,
    };
    let b = TimestampFormat {
        seconds: 3926188800,
        fraction: 1,
    };
    assert_ne!(a, b);
    assert_eq!(a, TimestampFormat { ..a });
}
