use chrono::{DateTime, Utc};

pub const PACKET_LEN: usize = 48;

/// Seconds between the NTP era start (1900-01-01) and the Unix epoch
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;
const VERSION: u8 = 3;

/// Client request: LI = 0, VN = 3, Mode = 3, everything else zero
pub fn client_request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = (VERSION << 3) | MODE_CLIENT;
    packet
}

/// Extract the server receive timestamp from a reply
pub fn parse_reply(reply: &[u8]) -> Result<DateTime<Utc>, &'static str> {
    if reply.len() < PACKET_LEN {
        return Err("short packet");
    }
    if reply[0] & 0x07 != MODE_SERVER {
        return Err("not a server reply");
    }
    if reply[1] == 0 {
        return Err("kiss-of-death or unsynchronized server");
    }

    let seconds = u32::from_be_bytes([reply[32], reply[33], reply[34], reply[35]]);
    let fraction = u32::from_be_bytes([reply[36], reply[37], reply[38], reply[39]]);

    let unix_seconds = i64::from(seconds) - NTP_UNIX_OFFSET;
    let nanos = ((u64::from(fraction) * 1_000_000_000) >> 32) as u32;

    DateTime::from_timestamp(unix_seconds, nanos).ok_or("timestamp out of range")
}

#[cfg(test)]
pub(crate) fn server_reply(time: DateTime<Utc>) -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = (VERSION << 3) | MODE_SERVER;
    packet[1] = 2;
    let seconds = (time.timestamp() + NTP_UNIX_OFFSET) as u32;
    let fraction = ((u64::from(time.timestamp_subsec_nanos()) << 32) / 1_000_000_000) as u32;
    packet[32..36].copy_from_slice(&seconds.to_be_bytes());
    packet[36..40].copy_from_slice(&fraction.to_be_bytes());
    packet
}
