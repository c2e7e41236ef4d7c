//! Binary DataFlash log builder shared by the integration tests

#![allow(dead_code)]

pub const SYNC: [u8; 2] = [0xA3, 0x95];

pub const MSG: u8 = 129;
pub const MODE: u8 = 130;
pub const GPS: u8 = 131;
pub const PARM: u8 = 132;

/// Payload width of a format string
pub fn payload_width(types: &str) -> usize {
    types
        .chars()
        .map(|c| match c {
            'b' | 'B' | 'M' => 1,
            'h' | 'H' | 'c' | 'C' => 2,
            'i' | 'I' | 'e' | 'E' | 'L' | 'f' | 'n' => 4,
            'q' | 'Q' | 'd' => 8,
            'N' => 16,
            'Z' => 64,
            other => panic!("no width for type character {other}"),
        })
        .sum()
}

pub fn padded(text: &str, len: usize) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(len, 0);
    bytes
}

#[derive(Default)]
pub struct LogBuilder {
    data: Vec<u8>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the FMT record describing FMT itself, as firmware does
    pub fn with_bootstrap() -> Self {
        Self::new().fmt(128, "FMT", "BBnNZ", "Type,Length,Name,Format,Columns")
    }

    pub fn fmt(self, code: u8, name: &str, types: &str, columns: &str) -> Self {
        let length = (3 + payload_width(types)) as u8;
        self.fmt_with_length(code, length, name, types, columns)
    }

    pub fn fmt_with_length(mut self, code: u8, length: u8, name: &str, types: &str, columns: &str) -> Self {
        self.data.extend(SYNC);
        self.data.extend([128, code, length]);
        self.data.extend(padded(name, 4));
        self.data.extend(padded(types, 16));
        self.data.extend(padded(columns, 64));
        self
    }

    pub fn frame(mut self, code: u8, payload: &[u8]) -> Self {
        self.data.extend(SYNC);
        self.data.push(code);
        self.data.extend_from_slice(payload);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

pub fn msg_payload(time_us: u64, message: &str) -> Vec<u8> {
    let mut payload = time_us.to_le_bytes().to_vec();
    payload.extend(padded(message, 64));
    payload
}

pub fn mode_payload(time_us: u64, mode: u8, reason: u8) -> Vec<u8> {
    let mut payload = time_us.to_le_bytes().to_vec();
    payload.extend([mode, mode, reason]);
    payload
}

pub fn gps_payload(time_us: u64, status: u8, gms: u32, gwk: u16, lat: i32, lng: i32, alt_cm: i32) -> Vec<u8> {
    let mut payload = time_us.to_le_bytes().to_vec();
    payload.push(status);
    payload.extend(gms.to_le_bytes());
    payload.extend(gwk.to_le_bytes());
    payload.extend(lat.to_le_bytes());
    payload.extend(lng.to_le_bytes());
    payload.extend(alt_cm.to_le_bytes());
    payload
}

pub fn parm_payload(time_us: u64, name: &str, value: f32) -> Vec<u8> {
    let mut payload = time_us.to_le_bytes().to_vec();
    payload.extend(padded(name, 16));
    payload.extend(value.to_le_bytes());
    payload
}

/// A short Copter flight: firmware banner, mode change, one GPS fix, a parameter
pub fn copter_log() -> Vec<u8> {
    LogBuilder::with_bootstrap()
        .fmt(MSG, "MSG", "QZ", "TimeUS,Message")
        .fmt(MODE, "MODE", "QMBB", "TimeUS,Mode,ModeNum,Rsn")
        .fmt(GPS, "GPS", "QBIHLLe", "TimeUS,Status,GMS,GWk,Lat,Lng,Alt")
        .fmt(PARM, "PARM", "QNf", "TimeUS,Name,Value")
        .frame(MSG, &msg_payload(100, "ArduCopter V4.5.1 (b2ad5b4b)"))
        .frame(MODE, &mode_payload(200, 5, 1))
        .frame(GPS, &gps_payload(300, 3, 86_400_500, 2190, -353_632_610, 1_491_652_440, 58_410))
        .frame(PARM, &parm_payload(400, "ANGLE_MAX", 4500.0))
        .build()
}
