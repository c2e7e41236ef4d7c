//! Vehicle build detection and flight-mode tables
//!
//! The `M` field type decodes a numeric flight mode into a name, and the
//! name table depends on which vehicle firmware wrote the log. The family is
//! learned once per session, normally from the firmware banner that the
//! autopilot writes into `MSG` and `VER` records at boot.

use regex::Regex;
use semver::Version;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Vehicle firmware family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum VehicleType {
    Copter,
    Plane,
    Rover,
    Sub,
    Tracker,
}

const COPTER_MODES: &[(u8, &str)] = &[
    (0, "STABILIZE"),
    (1, "ACRO"),
    (2, "ALT_HOLD"),
    (3, "AUTO"),
    (4, "GUIDED"),
    (5, "LOITER"),
    (6, "RTL"),
    (7, "CIRCLE"),
    (9, "LAND"),
    (11, "DRIFT"),
    (13, "SPORT"),
    (14, "FLIP"),
    (15, "AUTOTUNE"),
    (16, "POSHOLD"),
    (17, "BRAKE"),
    (18, "THROW"),
    (19, "AVOID_ADSB"),
    (20, "GUIDED_NOGPS"),
    (21, "SMART_RTL"),
    (22, "FLOWHOLD"),
    (23, "FOLLOW"),
    (24, "ZIGZAG"),
    (25, "SYSTEMID"),
    (26, "AUTOROTATE"),
    (27, "AUTO_RTL"),
];

const PLANE_MODES: &[(u8, &str)] = &[
    (0, "MANUAL"),
    (1, "CIRCLE"),
    (2, "STABILIZE"),
    (3, "TRAINING"),
    (4, "ACRO"),
    (5, "FBWA"),
    (6, "FBWB"),
    (7, "CRUISE"),
    (8, "AUTOTUNE"),
    (10, "AUTO"),
    (11, "RTL"),
    (12, "LOITER"),
    (13, "TAKEOFF"),
    (14, "AVOID_ADSB"),
    (15, "GUIDED"),
    (16, "INITIALISING"),
    (17, "QSTABILIZE"),
    (18, "QHOVER"),
    (19, "QLOITER"),
    (20, "QLAND"),
    (21, "QRTL"),
    (22, "QAUTOTUNE"),
    (23, "QACRO"),
    (24, "THERMAL"),
    (25, "LOITER_ALT_QLAND"),
];

const ROVER_MODES: &[(u8, &str)] = &[
    (0, "MANUAL"),
    (1, "ACRO"),
    (3, "STEERING"),
    (4, "HOLD"),
    (5, "LOITER"),
    (6, "FOLLOW"),
    (7, "SIMPLE"),
    (10, "AUTO"),
    (11, "RTL"),
    (12, "SMART_RTL"),
    (15, "GUIDED"),
    (16, "INITIALISING"),
];

const SUB_MODES: &[(u8, &str)] = &[
    (0, "STABILIZE"),
    (1, "ACRO"),
    (2, "ALT_HOLD"),
    (3, "AUTO"),
    (4, "GUIDED"),
    (7, "CIRCLE"),
    (9, "SURFACE"),
    (16, "POSHOLD"),
    (19, "MANUAL"),
];

const TRACKER_MODES: &[(u8, &str)] = &[
    (0, "MANUAL"),
    (1, "STOP"),
    (2, "SCAN"),
    (3, "SERVO_TEST"),
    (10, "AUTO"),
    (16, "INITIALISING"),
];

impl VehicleType {
    pub fn mode_table(self) -> &'static [(u8, &'static str)] {
        match self {
            VehicleType::Copter => COPTER_MODES,
            VehicleType::Plane => PLANE_MODES,
            VehicleType::Rover => ROVER_MODES,
            VehicleType::Sub => SUB_MODES,
            VehicleType::Tracker => TRACKER_MODES,
        }
    }

    pub fn mode_name(self, mode: u8) -> Option<&'static str> {
        self.mode_table()
            .iter()
            .find(|(number, _)| *number == mode)
            .map(|(_, name)| *name)
    }

    pub fn mode_number(self, name: &str) -> Option<u8> {
        self.mode_table()
            .iter()
            .find(|(_, mode_name)| mode_name.eq_ignore_ascii_case(name))
            .map(|(number, _)| *number)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleType::Copter => "ArduCopter",
            VehicleType::Plane => "ArduPlane",
            VehicleType::Rover => "ArduRover",
            VehicleType::Sub => "ArduSub",
            VehicleType::Tracker => "AntennaTracker",
        };
        f.write_str(name)
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copter" | "arducopter" | "heli" => Ok(VehicleType::Copter),
            "plane" | "arduplane" => Ok(VehicleType::Plane),
            "rover" | "ardurover" | "apmrover2" => Ok(VehicleType::Rover),
            "sub" | "ardusub" => Ok(VehicleType::Sub),
            "tracker" | "antennatracker" => Ok(VehicleType::Tracker),
            other => Err(format!("unknown vehicle type: {}", other)),
        }
    }
}

/// Format a mode number, falling back to `mode<N>` when no table applies
pub fn format_mode(vehicle: Option<VehicleType>, mode: u8) -> String {
    vehicle
        .and_then(|v| v.mode_name(mode))
        .map(str::to_string)
        .unwrap_or_else(|| format!("mode{}", mode))
}

/// Firmware identity extracted from a build banner
#[derive(Debug, Clone, PartialEq)]
pub struct BuildInfo {
    pub vehicle: VehicleType,
    pub version: Option<Version>,
}

fn banner_regex() -> Option<&'static Regex> {
    static BANNER: OnceLock<Option<Regex>> = OnceLock::new();
    BANNER
        .get_or_init(|| {
            Regex::new(
                r"^\s*(ArduCopter|ArduPlane|ArduRover|APMrover2|ArduSub|AntennaTracker)\b(?:\s+V?(\d+\.\d+\.\d+))?",
            )
            .ok()
        })
        .as_ref()
}

/// Recognise a firmware banner such as `ArduCopter V4.5.1 (b2ad5b4b)`
pub fn detect_build(message: &str) -> Option<BuildInfo> {
    let captures = banner_regex()?.captures(message)?;
    let vehicle = captures.get(1)?.as_str().parse().ok()?;
    let version = captures
        .get(2)
        .and_then(|m| Version::parse(m.as_str()).ok());
    Some(BuildInfo { vehicle, version })
}

/// Session-scoped vehicle build state
#[derive(Debug, Clone, Default)]
pub struct VehicleSession {
    vehicle: Option<VehicleType>,
    firmware_version: Option<Version>,
}

impl VehicleSession {
    pub fn vehicle(&self) -> Option<VehicleType> {
        self.vehicle
    }

    pub fn firmware_version(&self) -> Option<&Version> {
        self.firmware_version.as_ref()
    }

    /// Record the vehicle family. The first notification wins.
    pub fn notify(&mut self, vehicle: VehicleType, version: Option<Version>) -> bool {
        if self.vehicle.is_some() {
            return false;
        }
        self.vehicle = Some(vehicle);
        self.firmware_version = version;
        true
    }

    /// Inspect a text message for a firmware banner
    pub fn observe_message(&mut self, message: &str) -> bool {
        if self.vehicle.is_some() {
            return false;
        }
        match detect_build(message) {
            Some(build) => self.notify(build.vehicle, build.version),
            None => false,
        }
    }
}
