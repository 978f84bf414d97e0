//! Broadcast control messages.
//!
//! The simulator accepts a small set of control messages (camera moves, pit
//! stop changes, replay transport, chat macros). Each message is a code plus
//! up to three integer arguments; the enums here pin the codes so callers
//! never pass raw magic numbers. Delivery is the provider's job, via
//! [`crate::Provider::send_command`].

use serde::{Deserialize, Serialize};

/// Top-level broadcast message code.
///
/// Discriminants match the simulator's wire protocol and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum BroadcastCode {
    /// Switch camera to a field position (leader, exciting, driver ahead).
    CamSwitchPos = 0,
    /// Switch camera to a car by its padded number.
    CamSwitchNum = 1,
    /// Set the camera tool state bits.
    CamSetState = 2,
    ReplaySetPlaySpeed = 3,
    ReplaySetPlayPosition = 4,
    ReplaySearch = 5,
    ReplaySetState = 6,
    ReloadTextures = 7,
    ChatCommand = 8,
    PitCommand = 9,
    /// Start, stop or restart disk telemetry recording.
    TelemCommand = 10,
    FfbCommand = 11,
    ReplaySearchSessionTime = 12,
    VideoCapture = 13,
}

impl BroadcastCode {
    /// Wire code for this message.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Pit stop service changes for the next stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum PitCommandMode {
    /// Clear all pit checkboxes.
    Clear = 0,
    /// Clean the winshield, using one tear off.
    CleanWindshield = 1,
    /// Add fuel, optionally specifying the amount in liters.
    Fuel = 2,
    /// Change the left front tire, optionally specifying pressure in kPa.
    ChangeLeftFront = 3,
    ChangeRightFront = 4,
    ChangeLeftRear = 5,
    ChangeRightRear = 6,
    /// Clear tire pit checkboxes.
    ClearTires = 7,
    /// Request a fast repair.
    FastRepair = 8,
    /// Uncheck the clean windshield checkbox.
    ClearWindshield = 9,
    /// Uncheck the fast repair checkbox.
    ClearFastRepair = 10,
    /// Uncheck the add fuel checkbox.
    ClearFuel = 11,
    /// Change tire compound.
    TireCompound = 12,
}

/// Disk telemetry recording control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum TelemCommandMode {
    /// Turn telemetry recording off.
    Stop = 0,
    /// Turn telemetry recording on.
    Start = 1,
    /// Write the current file to disk and start a new one.
    Restart = 2,
}

/// Chat window control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ChatCommandMode {
    /// Fire a chat macro, 0 through 14.
    Macro = 0,
    /// Open up a new chat window.
    BeginChat = 1,
    /// Reply to last private chat.
    Reply = 2,
    /// Close the chat window.
    Cancel = 3,
}

/// Replay seek targets for [`BroadcastCode::ReplaySearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ReplaySearchMode {
    ToStart = 0,
    ToEnd = 1,
    PreviousSession = 2,
    NextSession = 3,
    PreviousLap = 4,
    NextLap = 5,
    PreviousFrame = 6,
    NextFrame = 7,
    PreviousIncident = 8,
    NextIncident = 9,
}

/// Anchor for a replay frame position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ReplayPositionMode {
    /// Frame number counts forward from the start of the tape.
    Begin = 0,
    /// Frame number is relative to the current position.
    Current = 1,
    /// Frame number counts backward from the live end of the tape.
    End = 2,
}

/// Replay tape state control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ReplayStateMode {
    /// Clear any data in the replay tape.
    EraseTape = 0,
}

/// Texture reload scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ReloadTexturesMode {
    /// Reload textures on all cars.
    All = 0,
    /// Reload textures on one car, by car index.
    CarIndex = 1,
}

/// Force-feedback control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum FfbCommandMode {
    /// Set the maximum force in Nm when mapping steering torque to the wheel.
    MaxForce = 0,
}

/// Video capture control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum VideoCaptureMode {
    TriggerScreenshot = 0,
    StartVideoCapture = 1,
    EndVideoCapture = 2,
    ToggleVideoCapture = 3,
    ShowVideoTimer = 4,
    HideVideoTimer = 5,
}

/// Focus target for [`BroadcastCode::CamSwitchPos`].
///
/// Special targets sit below zero on the wire; non-negative values select a
/// car by its running position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraFocus {
    /// The most recent incident.
    Incident,
    /// The race leader.
    Leader,
    /// The car currently exiting the pits.
    Exiting,
    /// A car by its running position (the leader is position 1).
    Driver(i32),
}

impl CameraFocus {
    /// Wire code for this focus target.
    pub const fn code(self) -> i32 {
        match self {
            CameraFocus::Incident => -3,
            CameraFocus::Leader => -2,
            CameraFocus::Exiting => -1,
            CameraFocus::Driver(position) => position,
        }
    }
}

/// Camera tool state bits for [`BroadcastCode::CamSetState`].
///
/// These are flags, not an enum: combine them with `|` on the raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraState(pub i32);

impl CameraState {
    pub const IS_SESSION_SCREEN: CameraState = CameraState(0x0001);
    pub const IS_SCENIC_ACTIVE: CameraState = CameraState(0x0002);
    pub const CAM_TOOL_ACTIVE: CameraState = CameraState(0x0004);
    pub const UI_HIDDEN: CameraState = CameraState(0x0008);
    pub const USE_AUTO_SHOT_SELECTION: CameraState = CameraState(0x0010);
    pub const USE_TEMPORARY_EDITS: CameraState = CameraState(0x0020);
    pub const USE_KEY_ACCELERATION: CameraState = CameraState(0x0040);
    pub const USE_KEY10X_ACCELERATION: CameraState = CameraState(0x0080);
    pub const USE_MOUSE_AIM_MODE: CameraState = CameraState(0x0100);

    pub const fn bits(self) -> i32 {
        self.0
    }

    pub const fn contains(self, other: CameraState) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CameraState {
    type Output = CameraState;

    fn bitor(self, rhs: CameraState) -> CameraState {
        CameraState(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_codes_match_the_wire_protocol() {
        assert_eq!(BroadcastCode::CamSwitchPos.code(), 0);
        assert_eq!(BroadcastCode::CamSwitchNum.code(), 1);
        assert_eq!(BroadcastCode::PitCommand.code(), 9);
        assert_eq!(BroadcastCode::VideoCapture.code(), 13);
    }

    #[test]
    fn pit_command_modes_cover_the_full_service_menu() {
        assert_eq!(PitCommandMode::Clear as i32, 0);
        assert_eq!(PitCommandMode::FastRepair as i32, 8);
        assert_eq!(PitCommandMode::TireCompound as i32, 12);
    }

    #[test]
    fn camera_focus_codes_match_the_wire_protocol() {
        assert_eq!(CameraFocus::Incident.code(), -3);
        assert_eq!(CameraFocus::Leader.code(), -2);
        assert_eq!(CameraFocus::Exiting.code(), -1);
        assert_eq!(CameraFocus::Driver(1).code(), 1);
        assert_eq!(CameraFocus::Driver(12).code(), 12);
    }

    #[test]
    fn camera_state_bits_combine() {
        let state = CameraState::CAM_TOOL_ACTIVE | CameraState::UI_HIDDEN;
        assert_eq!(state.bits(), 0x000C);
        assert!(state.contains(CameraState::UI_HIDDEN));
        assert!(!state.contains(CameraState::IS_SCENIC_ACTIVE));
    }
}
