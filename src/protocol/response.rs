//! Response definitions
//!
//! Represents responses to clients.

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    OkIns = 0x01,
    OkUpd = 0x02,
    ErrLogin = 0x10,
    ErrUserExists = 0x11,
    ErrNoData = 0x12,
    ErrKey = 0x13,
    ErrFunc = 0x14,
    ErrQuotaUp = 0x20,
    ErrQuotaDown = 0x21,
    ErrQuotaReq = 0x22,
    ErrServer = 0x30,
}

impl Status {
    /// The protocol code string for this status
    pub fn code(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::OkIns => "OKINS",
            Status::OkUpd => "OKUPD",
            Status::ErrLogin => "ERR_LOGIN",
            Status::ErrUserExists => "ERR_USER_EXISTS",
            Status::ErrNoData => "ERR_NO_DATA",
            Status::ErrKey => "ERR_KEY",
            Status::ErrFunc => "ERR_FUNC",
            Status::ErrQuotaUp => "ERR_QUOTA_UP",
            Status::ErrQuotaDown => "ERR_QUOTA_DOWN",
            Status::ErrQuotaReq => "ERR_QUOTA_REQ",
            Status::ErrServer => "ERR_SERVER",
        }
    }

    /// Parse a status byte read from the wire
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::OkIns),
            0x02 => Some(Status::OkUpd),
            0x10 => Some(Status::ErrLogin),
            0x11 => Some(Status::ErrUserExists),
            0x12 => Some(Status::ErrNoData),
            0x13 => Some(Status::ErrKey),
            0x14 => Some(Status::ErrFunc),
            0x20 => Some(Status::ErrQuotaUp),
            0x21 => Some(Status::ErrQuotaDown),
            0x22 => Some(Status::ErrQuotaReq),
            0x30 => Some(Status::ErrServer),
            _ => None,
        }
    }

    /// True for the success statuses (OK, OKINS, OKUPD)
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok | Status::OkIns | Status::OkUpd)
    }
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (fetched bytes, or a newline-joined list)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with no payload
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            payload: None,
        }
    }

    /// Create an OK response carrying a payload
    pub fn ok_with(payload: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            payload: Some(payload),
        }
    }

    /// Create a payload-free response with the given status
    pub fn status(status: Status) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    /// True for the success statuses
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}
