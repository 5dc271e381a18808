//! PXE-specific domain models.

use std::fmt;

use uuid::Uuid;

/// Length of option 97 when it carries a machine UUID: one type byte
/// followed by sixteen UUID bytes.
pub const CLIENT_UUID_OPTION_LEN: usize = 17;

/// PXE client system architecture types as defined in RFC 4578.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PxeClientArch {
    IntelX86Bios,
    NecPc98,
    Efi386,
    EfiBC,
    EfiX64,
    EfiArm32,
    EfiArm64,
    Unknown(u16),
}

impl PxeClientArch {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::IntelX86Bios,
            1 => Self::NecPc98,
            2 => Self::Efi386,
            6 => Self::EfiBC,
            7 => Self::EfiX64,
            9 => Self::EfiArm32,
            11 => Self::EfiArm64,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for PxeClientArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntelX86Bios => write!(f, "x86 BIOS"),
            Self::NecPc98 => write!(f, "NEC/PC98"),
            Self::Efi386 => write!(f, "EFI x86"),
            Self::EfiBC => write!(f, "EFI BC"),
            Self::EfiX64 => write!(f, "EFI x64"),
            Self::EfiArm32 => write!(f, "EFI ARM32"),
            Self::EfiArm64 => write!(f, "EFI ARM64"),
            Self::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// Extract the machine UUID from an option 97 value.
///
/// Only a 17-byte value counts; anything else means the request did not come
/// from PXE firmware.
pub fn uuid_from_option(value: &[u8]) -> Option<Uuid> {
    if value.len() != CLIENT_UUID_OPTION_LEN {
        return None;
    }
    Uuid::from_slice(&value[1..]).ok()
}

/// Uppercase hyphenated form used in logs and access lists.
pub fn format_uuid(uuid: &Uuid) -> String {
    uuid.hyphenated().to_string().to_uppercase()
}

/// Class identifier truncated at its first colon.
///
/// `PXEClient:Arch:00000:UNDI:002001` becomes `PXEClient`. A value without a
/// colon is returned whole.
pub fn truncate_class_id(class_id: &[u8]) -> &[u8] {
    match class_id.iter().position(|&b| b == b':') {
        Some(end) => &class_id[..end],
        None => class_id,
    }
}
