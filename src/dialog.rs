use bitflags::bitflags;

/// Kind of native modal dialog. Discriminants are part of the C ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum DialogKind {
    Open = 0,
    Save = 1,
    Alert = 2,
}

impl DialogKind {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(DialogKind::Open),
            1 => Some(DialogKind::Save),
            2 => Some(DialogKind::Alert),
            _ => None,
        }
    }
}

bitflags! {
    /// Dialog behavior flags. The low bit selects file vs. directory for
    /// open dialogs; the next two bits are a severity field for alerts.
    pub struct DialogFlags: u32 {
        const DIRECTORY  = 1 << 0;
        const INFO       = 1 << 1;
        const WARNING    = 2 << 1;
        const ERROR      = 3 << 1;
        const ALERT_MASK = 3 << 1;
    }
}

/// Alert severity decoded from the two-bit field in [`DialogFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    None,
    Info,
    Warning,
    Error,
}

impl DialogFlags {
    /// Directory picker rather than file picker.
    pub fn wants_directory(self) -> bool {
        self.contains(DialogFlags::DIRECTORY)
    }

    pub fn severity(self) -> AlertSeverity {
        match (self & DialogFlags::ALERT_MASK).bits() >> 1 {
            1 => AlertSeverity::Info,
            2 => AlertSeverity::Warning,
            3 => AlertSeverity::Error,
            _ => AlertSeverity::None,
        }
    }
}

/// One dialog invocation handed to the backend. `arg` is the default path
/// for file dialogs and the message body for alerts.
#[derive(Debug, Clone)]
pub struct DialogRequest {
    pub kind: DialogKind,
    pub flags: DialogFlags,
    pub title: String,
    pub arg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_discriminants_are_stable() {
        assert_eq!(DialogKind::Open as i32, 0);
        assert_eq!(DialogKind::Save as i32, 1);
        assert_eq!(DialogKind::Alert as i32, 2);
        assert_eq!(DialogKind::from_raw(1), Some(DialogKind::Save));
        assert_eq!(DialogKind::from_raw(3), None);
    }

    #[test]
    fn flag_bit_layout() {
        assert_eq!(DialogFlags::DIRECTORY.bits(), 0b001);
        assert_eq!(DialogFlags::INFO.bits(), 0b010);
        assert_eq!(DialogFlags::WARNING.bits(), 0b100);
        assert_eq!(DialogFlags::ERROR.bits(), 0b110);
        assert_eq!(DialogFlags::ALERT_MASK.bits(), 0b110);
    }

    #[test]
    fn severity_decodes_the_two_bit_field() {
        assert_eq!(DialogFlags::empty().severity(), AlertSeverity::None);
        assert_eq!(DialogFlags::INFO.severity(), AlertSeverity::Info);
        assert_eq!(DialogFlags::WARNING.severity(), AlertSeverity::Warning);
        assert_eq!(DialogFlags::ERROR.severity(), AlertSeverity::Error);
        // Directory bit does not disturb the severity field
        let mixed = DialogFlags::DIRECTORY | DialogFlags::WARNING;
        assert_eq!(mixed.severity(), AlertSeverity::Warning);
        assert!(mixed.wants_directory());
    }
}
